//! Error types for namespaced path derivation

/// Errors raised while deriving a [`crate::NamespacedPath`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The file does not carry a `.d.ts` suffix, or nothing precedes it.
    #[error("not a declaration file: {path}")]
    NotADeclaration { path: String },

    /// The package namespace is empty.
    #[error("empty namespace for declaration file {path}")]
    EmptyNamespace { path: String },
}
