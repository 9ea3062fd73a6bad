//! # dtsmod core
//!
//! Relocates TypeScript declaration trees under a per-package namespace.
//!
//! The crate is pure: it never touches the filesystem. A driver feeds it the
//! text of each `.d.ts` file together with the file's position inside its
//! package, and gets back the rewritten text plus the manifest entry that
//! describes how to lazily load it.
//!
//! Pipeline per file:
//! 1. derive the [`NamespacedPath`] from namespace, relative path and root file
//! 2. rewrite relative module references with [`resolve`]
//! 3. wrap the body in a `declare module` block ([`wrap`])
//! 4. report a [`ManifestEntry`]

mod error;
mod path;
mod resolver;
mod rewrite;
mod unit;
mod manifest;

// Re-export public API
pub use error::PathError;
pub use path::{NamespacedPath, DECLARATION_SUFFIX};
pub use resolver::{is_relative, resolve};
pub use rewrite::{wrap, PatternRewriter, StatementRewriter};
pub use unit::DeclarationUnit;
pub use manifest::{Manifest, ManifestEntry};
