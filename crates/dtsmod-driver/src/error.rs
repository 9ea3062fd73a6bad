//! Error types for configuration and the build pipeline

use std::io;
use std::path::PathBuf;

use dtsmod_core::PathError;

/// Problems with the build configuration or a package's `package.json`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed JSON or a schema mismatch. `contents` is kept for diagnostics.
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        contents: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid package.json {}: {source}", path.display())]
    PackageJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config {} lists no packages", path.display())]
    NoPackages { path: PathBuf },

    #[error("package name must not be empty")]
    EmptyPackageName,

    #[error("package '{name}' is listed more than once")]
    DuplicatePackage { name: String },
}

/// Errors that abort a build run.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Declaration(#[from] PathError),

    #[error("duplicate manifest key '{key}'")]
    DuplicateManifestKey { key: String },

    #[error("build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DriverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
