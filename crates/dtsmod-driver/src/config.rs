//! Build configuration
//!
//! Read from a JSON file (`dtsmod.json` by default). Relative paths inside
//! the file resolve against the file's own directory.
//!
//! ```json
//! {
//!   "destination": "src/types",
//!   "manifest": "dts-list.ts",
//!   "packages": [
//!     { "name": "three", "source": "node_modules/@types/three", "root": "index.d.ts" },
//!     { "name": "lil-gui" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::package_json::{declared_root, normalize_relative};

pub const DEFAULT_CONFIG_FILE: &str = "dtsmod.json";
pub const DEFAULT_MANIFEST: &str = "dts-list.ts";
pub const DEFAULT_ROOT: &str = "index.d.ts";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    destination: PathBuf,
    #[serde(default)]
    manifest: Option<String>,
    packages: Vec<RawPackage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawPackage {
    name: String,
    #[serde(default)]
    source: Option<PathBuf>,
    #[serde(default)]
    root: Option<String>,
}

/// One package to relocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Namespace the package's declarations are relocated under.
    pub name: String,
    /// Root of the package's declaration tree.
    pub source: PathBuf,
    /// Root declaration file, relative to `source`, forward slashes.
    pub root: String,
}

/// Fully resolved build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub destination: PathBuf,
    /// Manifest file name, relative to `destination`.
    pub manifest: String,
    pub packages: Vec<PackageSpec>,
}

impl BuildConfig {
    /// Load and resolve the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents, path)
    }

    /// Parse configuration text that was read from `origin`.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            contents: contents.to_string(),
            source,
        })?;

        if raw.packages.is_empty() {
            return Err(ConfigError::NoPackages {
                path: origin.to_path_buf(),
            });
        }

        let base_dir = origin.parent().unwrap_or_else(|| Path::new(""));
        let mut seen = HashSet::new();
        let mut packages = Vec::with_capacity(raw.packages.len());

        for package in raw.packages {
            if package.name.is_empty() {
                return Err(ConfigError::EmptyPackageName);
            }
            if !seen.insert(package.name.clone()) {
                return Err(ConfigError::DuplicatePackage { name: package.name });
            }
            packages.push(resolve_package(package, base_dir)?);
        }

        Ok(Self {
            destination: base_dir.join(raw.destination),
            manifest: raw.manifest.unwrap_or_else(|| DEFAULT_MANIFEST.to_string()),
            packages,
        })
    }

    pub fn with_destination(mut self, destination: PathBuf) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_manifest(mut self, manifest: String) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.destination.join(&self.manifest)
    }
}

fn resolve_package(package: RawPackage, base_dir: &Path) -> Result<PackageSpec, ConfigError> {
    let source = match package.source {
        Some(source) => base_dir.join(source),
        None => base_dir.join("node_modules").join(&package.name),
    };

    let root = match package.root {
        Some(root) => normalize_relative(&root),
        None => match declared_root(&source)? {
            Some(root) => {
                debug!(package = %package.name, root = %root, "discovered root declaration from package.json");
                root
            }
            None => {
                warn!(package = %package.name, "no declared types found, assuming {}", DEFAULT_ROOT);
                DEFAULT_ROOT.to_string()
            }
        },
    };

    Ok(PackageSpec {
        name: package.name,
        source,
        root,
    })
}
