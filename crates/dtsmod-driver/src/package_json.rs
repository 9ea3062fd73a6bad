//! package.json reading
//!
//! Only the fields needed to locate a package's root declaration file are
//! read; everything else in the manifest is ignored.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub main: Option<String>,
    pub types: Option<String>,
    /// Older alias of `types`.
    pub typings: Option<String>,
}

impl PackageJson {
    /// Declared entry declaration file: `types` first, then `typings`.
    pub fn declared_types(&self) -> Option<&str> {
        self.types.as_deref().or(self.typings.as_deref())
    }
}

/// Parse a package.json file
pub fn parse_package_json(path: &Path) -> Result<PackageJson, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::PackageJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Find the nearest directory at or above `start` holding a package.json.
pub fn find_package_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("package.json").is_file())
        .map(Path::to_path_buf)
}

/// Root declaration file of the package owning `source`, relative to `source`.
///
/// Returns `None` when no package.json is found, it declares no types, or the
/// declared file does not live under `source`.
pub fn declared_root(source: &Path) -> Result<Option<String>, ConfigError> {
    let Some(package_dir) = find_package_root(source) else {
        return Ok(None);
    };

    let pkg = parse_package_json(&package_dir.join("package.json"))?;
    let Some(types) = pkg.declared_types() else {
        return Ok(None);
    };

    let declared = lexical_normalize(&package_dir.join(types));
    let source = lexical_normalize(source);

    Ok(declared.strip_prefix(&source).ok().map(slash_joined))
}

/// Normalize a package-relative file path: backslashes become `/`, `.`
/// segments are dropped and `..` folded, so `./dist/../index.d.ts` reads `index.d.ts`.
pub fn normalize_relative(path: &str) -> String {
    slash_joined(&lexical_normalize(Path::new(&path.replace('\\', "/"))))
}

fn slash_joined(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Drop `.` components and fold `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
