//! Logical identity of a declaration file after relocation

use std::fmt;

use crate::error::PathError;

/// Suffix every declaration file carries.
pub const DECLARATION_SUFFIX: &str = ".d.ts";

/// Where a declaration file lives once relocated under its namespace.
///
/// Two views of the same file are kept:
/// - `file` is `<namespace>/<relative path without .d.ts>`. Relative module
///   references inside the file are resolved against its directory.
/// - `module` is the name declared by the wrapping `declare module` block.
///   The package root file collapses to the bare namespace, and any other
///   path ending in an `index` segment drops that segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedPath {
    namespace: String,
    file: String,
    module: String,
    root: bool,
}

impl NamespacedPath {
    /// Derive the namespaced path of `relative_path` inside the package
    /// `namespace` whose root declaration file is `root_file`.
    ///
    /// Both paths are relative to the package's declaration tree; backslash
    /// separators are accepted and normalized to `/`.
    pub fn new(namespace: &str, relative_path: &str, root_file: &str) -> Result<Self, PathError> {
        if namespace.is_empty() {
            return Err(PathError::EmptyNamespace {
                path: relative_path.to_string(),
            });
        }

        let relative = relative_path.replace('\\', "/");
        let stem = relative
            .strip_suffix(DECLARATION_SUFFIX)
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| PathError::NotADeclaration {
                path: relative_path.to_string(),
            })?;

        let file = format!("{}/{}", namespace, stem);
        let root = relative == root_file.replace('\\', "/");
        let module = if root {
            namespace.to_string()
        } else {
            file.strip_suffix("/index").unwrap_or(file.as_str()).to_string()
        };

        Ok(Self {
            namespace: namespace.to_string(),
            file,
            module,
            root,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Base path for resolving relative references found in this file.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Name of the ambient module this file declares.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// True when the file is the package's root declaration file.
    ///
    /// A top-level `index.d.ts` that is not the root also declares the bare
    /// namespace, but is not the root.
    pub fn is_root(&self) -> bool {
        self.root
    }
}

impl fmt::Display for NamespacedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.module)
    }
}
