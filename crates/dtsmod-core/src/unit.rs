//! A single relocated declaration file

use crate::error::PathError;
use crate::manifest::ManifestEntry;
use crate::path::NamespacedPath;
use crate::rewrite::StatementRewriter;

/// One declaration file after reference rewriting and module wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationUnit {
    relative_path: String,
    path: NamespacedPath,
    text: String,
}

impl DeclarationUnit {
    /// Relocate `source` (the contents of `relative_path` inside the package
    /// `namespace`) using `rewriter`.
    pub fn rewrite<R>(
        namespace: &str,
        relative_path: &str,
        root_file: &str,
        source: &str,
        rewriter: &R,
    ) -> Result<Self, PathError>
    where
        R: StatementRewriter + ?Sized,
    {
        let path = NamespacedPath::new(namespace, relative_path, root_file)?;
        let text = rewriter.rewrite(source, &path);

        Ok(Self {
            relative_path: relative_path.replace('\\', "/"),
            path,
            text,
        })
    }

    /// Path within the package tree, forward slashes, `.d.ts` included.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn path(&self) -> &NamespacedPath {
        &self.path
    }

    /// Rewritten, wrapped text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Manifest entry describing how to lazily load this unit.
    pub fn manifest_entry(&self) -> ManifestEntry {
        ManifestEntry::new(self.path.namespace(), &self.relative_path)
    }
}
