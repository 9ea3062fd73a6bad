//! Generated index of relocated declaration files
//!
//! The manifest maps each original file (`<namespace>/<relative path>`) to a
//! deferred raw-text import of its rewritten copy. Entries keep insertion
//! order; key uniqueness is left to whoever assembles the manifest.

use std::fmt::Write;

/// Query suffix asking the bundler for the file's raw text.
const RAW_QUALIFIER: &str = "?raw";

/// One `key -> lazy loader` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestEntry {
    key: String,
    loader: String,
}

impl ManifestEntry {
    pub fn new(namespace: &str, relative_path: &str) -> Self {
        let key = format!("{}/{}", namespace, relative_path.replace('\\', "/"));
        let loader = format!("./{}{}", key, RAW_QUALIFIER);
        Self { key, loader }
    }

    /// `<namespace>/<relative path with .d.ts>`
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Module specifier of the deferred import, relative to the manifest file.
    pub fn loader(&self) -> &str {
        &self.loader
    }

    /// The loader as a dynamic import expression.
    pub fn loader_expression(&self) -> String {
        format!("import( '{}' )", self.loader)
    }
}

/// Ordered list of manifest entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    /// Render the manifest as a module default-exporting a `Map`.
    pub fn render(&self) -> String {
        let mut out = String::from("export default new Map( [\n");
        for entry in &self.entries {
            // Writing into a String cannot fail.
            let _ = writeln!(out, "  [ '{}', {} ],", entry.key, entry.loader_expression());
        }
        out.push_str("] );\n");
        out
    }
}

impl Extend<ManifestEntry> for Manifest {
    fn extend<I: IntoIterator<Item = ManifestEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl FromIterator<ManifestEntry> for Manifest {
    fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
