//! Build pipeline: clean the destination, relocate every package, write the manifest.
//!
//! Packages and the files inside them are processed concurrently. Output
//! order is still deterministic: packages keep configuration order and files
//! keep the sorted traversal order.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dtsmod_core::{DeclarationUnit, Manifest, ManifestEntry, PatternRewriter, StatementRewriter};
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{BuildConfig, PackageSpec};
use crate::error::DriverError;
use crate::walk::collect_declarations;

/// Summary of a completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub packages: usize,
    pub files: usize,
    pub manifest_path: PathBuf,
}

pub struct Builder {
    config: BuildConfig,
    rewriter: Arc<dyn StatementRewriter>,
}

impl Builder {
    pub fn new(config: BuildConfig) -> Self {
        Self::with_rewriter(config, PatternRewriter::new())
    }

    pub fn with_rewriter(config: BuildConfig, rewriter: impl StatementRewriter + 'static) -> Self {
        Self {
            config,
            rewriter: Arc::new(rewriter),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Regenerate the destination tree and manifest from scratch.
    ///
    /// The first I/O failure aborts the run; output already written stays.
    pub async fn run(&self) -> Result<BuildReport, DriverError> {
        let destination = &self.config.destination;
        clean_destination(destination).await?;

        let mut tasks = JoinSet::new();
        for (index, package) in self.config.packages.iter().cloned().enumerate() {
            let destination = destination.clone();
            let rewriter = Arc::clone(&self.rewriter);
            tasks.spawn(async move {
                build_package(package, destination, rewriter)
                    .await
                    .map(|entries| (index, entries))
            });
        }

        let mut per_package = Vec::with_capacity(self.config.packages.len());
        while let Some(joined) = tasks.join_next().await {
            per_package.push(joined??);
        }
        per_package.sort_by_key(|(index, _)| *index);

        let manifest = assemble_manifest(per_package.into_iter().flat_map(|(_, entries)| entries))?;

        let manifest_path = self.config.manifest_path();
        write_file(&manifest_path, &manifest.render()).await?;
        info!(
            entries = manifest.len(),
            path = %manifest_path.display(),
            "wrote manifest"
        );

        Ok(BuildReport {
            packages: self.config.packages.len(),
            files: manifest.len(),
            manifest_path,
        })
    }
}

/// Remove a previous output tree. A missing destination is fine.
async fn clean_destination(destination: &Path) -> Result<(), DriverError> {
    match fs::remove_dir_all(destination).await {
        Ok(()) => {
            debug!(path = %destination.display(), "cleared destination");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DriverError::io(destination, e)),
    }
}

/// Relocate one package, returning its manifest entries in traversal order.
async fn build_package(
    package: PackageSpec,
    destination: PathBuf,
    rewriter: Arc<dyn StatementRewriter>,
) -> Result<Vec<ManifestEntry>, DriverError> {
    let files = collect_declarations(&package.source).await?;
    let package = Arc::new(package);

    let mut tasks = JoinSet::new();
    for (index, file) in files.into_iter().enumerate() {
        let package = Arc::clone(&package);
        let destination = destination.clone();
        let rewriter = Arc::clone(&rewriter);
        tasks.spawn(async move {
            relocate_file(&package, &file, &destination, rewriter.as_ref())
                .await
                .map(|unit| (index, unit))
        });
    }

    let mut relocated = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        relocated.push(joined??);
    }
    relocated.sort_by_key(|(index, _)| *index);

    if !relocated.iter().any(|(_, (_, is_root))| *is_root) {
        warn!(
            package = %package.name,
            root = %package.root,
            "root declaration file not found; no module is declared under the bare namespace"
        );
    }

    info!(package = %package.name, files = relocated.len(), "relocated declarations");
    Ok(relocated.into_iter().map(|(_, (entry, _))| entry).collect())
}

/// Rewrite a single declaration file into the destination tree.
///
/// Returns its manifest entry and whether it is the package's root file.
async fn relocate_file(
    package: &PackageSpec,
    file: &Path,
    destination: &Path,
    rewriter: &dyn StatementRewriter,
) -> Result<(ManifestEntry, bool), DriverError> {
    let relative = file.strip_prefix(&package.source).unwrap_or(file);
    let relative_str = relative.to_string_lossy();

    let source = fs::read_to_string(file)
        .await
        .map_err(|e| DriverError::io(file, e))?;
    let unit = DeclarationUnit::rewrite(&package.name, &relative_str, &package.root, &source, rewriter)?;

    let target = destination.join(&package.name).join(relative);
    write_file(&target, unit.text()).await?;
    debug!(module = unit.path().module(), target = %target.display(), "wrote declaration");

    Ok((unit.manifest_entry(), unit.path().is_root()))
}

async fn write_file(path: &Path, contents: &str) -> Result<(), DriverError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DriverError::io(parent, e))?;
    }
    fs::write(path, contents)
        .await
        .map_err(|e| DriverError::io(path, e))
}

/// Collect entries into a manifest, rejecting duplicate keys.
fn assemble_manifest(entries: impl IntoIterator<Item = ManifestEntry>) -> Result<Manifest, DriverError> {
    let mut seen = HashSet::new();
    let mut manifest = Manifest::new();

    for entry in entries {
        if !seen.insert(entry.key().to_string()) {
            return Err(DriverError::DuplicateManifestKey {
                key: entry.key().to_string(),
            });
        }
        manifest.push(entry);
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    fn write(path: &Path, contents: &str) {
        std_fs::create_dir_all(path.parent().unwrap()).unwrap();
        std_fs::write(path, contents).unwrap();
    }

    fn package(name: &str, source: PathBuf, root: &str) -> PackageSpec {
        PackageSpec {
            name: name.to_string(),
            source,
            root: root.to_string(),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_package() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("foo");
        write(&source.join("index.d.ts"), "export * from './bar';\n");
        write(&source.join("bar.d.ts"), "import { Baz } from './sub/baz';\nexport declare const bar: Baz;\n");
        write(&source.join("sub/baz.d.ts"), "export type Baz = number;\n");

        let destination = temp.path().join("out");
        let config = BuildConfig {
            destination: destination.clone(),
            manifest: "dts-list.ts".to_string(),
            packages: vec![package("foo", source, "index.d.ts")],
        };

        let report = Builder::new(config).run().await.unwrap();
        assert_eq!(report.packages, 1);
        assert_eq!(report.files, 3);

        let root = std_fs::read_to_string(destination.join("foo/index.d.ts")).unwrap();
        assert_eq!(root, "declare module 'foo' {\nexport * from 'foo/bar';\n\n}");

        let bar = std_fs::read_to_string(destination.join("foo/bar.d.ts")).unwrap();
        assert!(bar.starts_with("declare module 'foo/bar' {\n"));
        assert!(bar.contains("import { Baz } from 'foo/sub/baz';"));

        let manifest = std_fs::read_to_string(&report.manifest_path).unwrap();
        assert_eq!(
            manifest,
            "export default new Map( [\n\
             \x20 [ 'foo/bar.d.ts', import( './foo/bar.d.ts?raw' ) ],\n\
             \x20 [ 'foo/index.d.ts', import( './foo/index.d.ts?raw' ) ],\n\
             \x20 [ 'foo/sub/baz.d.ts', import( './foo/sub/baz.d.ts?raw' ) ],\n\
             ] );\n"
        );
    }

    #[tokio::test]
    async fn test_packages_keep_config_order() {
        let temp = tempfile::tempdir().unwrap();
        write(&temp.path().join("zeta/index.d.ts"), "export {};\n");
        write(&temp.path().join("@scope/alpha/index.d.ts"), "export {};\n");

        let config = BuildConfig {
            destination: temp.path().join("out"),
            manifest: "dts-list.ts".to_string(),
            packages: vec![
                package("zeta", temp.path().join("zeta"), "index.d.ts"),
                package("@scope/alpha", temp.path().join("@scope/alpha"), "index.d.ts"),
            ],
        };

        let report = Builder::new(config).run().await.unwrap();
        let manifest = std_fs::read_to_string(&report.manifest_path).unwrap();
        let zeta = manifest.find("'zeta/index.d.ts'").unwrap();
        let alpha = manifest.find("'@scope/alpha/index.d.ts'").unwrap();
        assert!(zeta < alpha);

        let alpha_text = std_fs::read_to_string(temp.path().join("out/@scope/alpha/index.d.ts")).unwrap();
        assert!(alpha_text.starts_with("declare module '@scope/alpha' {"));
    }

    #[tokio::test]
    async fn test_stale_output_is_removed() {
        let temp = tempfile::tempdir().unwrap();
        write(&temp.path().join("foo/index.d.ts"), "export {};\n");
        let destination = temp.path().join("out");
        write(&destination.join("stale/old.d.ts"), "old");

        let config = BuildConfig {
            destination: destination.clone(),
            manifest: "dts-list.ts".to_string(),
            packages: vec![package("foo", temp.path().join("foo"), "index.d.ts")],
        };
        Builder::new(config).run().await.unwrap();

        assert!(!destination.join("stale").exists());
        assert!(destination.join("foo/index.d.ts").exists());
    }

    #[tokio::test]
    async fn test_missing_source_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            destination: temp.path().join("out"),
            manifest: "dts-list.ts".to_string(),
            packages: vec![package("foo", temp.path().join("missing"), "index.d.ts")],
        };

        let result = Builder::new(config).run().await;
        assert!(matches!(result, Err(DriverError::Io { .. })));
        assert!(!temp.path().join("out/dts-list.ts").exists());
    }

    #[tokio::test]
    async fn test_custom_rewriter() {
        struct Passthrough;

        impl StatementRewriter for Passthrough {
            fn rewrite_references(&self, text: &str, _current_file: &str) -> String {
                text.to_string()
            }
        }

        let temp = tempfile::tempdir().unwrap();
        write(&temp.path().join("foo/a.d.ts"), "export * from './b';");
        let config = BuildConfig {
            destination: temp.path().join("out"),
            manifest: "dts-list.ts".to_string(),
            packages: vec![package("foo", temp.path().join("foo"), "index.d.ts")],
        };

        Builder::with_rewriter(config, Passthrough).run().await.unwrap();
        let text = std_fs::read_to_string(temp.path().join("out/foo/a.d.ts")).unwrap();
        assert_eq!(text, "declare module 'foo/a' {\nexport * from './b';\n}");
    }

    #[test]
    fn test_duplicate_manifest_keys_rejected() {
        let result = assemble_manifest([
            ManifestEntry::new("foo", "index.d.ts"),
            ManifestEntry::new("foo", "index.d.ts"),
        ]);
        assert!(matches!(
            result,
            Err(DriverError::DuplicateManifestKey { key }) if key == "foo/index.d.ts"
        ));
    }
}
