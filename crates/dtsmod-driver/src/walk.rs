//! Declaration tree traversal

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use dtsmod_core::DECLARATION_SUFFIX;
use tokio::fs;
use tracing::debug;

use crate::error::DriverError;

/// Check whether `path` names a declaration file.
pub fn is_declaration(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(DECLARATION_SUFFIX))
}

/// Recursively list every declaration file under `dir`, sorted.
///
/// Symlinks are followed, but each directory is entered at most once, keyed
/// by its canonical path, so link cycles terminate. A missing or unreadable
/// directory is an error.
pub async fn collect_declarations(dir: &Path) -> Result<Vec<PathBuf>, DriverError> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let canonical = fs::canonicalize(&current)
            .await
            .map_err(|e| DriverError::io(&current, e))?;
        if !visited.insert(canonical) {
            debug!(path = %current.display(), "skipping already visited directory");
            continue;
        }

        let mut entries = fs::read_dir(&current)
            .await
            .map_err(|e| DriverError::io(&current, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DriverError::io(&current, e))?
        {
            let path = entry.path();
            let metadata = fs::metadata(&path)
                .await
                .map_err(|e| DriverError::io(&path, e))?;

            if metadata.is_dir() {
                pending.push(path);
            } else if is_declaration(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    #[test]
    fn test_is_declaration() {
        assert!(is_declaration(Path::new("a/index.d.ts")));
        assert!(!is_declaration(Path::new("a/index.ts")));
        assert!(!is_declaration(Path::new("a/index.d.ts.map")));
    }

    #[tokio::test]
    async fn test_collects_nested_declarations() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        std_fs::create_dir_all(root.join("src/math")).unwrap();
        std_fs::write(root.join("index.d.ts"), "").unwrap();
        std_fs::write(root.join("src/math/Vector3.d.ts"), "").unwrap();
        std_fs::write(root.join("src/math/Vector3.js"), "").unwrap();
        std_fs::write(root.join("package.json"), "{}").unwrap();

        let files = collect_declarations(root).await.unwrap();
        assert_eq!(
            files,
            vec![root.join("index.d.ts"), root.join("src/math/Vector3.d.ts")]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_cycle_terminates() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        std_fs::create_dir_all(root.join("sub")).unwrap();
        std_fs::write(root.join("index.d.ts"), "").unwrap();
        std_fs::write(root.join("sub/a.d.ts"), "").unwrap();
        std::os::unix::fs::symlink(root, root.join("sub/loop")).unwrap();

        let files = collect_declarations(root).await.unwrap();
        assert_eq!(files, vec![root.join("index.d.ts"), root.join("sub/a.d.ts")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_is_followed() {
        let temp = tempfile::tempdir().unwrap();
        let shared = temp.path().join("shared");
        let package = temp.path().join("package");
        std_fs::create_dir_all(&shared).unwrap();
        std_fs::create_dir_all(&package).unwrap();
        std_fs::write(shared.join("common.d.ts"), "").unwrap();
        std::os::unix::fs::symlink(&shared, package.join("common")).unwrap();

        let files = collect_declarations(&package).await.unwrap();
        assert_eq!(files, vec![package.join("common/common.d.ts")]);
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let temp = tempfile::tempdir().unwrap();
        let result = collect_declarations(&temp.path().join("missing")).await;
        assert!(matches!(result, Err(DriverError::Io { .. })));
    }
}
