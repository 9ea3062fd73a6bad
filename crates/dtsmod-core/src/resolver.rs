//! Module reference resolution for relocated declaration files

/// Check whether a module reference is relative to the file it appears in.
///
/// Anything starting with `.` counts (`./foo`, `../bar`). Package-style names
/// such as `three` or `@pixiv/types-vrm-0.0` are absolute.
pub fn is_relative(reference: &str) -> bool {
    reference.starts_with('.')
}

/// Resolve `reference` as seen from the file whose namespaced path is `current`.
///
/// Absolute references are returned unchanged. Relative ones are joined onto
/// the directory of `current` with POSIX semantics and always come back with
/// forward slashes. References climbing above the namespace are not guarded:
/// they simply lose the namespace prefix.
pub fn resolve(current: &str, reference: &str) -> String {
    if !is_relative(reference) {
        return reference.to_string();
    }

    let joined = [current, "..", reference]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/");

    normalize(&joined)
}

/// Collapse `.`/`..`/empty segments of a `/`-separated path.
fn normalize(path: &str) -> String {
    let rooted = path.starts_with('/');
    let trailing = path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let mut normalized = segments.join("/");
    if rooted {
        normalized.insert(0, '/');
    } else if normalized.is_empty() {
        normalized.push('.');
    }
    if trailing && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_reference_unchanged() {
        assert_eq!(resolve("ns/a/b", "somepkg/x"), "somepkg/x");
        assert_eq!(resolve("ns/a/b", "three"), "three");
        assert_eq!(resolve("ns/a/b", "@pixiv/types-vrm-0.0"), "@pixiv/types-vrm-0.0");
    }

    #[test]
    fn test_current_directory_reference() {
        assert_eq!(resolve("ns/a/b", "./c"), "ns/a/c");
        assert_eq!(resolve("ns/a/index", "./y"), "ns/a/y");
    }

    #[test]
    fn test_parent_directory_reference() {
        assert_eq!(resolve("ns/a/b", "../c"), "ns/c");
        assert_eq!(resolve("ns/a/b/c", "../../d/e"), "ns/a/d/e");
    }

    #[test]
    fn test_scoped_namespace() {
        assert_eq!(
            resolve("@pixiv/three-vrm/lookAt/VRMLookAt", "../core/VRMCore"),
            "@pixiv/three-vrm/core/VRMCore"
        );
    }

    #[test]
    fn test_redundant_segments() {
        assert_eq!(resolve("ns/a/b", "./x/./y//z"), "ns/a/x/y/z");
        assert_eq!(resolve("ns/a/b", "./x/../y"), "ns/a/y");
    }

    #[test]
    fn test_escaping_namespace_is_not_guarded() {
        assert_eq!(resolve("ns/a", "../x"), "x");
        assert_eq!(resolve("ns/a", "../../x"), "../x");
    }

    #[test]
    fn test_trailing_slash_preserved() {
        assert_eq!(resolve("ns/a/b", "./dir/"), "ns/a/dir/");
    }

    #[test]
    fn test_backslashes_become_forward_slashes() {
        assert_eq!(resolve("ns\\a\\b", ".\\c\\d"), "ns/a/c/d");
    }

    #[test]
    fn test_reference_to_own_directory() {
        assert_eq!(resolve("ns/a/b", "."), "ns/a");
        assert_eq!(resolve("ns/a", ".."), ".");
    }

    #[test]
    fn test_is_relative() {
        assert!(is_relative("./a"));
        assert!(is_relative("../a"));
        assert!(is_relative(".hidden"));
        assert!(!is_relative("a"));
        assert!(!is_relative("/abs"));
    }
}
