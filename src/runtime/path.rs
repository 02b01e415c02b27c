//! Path utility functions for normalization and comparison.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                // The parent of the root is the root itself
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => result.push(component),
            },
            _ => {
                result.push(component);
            }
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
/// Returns true if `path` is under `dir` (i.e., `dir` is a prefix of `path`).
///
/// # Security
/// Both paths are normalized first, so `node_modules/pkg/../../etc/passwd`
/// is NOT under `node_modules/pkg`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Render a path as `/`-separated segments, whatever the host separator is.
///
/// The path is normalized first; root and drive prefixes are dropped, so the
/// result is always relative (`./esmodules/` becomes `esmodules`, `.` becomes
/// the empty string).
pub fn to_slash(path: &Path) -> String {
    normalize_path(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_simple() {
        assert_eq!(
            normalize_path(Path::new("node_modules/foo/dist/foo.js")),
            PathBuf::from("node_modules/foo/dist/foo.js")
        );
    }

    #[test]
    fn test_normalize_path_with_dot() {
        assert_eq!(
            normalize_path(Path::new("node_modules/foo/./dist/./foo.js")),
            PathBuf::from("node_modules/foo/dist/foo.js")
        );
    }

    #[test]
    fn test_normalize_path_with_parent_dir() {
        assert_eq!(
            normalize_path(Path::new("node_modules/foo/lib/../dist/foo.js")),
            PathBuf::from("node_modules/foo/dist/foo.js")
        );
    }

    #[test]
    fn test_normalize_path_leading_parent_is_kept() {
        assert_eq!(
            normalize_path(Path::new("../foo/bar")),
            PathBuf::from("../foo/bar")
        );
        assert_eq!(
            normalize_path(Path::new("a/../../b")),
            PathBuf::from("../b")
        );
    }

    #[test]
    fn test_normalize_path_only_dots() {
        assert_eq!(normalize_path(Path::new("./././.")), PathBuf::from(""));
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_path_parent_at_root() {
        assert_eq!(
            normalize_path(Path::new("/usr/../../../etc")),
            PathBuf::from("/etc")
        );
    }

    #[test]
    fn test_is_path_under_basic() {
        assert!(is_path_under(
            Path::new("node_modules/foo/dist/foo.js"),
            Path::new("node_modules/foo")
        ));
        assert!(!is_path_under(
            Path::new("node_modules/bar/bar.js"),
            Path::new("node_modules/foo")
        ));
    }

    #[test]
    fn test_is_path_under_rejects_traversal() {
        assert!(!is_path_under(
            Path::new("node_modules/foo/../../etc/passwd"),
            Path::new("node_modules/foo")
        ));
        assert!(!is_path_under(
            Path::new("node_modules/foo/../foobar/x.js"),
            Path::new("node_modules/foo")
        ));
    }

    #[test]
    fn test_is_path_under_with_current_dir_components() {
        assert!(is_path_under(
            Path::new("node_modules/foo/./dist/./foo.js"),
            Path::new("./node_modules/foo")
        ));
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("esmodules")), "esmodules");
        assert_eq!(to_slash(Path::new("./static/esmodules/")), "static/esmodules");
        assert_eq!(to_slash(Path::new(".")), "");
        assert_eq!(to_slash(&Path::new("a").join("b").join("c")), "a/b/c");
    }

    #[cfg(unix)]
    #[test]
    fn test_to_slash_drops_root() {
        assert_eq!(to_slash(Path::new("/srv/www/esmodules")), "srv/www/esmodules");
    }

    #[cfg(windows)]
    #[test]
    fn test_to_slash_windows_separators() {
        assert_eq!(to_slash(Path::new("static\\esmodules")), "static/esmodules");
        assert_eq!(to_slash(Path::new("C:\\srv\\esmodules")), "srv/esmodules");
    }
}
