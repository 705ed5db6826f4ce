//! Path utilities for resolving user-supplied paths.
//!
//! Resolution is lexical: `.` and `..` are folded without touching the
//! filesystem, so a symlinked parent is not expanded.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {
                // Skip current directory
            },
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                },
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {},
                _ => components.push(component),
            },
            other => {
                components.push(other);
            },
        }
    }

    if components.is_empty() {
        return PathBuf::from(".");
    }

    components.iter().collect()
}

/// Resolve `path` against `cwd` into a normalized absolute path
pub fn resolve_path(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&cwd.join(path))
    }
}

/// Split an absolute file path into its containing directory and base name
///
/// Returns `None` for paths with no file name component, such as `/`.
pub fn split_file_path(path: &Path) -> Option<(PathBuf, OsString)> {
    let file_name = path.file_name()?.to_os_string();
    let directory = path.parent()?.to_path_buf();
    Some((directory, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let path = Path::new("./src/../lib/./file.rs");
        let normalized = normalize_path(path);
        assert_eq!(normalized, Path::new("lib/file.rs"));
    }

    #[test]
    fn test_normalize_keeps_leading_parent() {
        assert_eq!(normalize_path(Path::new("../a/b")), Path::new("../a/b"));
        assert_eq!(normalize_path(Path::new("a/..")), Path::new("."));
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_does_not_escape_root() {
        assert_eq!(normalize_path(Path::new("/../etc")), Path::new("/etc"));
        assert_eq!(normalize_path(Path::new("/a/../..")), Path::new("/"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_path() {
        let cwd = Path::new("/home/user/project");

        assert_eq!(resolve_path(cwd, Path::new(".")), Path::new("/home/user/project"));
        assert_eq!(
            resolve_path(cwd, Path::new("./README.md")),
            Path::new("/home/user/project/README.md")
        );
        assert_eq!(
            resolve_path(cwd, Path::new("../other/file.txt")),
            Path::new("/home/user/other/file.txt")
        );
        assert_eq!(resolve_path(cwd, Path::new("/tmp/./x")), Path::new("/tmp/x"));
    }

    #[cfg(unix)]
    #[test]
    fn test_split_file_path() {
        let (dir, name) = split_file_path(Path::new("/home/user/.gitignore")).unwrap();
        assert_eq!(dir, Path::new("/home/user"));
        assert_eq!(name, OsString::from(".gitignore"));

        assert!(split_file_path(Path::new("/")).is_none());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn resolved_paths_are_absolute_and_clean(
            segments in prop::collection::vec(prop_oneof![
                Just(".".to_string()),
                Just("..".to_string()),
                "[a-z]{1,8}",
            ], 0..8)
        ) {
            let relative: PathBuf = segments.iter().collect();
            let cwd = std::env::temp_dir();
            let resolved = resolve_path(&cwd, &relative);

            prop_assert!(resolved.is_absolute());
            prop_assert!(resolved
                .components()
                .all(|c| !matches!(c, Component::CurDir | Component::ParentDir)));
        }
    }
}
