//! Pure functions over `/`-delimited key prefixes.
//!
//! An object store has no directories, only keys. A prefix such as
//! `logs/2024/` acts as a pseudo-directory path; these helpers derive the
//! breadcrumb trail for a prefix and compose child paths inside it.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Separator between path segments in object keys.
pub const DELIMITER: char = '/';

/// One step in the breadcrumb trail of a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Segment name (no delimiter).
    pub name: String,
    /// Cumulative prefix up to and including this segment, with a trailing
    /// delimiter.
    pub path: String,
}

impl Breadcrumb {
    /// Create a breadcrumb entry.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

fn segments(prefix: &str) -> Vec<&str> {
    prefix.split(DELIMITER).filter(|s| !s.is_empty()).collect()
}

/// Split a prefix into its breadcrumb trail.
///
/// Empty segments are dropped, so `""`, `"/"` and `"//"` all yield an empty
/// trail, and `"a//b"` is treated like `"a/b/"`.
pub fn breadcrumbs_of(prefix: &str) -> Vec<Breadcrumb> {
    let parts = segments(prefix);
    (0..parts.len())
        .map(|i| {
            let path = format!("{}{DELIMITER}", parts[..=i].iter().join("/"));
            Breadcrumb::new(parts[i], path)
        })
        .collect()
}

/// Compose the full path of a child named `name` inside `prefix`.
///
/// The caller guarantees `name` contains no delimiter.
pub fn child_path(prefix: &str, name: &str, is_folder: bool) -> String {
    let mut path = String::with_capacity(prefix.len() + name.len() + 1);
    path.push_str(prefix);
    path.push_str(name);
    if is_folder {
        path.push(DELIMITER);
    }
    path
}

/// Canonical form of a prefix: empty segments collapsed and a trailing
/// delimiter added, or `""` for the root.
pub fn normalize_prefix(prefix: &str) -> String {
    breadcrumbs_of(prefix)
        .pop()
        .map(|crumb| crumb.path)
        .unwrap_or_default()
}

/// Prefix one level above `prefix` (`""` at or directly below the root).
pub fn parent_of(prefix: &str) -> String {
    let mut crumbs = breadcrumbs_of(prefix);
    crumbs.pop();
    crumbs.pop().map(|crumb| crumb.path).unwrap_or_default()
}

/// Last non-empty segment of a key or prefix.
pub fn leaf_name(full_path: &str) -> &str {
    full_path
        .split(DELIMITER)
        .filter(|s| !s.is_empty())
        .next_back()
        .unwrap_or("")
}

/// Whether `path` names a folder (pseudo-directory) rather than an object.
pub fn is_folder_path(path: &str) -> bool {
    path.ends_with(DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breadcrumbs_empty() {
        assert!(breadcrumbs_of("").is_empty());
        assert!(breadcrumbs_of("/").is_empty());
        assert!(breadcrumbs_of("///").is_empty());
    }

    #[test]
    fn test_breadcrumbs_nested() {
        let crumbs = breadcrumbs_of("logs/2024/jan/");
        assert_eq!(
            crumbs,
            vec![
                Breadcrumb::new("logs", "logs/"),
                Breadcrumb::new("2024", "logs/2024/"),
                Breadcrumb::new("jan", "logs/2024/jan/"),
            ]
        );
    }

    #[test]
    fn test_breadcrumbs_collapse_empty_segments() {
        let crumbs = breadcrumbs_of("/a//b");
        assert_eq!(crumbs.len(), 2);
        assert_eq!(crumbs[1].path, "a/b/");
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("", "2024", true), "2024/");
        assert_eq!(child_path("2024/", "readme.txt", false), "2024/readme.txt");
    }

    #[test]
    fn test_normalize_and_parent() {
        assert_eq!(normalize_prefix("a//b"), "a/b/");
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(parent_of("a/b/"), "a/");
        assert_eq!(parent_of("a/"), "");
        assert_eq!(parent_of(""), "");
    }

    #[test]
    fn test_leaf_name() {
        assert_eq!(leaf_name("a/b/"), "b");
        assert_eq!(leaf_name("a/b/c.txt"), "c.txt");
        assert_eq!(leaf_name(""), "");
    }
}
