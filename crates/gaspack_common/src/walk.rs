//! Iterative directory traversal.
//!
//! Both walkers use an explicit stack instead of recursion and never follow
//! symlinked directories, so traversal depth and cycles are bounded by the
//! real directory tree.

use std::path::{Path, PathBuf};

/// Collects every file below `root`, sorted by path.
///
/// Unreadable directories are skipped. A missing `root` yields an empty list.
pub fn walk_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_file() || path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    files
}

/// Returns the first file below `root` accepted by `matches`.
///
/// Directory entries are visited in sorted order, files of a directory
/// before its subdirectories, so the result does not depend on the order in
/// which the filesystem lists entries.
pub fn find_first_file(root: &Path, matches: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => dirs.push(path),
                Ok(_) if path.is_file() => files.push(path),
                _ => {}
            }
        }
        files.sort();
        if let Some(found) = files.into_iter().find(|p| matches(p)) {
            return Some(found);
        }
        dirs.sort();
        stack.extend(dirs.into_iter().rev());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_collects_nested_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("b/c")).unwrap();
        std::fs::write(dir.path().join("b/c/deep.ts"), "x").unwrap();
        std::fs::write(dir.path().join("a.ts"), "x").unwrap();
        std::fs::write(dir.path().join("b/mid.json"), "{}").unwrap();

        let files = walk_files(dir.path());
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a.ts"),
                PathBuf::from("b/c/deep.ts"),
                PathBuf::from("b/mid.json"),
            ]
        );
    }

    #[test]
    fn walk_missing_root_is_empty() {
        assert!(walk_files(Path::new("/nonexistent/gaspack/root")).is_empty());
    }

    #[test]
    fn find_first_prefers_shallow_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/nested.html"), "").unwrap();
        std::fs::write(dir.path().join("index.html"), "").unwrap();

        let found = find_first_file(dir.path(), |p| {
            p.extension().is_some_and(|e| e.eq_ignore_ascii_case("html"))
        });
        assert_eq!(found, Some(dir.path().join("index.html")));
    }

    #[test]
    fn find_first_descends_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("x/y")).unwrap();
        std::fs::write(dir.path().join("x/y/page.html"), "").unwrap();
        std::fs::write(dir.path().join("style.css"), "").unwrap();

        let found = find_first_file(dir.path(), |p| {
            p.extension().is_some_and(|e| e == "html")
        });
        assert_eq!(found, Some(dir.path().join("x/y/page.html")));
    }

    #[test]
    fn find_first_none_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "").unwrap();
        assert!(find_first_file(dir.path(), |p| p.ends_with("b.js")).is_none());
    }
}
