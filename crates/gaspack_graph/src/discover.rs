//! Page entry and auxiliary template discovery.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use gaspack_common::{walk_files, Recoverable};

/// Dedicated markup file marking a page directory.
pub const PAGE_MARKUP: &str = "index.html";

/// Root component file marking a page that renders through the shared template.
pub const PAGE_COMPONENT: &str = "App.tsx";

/// One discovered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Page name, taken from its directory name.
    pub name: String,
    /// The page's own markup; `None` means the shared template is used.
    pub markup: Option<PathBuf>,
}

/// An auxiliary markup file staged next to the page artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Output name without extension; the artifact is `<key>.html`.
    pub key: String,
    /// Source file.
    pub source: PathBuf,
    /// Source path relative to the pages root, `/`-separated.
    pub relative: String,
}

/// Scans `pages_root` for page entries, sorted by name.
///
/// A subdirectory is a page if it holds `index.html`, or failing that
/// `App.tsx`. Other directories and plain files are skipped. An unreadable
/// root degrades to an empty list.
pub fn discover_entries(pages_root: &Path) -> Recoverable<Vec<Entry>> {
    let dirents = match std::fs::read_dir(pages_root) {
        Ok(d) => d,
        Err(e) => {
            return Recoverable::degraded(
                Vec::new(),
                format!("cannot read pages directory {}: {e}", pages_root.display()),
            );
        }
    };

    let mut entries = Vec::new();
    for dirent in dirents.flatten() {
        if !dirent.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let Some(name) = dirent.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let dir = dirent.path();
        let markup = dir.join(PAGE_MARKUP);
        if markup.is_file() {
            entries.push(Entry {
                name,
                markup: Some(markup),
            });
        } else if dir.join(PAGE_COMPONENT).is_file() {
            entries.push(Entry { name, markup: None });
        }
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Recoverable::ok(entries)
}

/// Finds auxiliary markup files under `pages_root`.
///
/// Every `*.html` file not named `index.html` is staged under a key built
/// from its directory segments and stem joined with `.`
/// (`dashboard/modals/edit.html` becomes `dashboard.modals.edit`). A file
/// directly in the root whose stem equals a page name is keyed
/// `<stem>.template` so it does not overwrite that page's artifact.
pub fn discover_templates(pages_root: &Path, page_names: &BTreeSet<String>) -> Vec<TemplateFile> {
    let mut templates = Vec::new();
    for source in walk_files(pages_root) {
        let Some(file_name) = source.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        let lower = file_name.to_ascii_lowercase();
        if !lower.ends_with(".html") || lower == PAGE_MARKUP {
            continue;
        }
        let Ok(rel) = source.strip_prefix(pages_root) else {
            continue;
        };
        let mut segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        segments.pop();
        let stem = &file_name[..file_name.len() - ".html".len()];

        let key = if segments.is_empty() && page_names.contains(stem) {
            format!("{stem}.template")
        } else {
            let mut parts = segments.clone();
            parts.push(stem.to_string());
            parts.join(".")
        };
        if key.is_empty() {
            continue;
        }

        let mut relative = segments;
        relative.push(file_name.to_string());
        templates.push(TemplateFile {
            key,
            source,
            relative: relative.join("/"),
        });
    }
    templates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn discovers_sorted_entries_with_markup_kinds() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "home/App.tsx");
        touch(dir.path(), "dashboard/index.html");
        touch(dir.path(), "dashboard/App.tsx");
        touch(dir.path(), "empty/readme.md");
        touch(dir.path(), "loose.html");

        let found = discover_entries(dir.path());
        assert!(!found.is_degraded());
        let entries = found.into_value();
        assert_eq!(
            entries,
            vec![
                Entry {
                    name: "dashboard".to_string(),
                    markup: Some(dir.path().join("dashboard/index.html")),
                },
                Entry {
                    name: "home".to_string(),
                    markup: None,
                },
            ]
        );
    }

    #[test]
    fn order_is_lexicographic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            touch(dir.path(), &format!("{name}/App.tsx"));
        }
        let names: Vec<_> = discover_entries(dir.path())
            .into_value()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn missing_root_degrades_to_empty() {
        let found = discover_entries(Path::new("/nonexistent/pages"));
        assert!(found.is_degraded());
        assert!(found.value.is_empty());
    }

    #[test]
    fn templates_are_keyed_by_path() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dashboard/index.html");
        touch(dir.path(), "dashboard/modals/edit.html");
        touch(dir.path(), "home/App.tsx");
        touch(dir.path(), "shared.html");

        let pages = BTreeSet::from(["dashboard".to_string(), "home".to_string()]);
        let templates = discover_templates(dir.path(), &pages);
        let keys: Vec<_> = templates.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["dashboard.modals.edit", "shared"]);
        assert_eq!(templates[0].relative, "dashboard/modals/edit.html");
    }

    #[test]
    fn root_template_colliding_with_page_is_renamed() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "home/App.tsx");
        touch(dir.path(), "home.html");
        touch(dir.path(), "nested/home.html");

        let pages = BTreeSet::from(["home".to_string()]);
        let keys: Vec<_> = discover_templates(dir.path(), &pages)
            .into_iter()
            .map(|t| t.key)
            .collect();
        assert_eq!(keys, vec!["home.template", "nested.home"]);
    }

    #[test]
    fn index_files_are_never_templates() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/INDEX.HTML");
        touch(dir.path(), "a/Other.HTML");
        let keys: Vec<_> = discover_templates(dir.path(), &BTreeSet::new())
            .into_iter()
            .map(|t| t.key)
            .collect();
        assert_eq!(keys, vec!["a.Other"]);
    }
}
