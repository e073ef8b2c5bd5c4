//! Import graph resolution.
//!
//! Follows relative (`./`, `../`) and aliased (`@/`) specifiers from an entry
//! file to on-disk files. Bare package specifiers are external and ignored.
//! Code files are scanned further; stylesheets, markup and data files are
//! included in the result but not traversed.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::path::normalize;
use crate::scan::scan_specifiers;

/// Extensions of files scanned for further imports.
pub const CODE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Extensions of files that can be part of a page's inputs.
pub const INCLUDED_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "css", "json", "html"];

/// Suffixes probed, in order, for extensionless specifiers.
pub const PROBE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".css", ".json"];

/// Resolves import specifiers against the project layout.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    src_dir: PathBuf,
    alias: String,
}

impl ImportResolver {
    /// Creates a resolver mapping `alias` (e.g. `@/`) to `src_dir`.
    pub fn new(src_dir: &Path, alias: &str) -> Self {
        Self {
            src_dir: src_dir.to_path_buf(),
            alias: alias.to_string(),
        }
    }

    /// Resolves one specifier written in `from`.
    ///
    /// Returns `None` for external specifiers and for specifiers with no
    /// matching file.
    pub fn resolve_specifier(&self, from: &Path, spec: &str) -> Option<PathBuf> {
        let base = if let Some(rest) = spec.strip_prefix(self.alias.as_str()) {
            self.src_dir.join(rest)
        } else if spec.starts_with('.') {
            from.parent()?.join(spec)
        } else {
            return None;
        };
        let base = normalize(&base);

        let mut candidates = Vec::with_capacity(1 + PROBE_EXTENSIONS.len() * 2);
        if has_extension(&base, INCLUDED_EXTENSIONS) {
            candidates.push(base.clone());
        }
        for ext in PROBE_EXTENSIONS {
            let mut with_ext: OsString = base.clone().into_os_string();
            with_ext.push(ext);
            candidates.push(PathBuf::from(with_ext));
        }
        for ext in PROBE_EXTENSIONS {
            candidates.push(base.join(format!("index{ext}")));
        }

        candidates.into_iter().find(|c| c.is_file())
    }

    /// Collects every file reachable from `entry` through static imports.
    ///
    /// The entry itself is always part of the result. Each file is visited
    /// at most once, so import cycles terminate.
    pub fn collect_graph(&self, entry: &Path) -> BTreeSet<PathBuf> {
        let mut files = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut to_visit = vec![normalize(entry)];

        while let Some(file) = to_visit.pop() {
            if !visited.insert(file.clone()) {
                continue;
            }
            files.insert(file.clone());
            if !has_extension(&file, CODE_EXTENSIONS) {
                continue;
            }
            let Ok(text) = std::fs::read_to_string(&file) else {
                continue;
            };
            for spec in scan_specifiers(&text) {
                let Some(resolved) = self.resolve_specifier(&file, spec) else {
                    tracing::trace!(from = %file.display(), spec, "unresolved import ignored");
                    continue;
                };
                files.insert(resolved.clone());
                if has_extension(&resolved, CODE_EXTENSIONS) {
                    to_visit.push(resolved);
                }
            }
        }

        files
    }
}

/// Returns `true` if the path's extension (case-insensitive) is in `exts`.
pub(crate) fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Project {
        dir: tempfile::TempDir,
    }

    impl Project {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn src(&self) -> PathBuf {
            self.dir.path().join("src")
        }

        fn write(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.src().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
            path
        }

        fn resolver(&self) -> ImportResolver {
            ImportResolver::new(&self.src(), "@/")
        }
    }

    #[test]
    fn relative_with_probed_extension() {
        let p = Project::new();
        let app = p.write("client/pages/home/App.tsx", "");
        let button = p.write("client/components/ui/button.tsx", "");
        let r = p.resolver();
        assert_eq!(
            r.resolve_specifier(&app, "../../components/ui/button"),
            Some(button)
        );
    }

    #[test]
    fn alias_resolves_against_src() {
        let p = Project::new();
        let app = p.write("client/pages/home/App.tsx", "");
        let css = p.write("client/index.css", "");
        let r = p.resolver();
        assert_eq!(r.resolve_specifier(&app, "@/client/index.css"), Some(css));
    }

    #[test]
    fn directory_index_is_probed() {
        let p = Project::new();
        let app = p.write("client/App.tsx", "");
        let index = p.write("client/lib/index.ts", "");
        let r = p.resolver();
        assert_eq!(r.resolve_specifier(&app, "./lib"), Some(index));
    }

    #[test]
    fn ts_preferred_over_tsx() {
        let p = Project::new();
        let app = p.write("App.tsx", "");
        let ts = p.write("util.ts", "");
        p.write("util.tsx", "");
        assert_eq!(p.resolver().resolve_specifier(&app, "./util"), Some(ts));
    }

    #[test]
    fn external_specifiers_are_ignored() {
        let p = Project::new();
        let app = p.write("App.tsx", "");
        let r = p.resolver();
        assert_eq!(r.resolve_specifier(&app, "react"), None);
        assert_eq!(r.resolve_specifier(&app, "@radix-ui/react-slot"), None);
    }

    #[test]
    fn missing_module_is_dropped() {
        let p = Project::new();
        let app = p.write("App.tsx", "import Missing from './missing';\n");
        let graph = p.resolver().collect_graph(&app);
        assert_eq!(graph, BTreeSet::from([app]));
    }

    #[test]
    fn cycle_terminates_and_lists_each_file_once() {
        let p = Project::new();
        let a = p.write("a.ts", "import { b } from './b';\nexport const a = 1;\n");
        let b = p.write("b.ts", "import { a } from './a';\nexport const b = 2;\n");
        let graph = p.resolver().collect_graph(&a);
        assert_eq!(graph.into_iter().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn cycle_through_parent_directories_terminates() {
        let p = Project::new();
        let a = p.write("x/a.ts", "import '../x/b';\n");
        let b = p.write("x/b.ts", "import '../x/a';\n");
        let graph = p.resolver().collect_graph(&a);
        assert_eq!(graph, BTreeSet::from([a, b]));
    }

    #[test]
    fn assets_are_included_but_not_traversed() {
        let p = Project::new();
        let app = p.write(
            "client/pages/home/App.tsx",
            "import './home.css';\nimport data from './data.json';\n",
        );
        let css = p.write("client/pages/home/home.css", "@import './never-followed.css';");
        let json = p.write("client/pages/home/data.json", "{}");
        p.write("client/pages/home/never-followed.css", "");

        let graph = p.resolver().collect_graph(&app);
        assert_eq!(graph, BTreeSet::from([app, css, json]));
    }

    #[test]
    fn transitive_dependencies_are_followed() {
        let p = Project::new();
        let app = p.write(
            "client/pages/dashboard/App.tsx",
            "import { DataTable } from '@/client/components/data-table';\n",
        );
        let table = p.write(
            "client/components/data-table.tsx",
            "import type { Row } from '../types';\nimport { cn } from '@/client/lib/utils';\n",
        );
        let types = p.write("client/types/index.ts", "export type Row = {};");
        let utils = p.write("client/lib/utils.ts", "export function cn() {}");

        let graph = p.resolver().collect_graph(&app);
        assert_eq!(graph, BTreeSet::from([app, table, types, utils]));
    }

    #[test]
    fn explicit_extension_is_tried_first() {
        let p = Project::new();
        let app = p.write("App.tsx", "");
        let css = p.write("theme.css", "");
        assert_eq!(p.resolver().resolve_specifier(&app, "./theme.css"), Some(css));
    }
}
