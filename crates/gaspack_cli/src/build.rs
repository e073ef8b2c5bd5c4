//! The build orchestrator.
//!
//! Sequences one run: discovery, routing generation, the backend build, page
//! builds under a concurrency cap, template staging, pruning, manifest copy
//! and cache persistence. The cache is owned here; builders only report
//! success and the digests are recorded afterwards.

use std::collections::BTreeSet;
use std::path::Path;

use gaspack_bundle::{build_page, build_server, write_routing_module, BundleError, Bundler, ServerReport};
use gaspack_cache::{digest_files, BuildCache, CacheLoad, LoadOutcome, Unit};
use gaspack_config::BuildSettings;
use gaspack_graph::{discover_entries, discover_templates, Entry, ImportResolver};

use crate::pipeline::{page_digest, server_digest};
use crate::runner::run_with_concurrency;

/// What happened to the backend in one run.
#[derive(Debug)]
pub enum ServerOutcome {
    /// Rebuilt and written.
    Built(ServerReport),
    /// Digest and artifact unchanged under `--changed`.
    Unchanged,
    /// Not considered because of `--skip-server`.
    Skipped,
}

/// Summary of one build run.
#[derive(Debug)]
pub struct BuildReport {
    /// Backend outcome.
    pub server: ServerOutcome,
    /// Pages rebuilt, in completion order.
    pub pages_built: Vec<String>,
    /// Pages skipped as unchanged.
    pub pages_unchanged: Vec<String>,
    /// Template keys copied.
    pub templates_copied: Vec<String>,
    /// Units dropped because their source disappeared.
    pub pruned: Vec<Unit>,
    /// File names in the output directory after the run, sorted.
    pub outputs: Vec<String>,
}

/// Runs a full build.
///
/// Any server or page failure aborts the run and is returned. Template
/// staging, pruning and cache persistence are best-effort and only logged.
pub async fn run_build(settings: &BuildSettings, bundler: &dyn Bundler) -> Result<BuildReport, BundleError> {
    let out_dir = &settings.out_dir;
    tokio::fs::create_dir_all(out_dir).await.map_err(|source| BundleError::Io {
        path: out_dir.clone(),
        source,
    })?;

    let discovered = discover_entries(&settings.pages_dir);
    if let Some(reason) = &discovered.degraded {
        tracing::warn!("{reason}");
    }
    let all_entries = discovered.into_value();
    let all_names: Vec<String> = all_entries.iter().map(|e| e.name.clone()).collect();
    if all_names.is_empty() {
        tracing::info!("discovered pages: (none)");
    } else {
        tracing::info!("discovered pages: {}", all_names.join(", "));
    }
    let entries: Vec<&Entry> = all_entries
        .iter()
        .filter(|e| settings.page_selected(&e.name))
        .collect();

    // Routing covers every discovered page, even under --pages.
    write_routing_module(&settings.server_dir, &all_names, &settings.default_page)?;

    let CacheLoad { mut cache, outcome } = BuildCache::load(out_dir);
    match outcome {
        LoadOutcome::Loaded => tracing::debug!("build cache loaded"),
        LoadOutcome::Missing => tracing::debug!("no build cache; starting empty"),
        LoadOutcome::Corrupt(reason) => {
            tracing::warn!("ignoring unreadable build cache: {reason}");
        }
    }

    let server = if settings.skip_server {
        tracing::info!("skipping server build (--skip-server)");
        ServerOutcome::Skipped
    } else {
        let digest = server_digest(settings);
        if settings.only_changed && !cache.is_stale(&Unit::Server, digest) {
            tracing::info!("skipping server build (no changes detected)");
            ServerOutcome::Unchanged
        } else {
            tracing::info!("building server");
            let report = build_server(bundler, settings).await?;
            cache.record(&Unit::Server, digest);
            ServerOutcome::Built(report)
        }
    };

    let resolver = ImportResolver::new(&settings.src_dir, &settings.alias);
    let mut pending = Vec::new();
    let mut pages_unchanged = Vec::new();
    for entry in entries {
        if entry.markup.is_none() {
            tracing::debug!(page = %entry.name, "no index.html; using the shared template");
        }
        let digest = page_digest(settings, &resolver, entry);
        let unit = Unit::Page(entry.name.clone());
        if settings.only_changed && !cache.is_stale(&unit, digest) {
            tracing::debug!(page = %entry.name, "unchanged");
            pages_unchanged.push(entry.name.clone());
        } else {
            pending.push((entry, unit, digest));
        }
    }

    let mut pages_built = Vec::new();
    if pending.is_empty() {
        tracing::info!("no pages to build");
    } else {
        tracing::info!(
            "building {} page(s) with concurrency={}",
            pending.len(),
            settings.concurrency
        );
        let built = run_with_concurrency(pending.iter().collect::<Vec<_>>(), settings.concurrency, |job| {
            let (entry, _, _) = job;
            async move {
                build_page(bundler, settings, entry).await?;
                Ok::<_, BundleError>(entry.name.clone())
            }
        })
        .await?;
        for (_, unit, digest) in &pending {
            cache.record(unit, *digest);
        }
        pages_built = built;
    }

    let page_set: BTreeSet<String> = all_names.into_iter().collect();
    let (template_keys, templates_copied) = stage_templates(settings, &page_set, &mut cache).await;

    let prune = cache.prune(&page_set, &template_keys);
    for failure in &prune.failures {
        tracing::warn!("prune: {failure}");
    }

    copy_manifest(settings).await?;

    if let Err(e) = tokio::fs::remove_dir_all(&settings.temp_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!("cannot remove {}: {e}", settings.temp_dir.display());
        }
    }

    if let Err(e) = cache.save() {
        tracing::warn!("cannot save build cache: {e}");
    }

    let outputs = list_outputs(out_dir);
    tracing::info!("build finished; files in {}:", out_dir.display());
    for name in &outputs {
        tracing::info!("  - {name}");
    }

    Ok(BuildReport {
        server,
        pages_built,
        pages_unchanged,
        templates_copied,
        pruned: prune.removed,
        outputs,
    })
}

/// Copies auxiliary markup files into the output directory.
///
/// Returns every current template key (copied or not) and the keys actually
/// copied. A failed copy is logged and leaves the unit's cache entry as it
/// was.
async fn stage_templates(
    settings: &BuildSettings,
    page_set: &BTreeSet<String>,
    cache: &mut BuildCache,
) -> (BTreeSet<String>, Vec<String>) {
    let mut keys = BTreeSet::new();
    let mut copied = Vec::new();
    for template in discover_templates(&settings.pages_dir, page_set) {
        keys.insert(template.key.clone());
        let unit = Unit::Template(template.key.clone());
        let digest = digest_files(&[&template.source]);
        if settings.only_changed && !cache.is_stale(&unit, digest) {
            continue;
        }
        let dest = cache.artifact_path(&unit);
        match tokio::fs::copy(&template.source, &dest).await {
            Ok(_) => {
                cache.record(&unit, digest);
                tracing::info!("  -> {} copied (template from {})", dest.display(), template.relative);
                copied.push(template.key);
            }
            Err(e) => {
                tracing::warn!("cannot copy template {}: {e}", template.relative);
            }
        }
    }
    (keys, copied)
}

async fn copy_manifest(settings: &BuildSettings) -> Result<(), BundleError> {
    let src = &settings.manifest;
    let Some(name) = src.file_name() else {
        return Ok(());
    };
    if !src.is_file() {
        tracing::info!("no manifest at {} (skipping copy)", src.display());
        return Ok(());
    }
    let dest = settings.out_dir.join(name);
    tokio::fs::copy(src, &dest)
        .await
        .map_err(|source| BundleError::Io {
            path: dest.clone(),
            source,
        })?;
    tracing::info!("  -> {} copied", dest.display());
    Ok(())
}

fn list_outputs(out_dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(out_dir)
        .map(|dir| {
            dir.flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gaspack_bundle::{PageJob, ServerJob};
    use gaspack_config::{resolve_settings, BuildFlags, ProjectConfig};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const SERVER_BUNDLE: &str =
        "(function (exports) {\n  'use strict';\n  function doGet(e) { return e; }\n  exports.doGet = doGet;\n})(this);\n";

    /// Stands in for the real bundler and counts invocations.
    #[derive(Default)]
    struct FakeBundler {
        server_calls: AtomicUsize,
        page_calls: AtomicUsize,
        fail_page: Option<&'static str>,
    }

    #[async_trait]
    impl Bundler for FakeBundler {
        async fn bundle_server(&self, job: &ServerJob) -> Result<(), BundleError> {
            self.server_calls.fetch_add(1, Ordering::SeqCst);
            std::fs::create_dir_all(job.out_dir()).unwrap();
            std::fs::write(job.output(), SERVER_BUNDLE).unwrap();
            Ok(())
        }

        async fn bundle_page(&self, job: &PageJob) -> Result<(), BundleError> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_page == Some(job.name.as_str()) {
                return Err(BundleError::BundlerFailed {
                    unit: format!("page {}", job.name),
                    detail: "exit status: 1".to_string(),
                });
            }
            let markup = std::fs::read_to_string(job.markup()).unwrap();
            std::fs::create_dir_all(job.out_dir()).unwrap();
            std::fs::write(job.out_dir().join("index.html"), markup).unwrap();
            Ok(())
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// `home` relies on the shared template, `dashboard` has its own markup.
    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "src/client/template.html", "<title>{{TITLE}}</title><div id=\"root\"></div>");
        write(root, "src/client/index.css", "body { margin: 0; }");
        write(root, "src/client/pages/home/App.tsx", "import Hero from './Hero';\nexport default Hero;\n");
        write(root, "src/client/pages/home/Hero.tsx", "export default () => null;\n");
        write(root, "src/client/pages/dashboard/index.html", "<h1>dashboard</h1>");
        write(root, "src/client/pages/dashboard/App.tsx", "export default () => null;\n");
        write(root, "src/client/pages/dashboard/modals/edit.html", "<form></form>");
        write(root, "src/server/index.ts", "export * from './doGet.generated';\n");
        write(root, "appsscript.json", "{\"timeZone\": \"Etc/UTC\"}");
        tmp
    }

    fn page_artifact(settings: &BuildSettings, name: &str) -> PathBuf {
        settings.out_dir.join(Unit::Page(name.to_string()).artifact_name())
    }

    fn settings(root: &Path, pages: Option<&str>, only_changed: bool, skip_server: bool) -> BuildSettings {
        let flags = BuildFlags {
            pages: pages.map(str::to_string),
            only_changed,
            skip_server,
        };
        resolve_settings(root, &ProjectConfig::default(), flags)
    }

    #[tokio::test]
    async fn page_filter_builds_only_named_pages() {
        let tmp = project();
        let s = settings(tmp.path(), Some("home"), false, false);
        let bundler = FakeBundler::default();

        let report = run_build(&s, &bundler).await.unwrap();
        assert_eq!(report.pages_built, vec!["home".to_string()]);
        assert_eq!(bundler.page_calls.load(Ordering::SeqCst), 1);
        assert!(page_artifact(&s, "home").is_file());
        assert!(!page_artifact(&s, "dashboard").exists());

        let home = std::fs::read_to_string(page_artifact(&s, "home")).unwrap();
        assert!(home.contains("<title>home</title>"));

        let routing = std::fs::read_to_string(s.server_dir.join("doGet.generated.ts")).unwrap();
        assert!(routing.contains("new Set([\"dashboard\",\"home\"])"));
        assert!(routing.contains("? page : \"home\";"));
    }

    #[tokio::test]
    async fn full_build_writes_every_artifact() {
        let tmp = project();
        let s = settings(tmp.path(), None, false, false);
        let bundler = FakeBundler::default();

        let report = run_build(&s, &bundler).await.unwrap();
        assert!(matches!(report.server, ServerOutcome::Built(_)));
        let mut built = report.pages_built.clone();
        built.sort();
        assert_eq!(built, vec!["dashboard", "home"]);
        assert_eq!(report.templates_copied, vec!["dashboard.modals.edit"]);
        assert_eq!(
            report.outputs,
            vec![
                ".build-cache.json",
                "Code.js",
                "appsscript.json",
                "dashboard.html",
                "dashboard.modals.edit.html",
                "home.html",
            ]
        );

        let code = std::fs::read_to_string(s.out_dir.join("Code.js")).unwrap();
        assert!(code.contains("function doGet(e)"));
        assert!(!code.contains("exports.doGet"));
        assert!(!s.temp_dir.exists());
    }

    #[tokio::test]
    async fn second_changed_run_rebuilds_nothing() {
        let tmp = project();
        let s = settings(tmp.path(), None, true, false);
        let bundler = FakeBundler::default();

        run_build(&s, &bundler).await.unwrap();
        assert_eq!(bundler.server_calls.load(Ordering::SeqCst), 1);
        assert_eq!(bundler.page_calls.load(Ordering::SeqCst), 2);

        let report = run_build(&s, &bundler).await.unwrap();
        assert_eq!(bundler.server_calls.load(Ordering::SeqCst), 1);
        assert_eq!(bundler.page_calls.load(Ordering::SeqCst), 2);
        assert!(matches!(report.server, ServerOutcome::Unchanged));
        assert!(report.pages_built.is_empty());
        assert_eq!(report.pages_unchanged, vec!["dashboard", "home"]);
        assert!(report.templates_copied.is_empty());
    }

    #[tokio::test]
    async fn changed_dependency_rebuilds_its_page_only() {
        let tmp = project();
        let s = settings(tmp.path(), None, true, false);
        let bundler = FakeBundler::default();
        run_build(&s, &bundler).await.unwrap();

        write(tmp.path(), "src/client/pages/home/Hero.tsx", "export default () => 'hi';\n");
        let report = run_build(&s, &bundler).await.unwrap();
        assert_eq!(report.pages_built, vec!["home"]);
        assert!(matches!(report.server, ServerOutcome::Unchanged));
    }

    #[tokio::test]
    async fn missing_artifact_forces_rebuild() {
        let tmp = project();
        let s = settings(tmp.path(), None, true, false);
        let bundler = FakeBundler::default();
        run_build(&s, &bundler).await.unwrap();

        std::fs::remove_file(page_artifact(&s, "dashboard")).unwrap();
        let report = run_build(&s, &bundler).await.unwrap();
        assert_eq!(report.pages_built, vec!["dashboard"]);
    }

    #[tokio::test]
    async fn deleted_page_is_pruned() {
        let tmp = project();
        let s = settings(tmp.path(), None, false, true);
        let bundler = FakeBundler::default();
        run_build(&s, &bundler).await.unwrap();
        assert!(page_artifact(&s, "dashboard").is_file());

        std::fs::remove_dir_all(s.pages_dir.join("dashboard")).unwrap();
        let report = run_build(&s, &bundler).await.unwrap();
        assert!(report.pruned.contains(&Unit::Page("dashboard".to_string())));
        assert!(report.pruned.contains(&Unit::Template("dashboard.modals.edit".to_string())));
        assert!(!page_artifact(&s, "dashboard").exists());
        assert!(!s.out_dir.join("dashboard.modals.edit.html").exists());
    }

    #[tokio::test]
    async fn root_template_survives_removal_of_its_namesake_page() {
        let tmp = project();
        write(tmp.path(), "src/client/pages/about/App.tsx", "export default () => null;\n");
        write(tmp.path(), "src/client/pages/about.html", "<p>about template</p>");
        let s = settings(tmp.path(), None, true, true);
        let bundler = FakeBundler::default();

        let first = run_build(&s, &bundler).await.unwrap();
        assert!(first.templates_copied.contains(&"about.template".to_string()));

        std::fs::remove_dir_all(s.pages_dir.join("about")).unwrap();
        let report = run_build(&s, &bundler).await.unwrap();
        assert!(report.templates_copied.contains(&"about".to_string()));
        assert!(report.pruned.contains(&Unit::Page("about".to_string())));
        assert!(report.pruned.contains(&Unit::Template("about.template".to_string())));

        let about = s.out_dir.join("about.html");
        assert_eq!(std::fs::read_to_string(&about).unwrap(), "<p>about template</p>");
        assert!(!s.out_dir.join("about.template.html").exists());
        assert!(report.outputs.contains(&"about.html".to_string()));
    }

    #[tokio::test]
    async fn skip_server_never_bundles_backend() {
        let tmp = project();
        let s = settings(tmp.path(), None, false, true);
        let bundler = FakeBundler::default();

        let report = run_build(&s, &bundler).await.unwrap();
        assert!(matches!(report.server, ServerOutcome::Skipped));
        assert_eq!(bundler.server_calls.load(Ordering::SeqCst), 0);
        assert!(!s.out_dir.join("Code.js").exists());
    }

    #[tokio::test]
    async fn page_failure_aborts_the_run() {
        let tmp = project();
        let s = settings(tmp.path(), None, false, true);
        let bundler = FakeBundler {
            fail_page: Some("dashboard"),
            ..FakeBundler::default()
        };

        let err = run_build(&s, &bundler).await.unwrap_err();
        assert!(matches!(err, BundleError::BundlerFailed { .. }));
        // The cache is only written by a completed run.
        assert!(!s.out_dir.join(".build-cache.json").exists());
    }

    #[tokio::test]
    async fn missing_shared_template_is_fatal() {
        let tmp = project();
        std::fs::remove_file(tmp.path().join("src/client/template.html")).unwrap();
        let s = settings(tmp.path(), Some("home"), false, true);

        let err = run_build(&s, &FakeBundler::default()).await.unwrap_err();
        assert!(matches!(err, BundleError::MissingTemplate { .. }));
    }
}
