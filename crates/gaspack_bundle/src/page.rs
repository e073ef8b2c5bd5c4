//! Page bundles: one self-contained markup file per page.

use std::path::{Path, PathBuf};

use gaspack_common::{find_first_file, walk_files};
use gaspack_config::BuildSettings;
use gaspack_graph::Entry;

use crate::bundler::{scratch_dir, Bundler, PageJob};
use crate::error::BundleError;

/// Placeholders substituted into the shared template.
const TEMPLATE_PLACEHOLDERS: [&str; 2] = ["{{PAGE_NAME}}", "{{TITLE}}"];

/// Returns the markup a page is bundled from.
///
/// A page's own `index.html` is used verbatim. Otherwise the shared template
/// is read and every placeholder replaced with the page name.
pub async fn render_markup(entry: &Entry, shared_template: &Path) -> Result<String, BundleError> {
    match &entry.markup {
        Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BundleError::MissingMarkup {
                    page: entry.name.clone(),
                    path: path.clone(),
                }
            } else {
                BundleError::io(path, e)
            }
        }),
        None => {
            if !shared_template.is_file() {
                return Err(BundleError::MissingTemplate {
                    page: entry.name.clone(),
                    path: shared_template.to_path_buf(),
                });
            }
            let template = tokio::fs::read_to_string(shared_template)
                .await
                .map_err(|e| BundleError::io(shared_template, e))?;
            Ok(TEMPLATE_PLACEHOLDERS
                .iter()
                .fold(template, |text, placeholder| text.replace(placeholder, &entry.name)))
        }
    }
}

/// Generates the entry script that mounts a page's root component.
///
/// `component` and `stylesheet` are import specifiers as the bundler
/// resolves them.
pub fn entry_script(component: &str, stylesheet: Option<&str>) -> String {
    let mut out = String::from(
        "import { StrictMode } from 'react';\nimport { createRoot } from 'react-dom/client';\n",
    );
    if let Some(css) = stylesheet {
        out.push_str(&format!("import {};\n", quote(css)));
    }
    out.push_str(&format!("import App from {};\n", quote(component)));
    out.push_str(
        "\ncreateRoot(document.getElementById('root')!).render(\n  <StrictMode>\n    <App />\n  </StrictMode>,\n);\n",
    );
    out
}

/// Bundles one page and writes `<name>.html` into the output directory.
///
/// Scratch files live in a per-page directory under the temp root, removed
/// on return whether the build succeeded or not.
pub async fn build_page(
    bundler: &dyn Bundler,
    settings: &BuildSettings,
    entry: &Entry,
) -> Result<PathBuf, BundleError> {
    let scratch = scratch_dir(&settings.temp_dir, &format!("{}-", entry.name))?;
    let job = PageJob {
        name: entry.name.clone(),
        work_dir: scratch.path().to_path_buf(),
    };

    let page_dir = job.page_dir();
    tokio::fs::create_dir_all(&page_dir)
        .await
        .map_err(|e| BundleError::io(&page_dir, e))?;
    let markup = render_markup(entry, &settings.shared_template).await?;
    write(&job.markup(), markup).await?;

    let component = alias_specifier(
        settings,
        &settings.pages_dir.join(&entry.name).join("App"),
    );
    let stylesheet = settings
        .global_css
        .is_file()
        .then(|| alias_specifier(settings, &settings.global_css));
    write(
        &page_dir.join("main.tsx"),
        entry_script(&component, stylesheet.as_deref()),
    )
    .await?;

    bundler.bundle_page(&job).await?;

    let out_dir = job.out_dir();
    let Some(built) = find_first_file(&out_dir, is_markup) else {
        tracing::debug!(page = %entry.name, "bundler output: {:?}", walk_files(&out_dir));
        return Err(BundleError::NoMarkupOutput {
            page: entry.name.clone(),
            dir: out_dir,
        });
    };
    let html = tokio::fs::read_to_string(&built)
        .await
        .map_err(|e| BundleError::io(&built, e))?;

    tokio::fs::create_dir_all(&settings.out_dir)
        .await
        .map_err(|e| BundleError::io(&settings.out_dir, e))?;
    let dest = settings.out_dir.join(format!("{}.html", entry.name));
    write(&dest, html).await?;
    tracing::info!(page = %entry.name, "wrote {}", dest.display());
    Ok(dest)
}

async fn write(path: &Path, contents: String) -> Result<(), BundleError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| BundleError::io(path, e))
}

fn is_markup(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html"))
}

/// Spells `target` through the import alias when it lies under the source
/// root, and as an absolute path otherwise.
fn alias_specifier(settings: &BuildSettings, target: &Path) -> String {
    match target.strip_prefix(&settings.src_dir) {
        Ok(rel) => {
            let rel: Vec<_> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            format!("{}{}", settings.alias, rel.join("/"))
        }
        Err(_) => target.to_string_lossy().replace('\\', "/"),
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
