//! The generated routing function.
//!
//! The backend serves a page by name through `doGet`, falling back to a
//! default page for unknown or missing names. The module is regenerated from
//! the discovered pages on every build, before the backend is bundled.

use std::path::{Path, PathBuf};

use crate::error::BundleError;

/// File name of the routing module inside the server directory.
pub const ROUTING_MODULE: &str = "doGet.generated.ts";

/// Picks the fallback page.
///
/// `preferred` if it was discovered, else the first discovered page, else
/// `preferred` anyway so the function still has a target.
pub fn default_page(pages: &[String], preferred: &str) -> String {
    if pages.iter().any(|p| p == preferred) {
        preferred.to_string()
    } else {
        pages.first().map_or_else(|| preferred.to_string(), Clone::clone)
    }
}

/// Renders the routing module source.
pub fn render_routing_module(pages: &[String], preferred: &str) -> String {
    let known = serde_json::Value::from(pages.to_vec()).to_string();
    let fallback = serde_json::Value::String(default_page(pages, preferred)).to_string();
    format!(
        "// GENERATED by gaspack - do not edit\n\
         export function doGet(e: GoogleAppsScript.Events.DoGet): GoogleAppsScript.HTML.HtmlOutput {{\n\
         \x20 const page = (e && e.parameter && e.parameter.page ? String(e.parameter.page) : '').trim();\n\
         \x20 const known = new Set({known});\n\
         \x20 const target = known.has(page) ? page : {fallback};\n\
         \x20 return HtmlService.createHtmlOutputFromFile(target);\n\
         }}\n"
    )
}

/// Writes the routing module into `server_dir`.
///
/// The file is left untouched when its content is already current.
pub fn write_routing_module(
    server_dir: &Path,
    pages: &[String],
    preferred: &str,
) -> Result<PathBuf, BundleError> {
    let path = server_dir.join(ROUTING_MODULE);
    let content = render_routing_module(pages, preferred);
    if std::fs::read_to_string(&path).is_ok_and(|existing| existing == content) {
        return Ok(path);
    }
    std::fs::create_dir_all(server_dir).map_err(|e| BundleError::io(server_dir, e))?;
    std::fs::write(&path, content).map_err(|e| BundleError::io(&path, e))?;
    tracing::debug!("wrote {}", path.display());
    Ok(path)
}
