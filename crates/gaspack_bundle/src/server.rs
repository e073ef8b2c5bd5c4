//! Backend bundle: build, unwrap, strip, validate, write.

use std::path::PathBuf;

use gaspack_cache::SERVER_ARTIFACT;
use gaspack_config::BuildSettings;

use crate::bundler::{scratch_dir, Bundler, ServerJob};
use crate::error::BundleError;
use crate::extract::{extract_body, Tier};
use crate::parser::{self, ParseError};
use crate::strip::strip_module_artifacts;

/// Backend entry module inside the server directory.
pub const SERVER_ENTRY: &str = "index.ts";

/// Where an output that fails validation is saved for inspection.
pub const INVALID_ARTIFACT: &str = "Code.invalid.js";

/// Outcome of the post-transform syntax check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// The output parses as a classic script.
    Passed,
    /// No parser was available; the output was written unchecked.
    Skipped,
}

/// What [`build_server`] produced.
#[derive(Debug, Clone)]
pub struct ServerReport {
    /// The written backend artifact.
    pub artifact: PathBuf,
    /// Extraction tier and validation result, or `None` if the bundle could
    /// not be unwrapped and was copied unchanged.
    pub transform: Option<(Tier, Validation)>,
}

/// Unwraps a bundle and strips module artifacts.
///
/// Returns `None` when no extraction tier recognizes the bundle.
pub fn transform_bundle(bundle: &str) -> Option<(Tier, String)> {
    let (tier, body) = extract_body(bundle)?;
    Some((tier, strip_module_artifacts(&body)))
}

/// Checks that transformed output parses as a classic script.
///
/// A missing parser is not an error. A syntax error yields the parser's
/// message.
pub fn validate(code: &str) -> Result<Validation, String> {
    match parser::check_syntax(code) {
        Ok(()) => Ok(Validation::Passed),
        Err(ParseError::Unavailable) => Ok(Validation::Skipped),
        Err(ParseError::Syntax { message }) => Err(message),
    }
}

/// Builds the backend artifact into the output directory.
///
/// Output that fails validation is saved as [`INVALID_ARTIFACT`] and the
/// build fails; it must never be deployed as the backend artifact.
pub async fn build_server(
    bundler: &dyn Bundler,
    settings: &BuildSettings,
) -> Result<ServerReport, BundleError> {
    let scratch = scratch_dir(&settings.temp_dir, "server-")?;
    let job = ServerJob {
        entry: settings.server_dir.join(SERVER_ENTRY),
        work_dir: scratch.path().to_path_buf(),
    };
    bundler.bundle_server(&job).await?;

    let bundle_path = job.output();
    let bundle = match tokio::fs::read_to_string(&bundle_path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BundleError::MissingOutput { path: bundle_path });
        }
        Err(e) => return Err(BundleError::io(bundle_path, e)),
    };

    let out_dir = &settings.out_dir;
    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| BundleError::io(out_dir, e))?;
    let artifact = out_dir.join(SERVER_ARTIFACT);
    let diagnostic = out_dir.join(INVALID_ARTIFACT);

    let Some((tier, code)) = transform_bundle(&bundle) else {
        tracing::warn!(
            "could not unwrap the server bundle; writing it unchanged, it may not run on the platform"
        );
        tokio::fs::write(&artifact, &bundle)
            .await
            .map_err(|e| BundleError::io(&artifact, e))?;
        return Ok(ServerReport {
            artifact,
            transform: None,
        });
    };

    let validation = match validate(&code) {
        Ok(v) => v,
        Err(message) => {
            if let Err(e) = tokio::fs::write(&diagnostic, &code).await {
                tracing::warn!("cannot save {}: {e}", diagnostic.display());
            }
            return Err(BundleError::InvalidSyntax {
                message,
                diagnostic,
            });
        }
    };
    if validation == Validation::Skipped {
        tracing::warn!("no script parser available; server output was not syntax-checked");
    }

    let mut text = code.trim().to_string();
    text.push('\n');
    tokio::fs::write(&artifact, text)
        .await
        .map_err(|e| BundleError::io(&artifact, e))?;
    // A diagnostic left by an earlier failed run no longer describes the output.
    let _ = tokio::fs::remove_file(&diagnostic).await;

    tracing::info!(tier = %tier, "wrote {}", artifact.display());
    Ok(ServerReport {
        artifact,
        transform: Some((tier, validation)),
    })
}
