//! Extraction of the wrapper body from an immediately-invoked bundle.
//!
//! The bundler emits the backend as `(function () { ... })();`. The target
//! runtime only sees top-level declarations, so the wrapper has to go. Three
//! strategies are tried in order, each cheaper and less precise than the one
//! before it.

use crate::parser;

/// An extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Parse the bundle and take the first top-level IIFE body.
    Ast,
    /// Scan from `(function` to its matching close brace.
    BraceScan,
    /// Slice between the strict-mode prologue and the last `})()`.
    Heuristic,
}

impl Tier {
    /// All tiers in the order they are tried.
    pub const ALL: [Tier; 3] = [Tier::Ast, Tier::BraceScan, Tier::Heuristic];

    /// Runs this strategy alone.
    pub fn extract(self, bundle: &str) -> Option<String> {
        match self {
            Tier::Ast => extract_ast(bundle),
            Tier::BraceScan => extract_brace_scan(bundle),
            Tier::Heuristic => extract_heuristic(bundle),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Tier::Ast => "ast",
            Tier::BraceScan => "brace-scan",
            Tier::Heuristic => "heuristic",
        })
    }
}

/// Tries each tier in order; the first non-empty result wins.
pub fn extract_body(bundle: &str) -> Option<(Tier, String)> {
    Tier::ALL.iter().find_map(|&tier| {
        tier.extract(bundle)
            .filter(|body| !body.is_empty())
            .map(|body| (tier, body))
    })
}

fn extract_ast(bundle: &str) -> Option<String> {
    match parser::iife_body_span(bundle) {
        Ok(Some(span)) => bundle.get(span).map(str::to_string),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!("AST extraction unavailable: {e}");
            None
        }
    }
}

/// Counts braces outside string literals.
///
/// Template literals are treated as plain strings with no `${}` nesting, so
/// a template nested inside an interpolation can end the scan early.
fn extract_brace_scan(bundle: &str) -> Option<String> {
    let start = bundle.find("(function")?;
    let open = start + bundle[start..].find('{')?;
    let bytes = bundle.as_bytes();

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(bundle[open + 1..i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn extract_heuristic(bundle: &str) -> Option<String> {
    let start = bundle
        .find("\"use strict\"")
        .or_else(|| bundle.find("'use strict'"))
        .map_or(0, |i| i + "'use strict'".len());
    let end = bundle.rfind("})()")?;
    (end > start).then(|| bundle[start..end].to_string())
}
