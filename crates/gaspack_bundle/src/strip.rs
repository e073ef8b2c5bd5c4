//! Removal of module-system leftovers from an extracted bundle body.
//!
//! The backend bundle may carry CommonJS-style export bookkeeping and a
//! module table that re-publishes exports onto the global object. The target
//! runtime needs neither; plain top-level function declarations are picked up
//! on their own.

use once_cell::sync::Lazy;
use regex::Regex;

const PUBLISH_LOOP: &str = "for (const __mod of __modules)";

static MODULE_VARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n?\s*(?:var|const|let)\s+__m\d+[^\n]*?=[\s\S]*?;\s*").unwrap()
});

static MODULE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n?\s*(?:var|const|let)\s+__modules\s*=\s*\[[\s\S]*?\];\s*").unwrap()
});

static PUBLISH_LOOP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"for\s*\(const\s+__mod\s+of\s+__modules\)[\s\S]*$").unwrap());

static STRICT_PROLOGUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^(?:\s*'use strict'|\s*"use strict");?"#).unwrap());

static EXPORT_ASSIGN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\n)\s*exports\.[A-Za-z0-9_$]+\s*=\s*[^;\n]+;?").unwrap()
});

static DEFINE_PROPERTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Object\.defineProperty\(exports,[\s\S]*?\);?").unwrap());

static ES_MODULE_FLAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\n)\s*exports\.__esModule\s*=\s*true;?").unwrap());

/// Strips module artifacts from an extracted body and trims the result.
///
/// In order: everything from the publish loop onward, `__mN` module
/// variables, the `__modules` table, the first strict-mode prologue,
/// `exports.NAME = ...` assignments, `Object.defineProperty(exports, ...)`
/// calls and `exports.__esModule = true`. Empty `catch {}` blocks are left
/// alone since removing them would orphan their `try`.
pub fn strip_module_artifacts(body: &str) -> String {
    let body = match body.find(PUBLISH_LOOP) {
        Some(idx) => &body[..idx],
        None => body,
    };

    let out = MODULE_VARS_RE.replace_all(body, "");
    let out = MODULE_TABLE_RE.replace_all(&out, "");
    let out = PUBLISH_LOOP_RE.replace_all(&out, "");
    let out = STRICT_PROLOGUE_RE.replace(&out, "");
    let out = EXPORT_ASSIGN_RE.replace_all(&out, "");
    let out = DEFINE_PROPERTY_RE.replace_all(&out, "");
    let out = ES_MODULE_FLAG_RE.replace_all(&out, "");
    out.trim().to_string()
}
