//! Import specifier extraction.
//!
//! A regular-expression scan rather than a parse. It recognizes
//! `import ... from '<spec>'` and `export ... from '<spec>'` (the clause may
//! span lines but not a `;`), side-effect `import '<spec>'`, and dynamic
//! `import('<spec>')`. Specifiers inside comments or strings are picked up
//! too; that can only add inputs to a digest, never drop them.

use once_cell::sync::Lazy;
use regex::Regex;

static SPECIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?:import|export)\s+[^'";]*?\bfrom\s*['"]([^'"\n]+)['"]"#,
        r#"|import\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#,
        r#"|import\s+['"]([^'"\n]+)['"]"#,
    ))
    .expect("specifier pattern is valid")
});

/// Returns every static import specifier in `source`, in order of appearance.
pub fn scan_specifiers(source: &str) -> Vec<&str> {
    SPECIFIER_RE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str())
        .collect()
}
