//! Content digests over sets of source files.
//!
//! A unit's digest covers every file that can influence its output. Paths are
//! sorted before hashing so the result does not depend on the order in which
//! the caller discovered them.

use std::path::{Path, PathBuf};

use gaspack_common::{walk_files, DigestBuilder, FileDigest};

/// Computes a single digest over a set of files.
///
/// For each distinct path in lexicographic order, the path string and then
/// the raw file bytes are fed to the digest. Files that cannot be read are
/// skipped entirely, so a missing optional input never fails the digest.
pub fn digest_files<P: AsRef<Path>>(paths: &[P]) -> FileDigest {
    let mut sorted: Vec<&Path> = paths.iter().map(|p| p.as_ref()).collect();
    sorted.sort();
    sorted.dedup();

    let mut builder = DigestBuilder::new();
    for path in sorted {
        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        builder.update(path.to_string_lossy().as_bytes());
        builder.update(&bytes);
    }
    builder.finish()
}

/// Digests every file below `root` whose extension is in `extensions`.
///
/// Returns the digest together with the files that were considered.
pub fn digest_tree(root: &Path, extensions: &[&str]) -> (FileDigest, Vec<PathBuf>) {
    let files: Vec<PathBuf> = walk_files(root)
        .into_iter()
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .collect();
    (digest_files(&files), files)
}
