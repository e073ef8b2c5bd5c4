//! Content digests for cache invalidation and incremental builds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content digest computed using XXH3.
///
/// Two digests are equal when the inputs fed to the [`DigestBuilder`] were
/// byte-for-byte identical. Persisted as a 32-character lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FileDigest([u8; 16]);

impl FileDigest {
    /// Computes a digest from a single byte slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut builder = DigestBuilder::new();
        builder.update(data);
        builder.finish()
    }

    /// Returns the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileDigest({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Error returned when a string is not a valid 32-character hex digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid digest '{0}': expected 32 hex characters")]
pub struct ParseDigestError(pub String);

impl FromStr for FileDigest {
    type Err = ParseDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 || !s.is_ascii() {
            return Err(ParseDigestError(s.to_string()));
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseDigestError(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl From<FileDigest> for String {
    fn from(digest: FileDigest) -> Self {
        digest.to_string()
    }
}

impl TryFrom<String> for FileDigest {
    type Error = ParseDigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Streaming digest over a sequence of byte chunks.
///
/// Chunk boundaries are not recorded, so callers that need to distinguish
/// `("ab", "c")` from `("a", "bc")` must feed unambiguous inputs themselves.
pub struct DigestBuilder {
    state: Xxh3,
}

impl DigestBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Feeds another chunk into the digest.
    pub fn update(&mut self, chunk: &[u8]) {
        self.state.update(chunk);
    }

    /// Consumes the builder and returns the final digest.
    pub fn finish(self) -> FileDigest {
        FileDigest(self.state.digest128().to_le_bytes())
    }
}

impl Default for DigestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = FileDigest::from_bytes(b"hello world");
        let b = FileDigest::from_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = FileDigest::from_bytes(b"hello");
        let b = FileDigest::from_bytes(b"hellp");
        assert_ne!(a, b);
    }

    #[test]
    fn streaming_matches_single_chunk() {
        let mut builder = DigestBuilder::new();
        builder.update(b"hello ");
        builder.update(b"world");
        assert_eq!(builder.finish(), FileDigest::from_bytes(b"hello world"));
    }

    #[test]
    fn display_format() {
        let h = FileDigest::from_bytes(b"test");
        let s = format!("{h}");
        assert_eq!(s.len(), 32, "Display should be 32 hex chars");
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn debug_abbreviated() {
        let h = FileDigest::from_bytes(b"test");
        let s = format!("{h:?}");
        assert!(s.starts_with("FileDigest("));
        assert!(s.ends_with(")"));
    }

    #[test]
    fn hex_parse_roundtrip() {
        let h = FileDigest::from_bytes(b"parse me");
        let back: FileDigest = h.to_hex().parse().unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("".parse::<FileDigest>().is_err());
        assert!("zz".repeat(16).parse::<FileDigest>().is_err());
        assert!("ab".repeat(20).parse::<FileDigest>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let h = FileDigest::from_bytes(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{h}\""));
        let back: FileDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn deserialize_rejects_bad_hex() {
        let result: Result<FileDigest, _> = serde_json::from_str("\"not-a-digest\"");
        assert!(result.is_err());
    }
}
