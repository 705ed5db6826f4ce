//! Content hashing utilities using Blake3
//!
//! This module provides the ContentHash type used for the on-disk layout
//! and the Integrity type handed out to callers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use blake3::Hasher;
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;
use std::str::FromStr;
use stow_core::error::StowError;

/// A Blake3 content hash for content-addressable storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash {
    /// The raw hash bytes (32 bytes for Blake3)
    bytes: [u8; 32],
}

impl ContentHash {
    /// Create a new ContentHash from raw bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Create a new ContentHash from a Vec<u8>
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self, StowError> {
        if bytes.len() != 32 {
            return Err(StowError::IntegrityFailure {
                subject: "hash".to_string(),
                expected: "32 bytes".to_string(),
                actual: format!("{} bytes", bytes.len()),
            });
        }
        let mut array = [0u8; 32];
        array.copy_from_slice(&bytes);
        Ok(Self { bytes: array })
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Convert hash to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Create ContentHash from hexadecimal string
    pub fn from_hex(hex_str: &str) -> Result<Self, StowError> {
        let bytes = hex::decode(hex_str).map_err(|e| StowError::IntegrityFailure {
            subject: "hash".to_string(),
            expected: "valid hex string".to_string(),
            actual: format!("invalid hex: {}", e),
        })?;
        Self::from_vec(bytes)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Compute Blake3 hash of content
pub fn compute_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Hasher::new();
    hasher.update(content);
    let hash = hasher.finalize();
    ContentHash::new(*hash.as_bytes())
}

/// Subresource-integrity style digest, rendered as `blake3-<base64>`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    SerdeSerialize, SerdeDeserialize
)]
#[serde(into = "String", try_from = "String")]
pub struct Integrity {
    hash: ContentHash,
}

impl Integrity {
    /// Name of the only supported algorithm
    pub const ALGORITHM: &'static str = "blake3";

    /// Wrap a content hash
    pub fn new(hash: ContentHash) -> Self {
        Self { hash }
    }

    /// Integrity of an in-memory buffer
    pub fn of(content: &[u8]) -> Self {
        Self::new(compute_hash(content))
    }

    /// The underlying content hash
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Check that `content` hashes to this integrity
    pub fn matches(&self, content: &[u8]) -> bool {
        compute_hash(content) == self.hash
    }
}

impl From<ContentHash> for Integrity {
    fn from(hash: ContentHash) -> Self {
        Self::new(hash)
    }
}

impl fmt::Display for Integrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", Self::ALGORITHM, STANDARD.encode(self.hash.as_bytes()))
    }
}

impl FromStr for Integrity {
    type Err = StowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| StowError::IntegrityFailure {
            subject: "integrity".to_string(),
            expected: format!("{}-<base64 digest>", Self::ALGORITHM),
            actual: reason,
        };

        let (algorithm, digest) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| invalid(format!("'{}'", s)))?;
        if algorithm != Self::ALGORITHM {
            return Err(invalid(format!("unsupported algorithm '{}'", algorithm)));
        }

        let bytes = STANDARD
            .decode(digest)
            .map_err(|e| invalid(format!("invalid base64: {}", e)))?;
        Ok(Self::new(ContentHash::from_vec(bytes)?))
    }
}

impl TryFrom<String> for Integrity {
    type Error = StowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Integrity> for String {
    fn from(integrity: Integrity) -> Self {
        integrity.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_invalid_length() {
        let bytes = vec![0u8; 16];
        assert!(ContentHash::from_vec(bytes).is_err());
    }

    #[test]
    fn test_hex_conversion() {
        let hash = compute_hash(b"hello world");
        let restored = ContentHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, restored);
        assert_eq!(hash.to_hex().len(), 64);
    }

    #[test]
    fn test_compute_hash() {
        let content = b"hello world";
        let hash1 = compute_hash(content);
        let hash2 = compute_hash(content);
        assert_eq!(hash1, hash2); // Deterministic

        let hash3 = compute_hash(b"hello world!");
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_integrity_format() {
        let integrity = Integrity::of(b"hello world");
        let text = integrity.to_string();
        assert!(text.starts_with("blake3-"));
        assert_eq!(text.parse::<Integrity>().unwrap(), integrity);
        assert!(integrity.matches(b"hello world"));
        assert!(!integrity.matches(b"hello world!"));
    }

    #[test]
    fn test_integrity_rejects_other_algorithms() {
        let err = "sha512-AAAA".parse::<Integrity>().unwrap_err();
        assert!(err.to_string().contains("unsupported algorithm"));
        assert!("blake3".parse::<Integrity>().is_err());
        assert!("blake3-!!!".parse::<Integrity>().is_err());
    }

    #[test]
    fn test_integrity_serde() {
        let integrity = Integrity::of(b"abc");
        let json = serde_json::to_string(&integrity).unwrap();
        assert_eq!(json, format!("\"{}\"", integrity));
        let back: Integrity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, integrity);
    }
}
