//! # permafs-blobref
//!
//! Blob references: the string identifiers used for immutable content blobs
//! and for permanodes alike.
//!
//! ## Canonical Form
//!
//! ```text
//! <hashname>-<hexdigest>
//! sha1-0beec7b5ea3f0fdbc95d0dd47f3c5bc275da8a33
//! ```
//!
//! - `hashname` is `[a-z0-9]+`
//! - `hexdigest` is lowercase `[a-f0-9]+`
//! - digest functions we know about must carry a digest of the right length;
//!   anything else is kept as an opaque reference

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hash names with a fixed hex digest length.
const KNOWN_DIGESTS: &[(&str, usize)] = &[
    ("sha1", 40),
    ("sha224", 56),
    ("sha256", 64),
    ("blake3", 64),
];

/// Errors that can occur while parsing a blob reference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobRefError {
    #[error("malformed blobref: {0:?}")]
    Malformed(String),

    #[error("{hash_name} digest must be {expected} hex chars, got {actual}")]
    DigestLength {
        hash_name: String,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, BlobRefError>;

/// Reference to a blob or permanode.
///
/// Immutable once parsed. Equality, ordering and hashing all follow the
/// canonical string form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobRef {
    hash_name: String,
    digest: String,
}

impl BlobRef {
    /// Parse a blob reference.
    ///
    /// Either the whole input is a valid reference or nothing is returned.
    pub fn parse(s: &str) -> Result<Self> {
        let (hash_name, digest) = s
            .split_once('-')
            .ok_or_else(|| BlobRefError::Malformed(s.to_string()))?;

        let name_ok = !hash_name.is_empty()
            && hash_name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
        let digest_ok = !digest.is_empty()
            && digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !name_ok || !digest_ok {
            return Err(BlobRefError::Malformed(s.to_string()));
        }

        if let Some(expected) = Self::expected_digest_len(hash_name) {
            if digest.len() != expected {
                return Err(BlobRefError::DigestLength {
                    hash_name: hash_name.to_string(),
                    expected,
                    actual: digest.len(),
                });
            }
        }

        Ok(Self {
            hash_name: hash_name.to_string(),
            digest: digest.to_string(),
        })
    }

    /// Reference for the given bytes, using BLAKE3.
    pub fn for_content(data: &[u8]) -> Self {
        Self {
            hash_name: "blake3".to_string(),
            digest: hex::encode(blake3::hash(data).as_bytes()),
        }
    }

    /// Digest length for a known hash function, `None` for opaque ones.
    pub fn expected_digest_len(hash_name: &str) -> Option<usize> {
        KNOWN_DIGESTS
            .iter()
            .find(|(name, _)| *name == hash_name)
            .map(|(_, len)| *len)
    }

    pub fn hash_name(&self) -> &str {
        &self.hash_name
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.hash_name, self.digest)
    }
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobRef({})", self)
    }
}

impl FromStr for BlobRef {
    type Err = BlobRefError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BlobRef {
    type Error = BlobRefError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<BlobRef> for String {
    fn from(br: BlobRef) -> String {
        br.to_string()
    }
}
