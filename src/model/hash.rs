//! SHA-256 content hashing for IR values.
//!
//! Block hashes cover the UTF-8 bytes of the block text. Corpus and document
//! hashes cover the bytes produced by a [`Serializer`], so the encoding used for
//! integrity checks is an explicit parameter rather than a hidden global.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::{ContentBlock, Corpus, Document};
use crate::error::{Error, Result};

/// Lower-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Whether `s` looks like a hash produced by [`sha256_hex`].
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Encodes IR values to bytes for hashing.
pub trait Serializer {
    fn to_bytes<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;
}

/// Compact JSON encoding via `serde_json`.
///
/// Struct fields are emitted in declaration order and attribute maps are
/// ordered, so equal values always encode to equal bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn to_bytes<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::Serialize(e.to_string()))
    }
}

/// Hash an entire corpus.
pub fn hash_corpus<S: Serializer>(corpus: &Corpus, serializer: &S) -> Result<String> {
    Ok(sha256_hex(&serializer.to_bytes(corpus)?))
}

/// Hash a single document.
pub fn hash_document<S: Serializer>(document: &Document, serializer: &S) -> Result<String> {
    Ok(sha256_hex(&serializer.to_bytes(document)?))
}

impl ContentBlock {
    /// Hash the block text, store the digest and return it.
    pub fn compute_hash(&mut self) -> &str {
        let digest = sha256_hex(self.text.as_bytes());
        self.hash.insert(digest)
    }

    /// True only when a hash is stored and it matches the current text.
    pub fn verify_hash(&self) -> bool {
        self.hash
            .as_deref()
            .is_some_and(|stored| stored == sha256_hex(self.text.as_bytes()))
    }
}
