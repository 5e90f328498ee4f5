//! XOR + base64 obfuscation codec.
//!
//! **This is obfuscation, not encryption.** The key is a fixed string shipped
//! with the client; the codec keeps stored values from being readable at a
//! glance in a storage inspector and nothing more. Anyone holding the binary
//! can recover every value. Do not store secrets that need real
//! confidentiality behind it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Key used when the configuration does not provide one.
pub const DEFAULT_OBFUSCATION_KEY: &str = "fiscaldesk::local-storage::v1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("obfuscation key must not be empty")]
    EmptyKey,

    #[error("stored value is not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("decoded value is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Clone)]
pub struct ObfuscationCodec {
    key: Vec<u8>,
}

impl ObfuscationCodec {
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(CodecError::EmptyKey);
        }
        Ok(Self { key: key.to_vec() })
    }

    fn xor(&self, bytes: &[u8]) -> Vec<u8> {
        bytes
            .iter()
            .zip(self.key.iter().cycle())
            .map(|(b, k)| b ^ k)
            .collect()
    }

    /// XOR the UTF-8 bytes of `plaintext` against the repeating key, then
    /// base64-encode. Deterministic: equal inputs give equal outputs.
    pub fn encode(&self, plaintext: &str) -> String {
        STANDARD.encode(self.xor(plaintext.as_bytes()))
    }

    pub fn decode(&self, encoded: &str) -> Result<String, CodecError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CodecError::InvalidEncoding(e.to_string()))?;
        String::from_utf8(self.xor(&bytes)).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl Default for ObfuscationCodec {
    fn default() -> Self {
        Self {
            key: DEFAULT_OBFUSCATION_KEY.as_bytes().to_vec(),
        }
    }
}

impl std::fmt::Debug for ObfuscationCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObfuscationCodec")
            .field("key_len", &self.key.len())
            .finish()
    }
}
