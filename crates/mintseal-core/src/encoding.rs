//! Text encodings for account data, keys and envelopes.
//!
//! Base58 uses the Bitcoin alphabet (the one chain addresses are written in);
//! leading zero bytes map to leading `'1'` characters in both directions.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::EncodingError;

/// A text encoding for binary payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Base64,
    Base58,
    Hex,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Base64 => "base64",
            Encoding::Base58 => "base58",
            Encoding::Hex => "hex",
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base64" => Ok(Encoding::Base64),
            "base58" => Ok(Encoding::Base58),
            "hex" => Ok(Encoding::Hex),
            other => Err(format!("unknown encoding '{other}' (expected base64, base58 or hex)")),
        }
    }
}

/// Decode standard (padded) base64.
pub fn bytes_from_base64(text: &str) -> Result<Vec<u8>, EncodingError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| EncodingError::new(Encoding::Base64, e.to_string()))
}

pub fn bytes_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base58, preserving leading zero bytes.
pub fn bytes_from_base58(text: &str) -> Result<Vec<u8>, EncodingError> {
    bs58::decode(text.trim())
        .into_vec()
        .map_err(|e| EncodingError::new(Encoding::Base58, e.to_string()))
}

pub fn bytes_to_base58(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode hex. Accepts an optional `0x`/`0X` prefix and either case.
pub fn bytes_from_hex(text: &str) -> Result<Vec<u8>, EncodingError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() % 2 != 0 {
        return Err(EncodingError::new(
            Encoding::Hex,
            format!("odd-length hex string ({} digits)", digits.len()),
        ));
    }

    hex::decode(digits).map_err(|e| EncodingError::new(Encoding::Hex, e.to_string()))
}

/// Lowercase hex without prefix.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode `text` according to `encoding`.
pub fn decode_text(text: &str, encoding: Encoding) -> Result<Vec<u8>, EncodingError> {
    match encoding {
        Encoding::Base64 => bytes_from_base64(text),
        Encoding::Base58 => bytes_from_base58(text),
        Encoding::Hex => bytes_from_hex(text),
    }
}

/// Encode `bytes` according to `encoding`.
pub fn encode_bytes(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Base64 => bytes_to_base64(bytes),
        Encoding::Base58 => bytes_to_base58(bytes),
        Encoding::Hex => bytes_to_hex(bytes),
    }
}
