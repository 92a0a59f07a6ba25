//! Optional zstd compression applied before encryption.

use serde::{Deserialize, Serialize};

use mintseal_core::config::CryptoConfig;

use crate::error::{CryptoError, CryptoResult};

pub const ZSTD: &str = "zstd";

/// Recorded in payload metadata when the plaintext was compressed. Its
/// presence is what triggers decompression on the way out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionInfo {
    pub algorithm: String,
    pub original_size: usize,
    pub compressed_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPolicy {
    pub enabled: bool,
    pub level: i32,
    pub min_bytes: usize,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self::from_config(&CryptoConfig::default())
    }
}

impl CompressionPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn from_config(config: &CryptoConfig) -> Self {
        Self {
            enabled: config.compress,
            level: config.compression_level,
            min_bytes: config.compression_min_bytes,
        }
    }

    /// Compress when enabled, large enough and actually smaller.
    pub fn apply(&self, plaintext: &[u8]) -> CryptoResult<(Vec<u8>, Option<CompressionInfo>)> {
        if !self.enabled || plaintext.len() < self.min_bytes {
            return Ok((plaintext.to_vec(), None));
        }
        let compressed = zstd::encode_all(plaintext, self.level)
            .map_err(|e| CryptoError::Compression(format!("zstd compress: {e}")))?;
        if compressed.len() >= plaintext.len() {
            tracing::debug!(size = plaintext.len(), "compression skipped, no gain");
            return Ok((plaintext.to_vec(), None));
        }
        let info = CompressionInfo {
            algorithm: ZSTD.to_string(),
            original_size: plaintext.len(),
            compressed_size: compressed.len(),
        };
        Ok((compressed, Some(info)))
    }
}

/// Append the canonical encoding of `info` to `aad`.
///
/// Layout: flag u8 (0 absent, 1 present), then when present the algorithm
/// as length u8 plus bytes, original size u64 LE and compressed size u64 LE.
pub fn bind_compression(mut aad: Vec<u8>, info: Option<&CompressionInfo>) -> Vec<u8> {
    match info {
        None => aad.push(0),
        Some(info) => {
            let algorithm = info.algorithm.as_bytes();
            let algorithm = &algorithm[..algorithm.len().min(u8::MAX as usize)];
            aad.reserve(1 + 1 + algorithm.len() + 16);
            aad.push(1);
            aad.push(algorithm.len() as u8);
            aad.extend_from_slice(algorithm);
            aad.extend_from_slice(&(info.original_size as u64).to_le_bytes());
            aad.extend_from_slice(&(info.compressed_size as u64).to_le_bytes());
        }
    }
    aad
}

/// Undo [`CompressionPolicy::apply`] according to the recorded info.
pub fn restore(data: Vec<u8>, info: Option<&CompressionInfo>) -> CryptoResult<Vec<u8>> {
    let Some(info) = info else {
        return Ok(data);
    };
    if info.algorithm != ZSTD {
        return Err(CryptoError::Compression(format!(
            "unsupported algorithm '{}'",
            info.algorithm
        )));
    }
    let plain = zstd::decode_all(data.as_slice())
        .map_err(|e| CryptoError::Compression(format!("zstd decompress: {e}")))?;
    if plain.len() != info.original_size {
        return Err(CryptoError::Compression(format!(
            "decompressed {} bytes, expected {}",
            plain.len(),
            info.original_size
        )));
    }
    Ok(plain)
}
