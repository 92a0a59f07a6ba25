use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::encoding::Encoding;
use crate::error::{CoreError, CoreResult};

/// Top-level SDK configuration (loaded from mintseal.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MintsealConfig {
    pub log: LogConfig,
    pub codec: CodecConfig,
    pub crypto: CryptoConfig,
}

impl MintsealConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> CoreResult<Self> {
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Encoding assumed for text account data when none is given (default: base64)
    pub default_encoding: Encoding,
    /// Upper bound on TLV entries walked per account (default: 64)
    pub max_tlv_extensions: usize,
}

/// Encryption configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Recipient count at which a context moves from direct to shared-key (default: 10)
    pub auto_transition_threshold: usize,
    /// Compress plaintext with zstd before encrypting (default: false)
    pub compress: bool,
    /// zstd compression level (default: 3)
    pub compression_level: i32,
    /// Plaintexts shorter than this are never compressed (default: 256)
    pub compression_min_bytes: usize,
    /// Rotate the shared key when a member is removed (default: true)
    pub rotate_on_remove: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            default_encoding: Encoding::Base64,
            max_tlv_extensions: 64,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            auto_transition_threshold: 10,
            compress: false,
            compression_level: 3,
            compression_min_bytes: 256,
            rotate_on_remove: true,
        }
    }
}
