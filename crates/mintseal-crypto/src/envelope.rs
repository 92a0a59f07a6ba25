//! Encryption results and their method-specific metadata.

use serde::{Deserialize, Serialize};

use mintseal_core::{bytes_from_base58, bytes_to_base58};

use crate::compression::CompressionInfo;
use crate::error::{CryptoError, CryptoResult};
use crate::exchange::PublicKey;
use crate::keyshare::GroupId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EncryptionMethod {
    Personal,
    Direct,
    Group,
    SignatureGroup,
}

impl std::fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Personal => "personal",
            Self::Direct => "direct",
            Self::Group => "group",
            Self::SignatureGroup => "signatureGroup",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PayloadMetadata {
    #[serde(rename_all = "camelCase")]
    Personal {
        public_key: PublicKey,
        timestamp: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compression: Option<CompressionInfo>,
    },
    #[serde(rename_all = "camelCase")]
    Direct {
        sender_public_key: PublicKey,
        recipient_public_key: PublicKey,
        timestamp: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compression: Option<CompressionInfo>,
    },
    /// Static groups and shared-key groups.
    #[serde(rename_all = "camelCase")]
    Group {
        group_id: GroupId,
        key_version: u64,
        sender_public_key: PublicKey,
        timestamp: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compression: Option<CompressionInfo>,
    },
}

impl PayloadMetadata {
    pub fn compression(&self) -> Option<&CompressionInfo> {
        match self {
            Self::Personal { compression, .. }
            | Self::Direct { compression, .. }
            | Self::Group { compression, .. } => compression.as_ref(),
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Personal { timestamp, .. }
            | Self::Direct { timestamp, .. }
            | Self::Group { timestamp, .. } => *timestamp,
        }
    }
}

/// Opaque ciphertext plus what is needed to route and open it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionResult {
    /// base58 envelope
    pub encrypted_data: String,
    pub method: EncryptionMethod,
    pub metadata: PayloadMetadata,
}

impl EncryptionResult {
    pub(crate) fn new(envelope: &[u8], method: EncryptionMethod, metadata: PayloadMetadata) -> Self {
        Self {
            encrypted_data: bytes_to_base58(envelope),
            method,
            metadata,
        }
    }

    pub fn envelope_bytes(&self) -> CryptoResult<Vec<u8>> {
        Ok(bytes_from_base58(&self.encrypted_data)?)
    }

    /// Fail with `InvalidMethod` unless this result was produced by `expected`.
    pub fn expect_method(&self, expected: EncryptionMethod) -> CryptoResult<()> {
        if self.method != expected {
            return Err(CryptoError::InvalidMethod {
                expected,
                found: self.method,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> CryptoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> CryptoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub(crate) fn metadata_mismatch(method: EncryptionMethod) -> CryptoError {
    CryptoError::InvalidEnvelope(format!("metadata does not match method {method}"))
}
