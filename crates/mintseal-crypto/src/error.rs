use thiserror::Error;

use mintseal_core::EncodingError;

use crate::EncryptionMethod;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Wrong key or tampered ciphertext. The two are indistinguishable.
    #[error("authentication failed: wrong key or corrupted ciphertext")]
    AuthenticationFailed,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("malformed envelope: {0}")]
    InvalidEnvelope(String),

    #[error("buffer split mismatch: lengths sum to {expected}, buffer has {actual} bytes")]
    SplitMismatch { expected: usize, actual: usize },

    #[error("no key share for recipient {recipient}")]
    MemberNotFound { recipient: String },

    #[error("recipient {recipient} is already a member")]
    MemberExists { recipient: String },

    #[error("group mismatch: envelope is for {found}, metadata is for {expected}")]
    GroupMismatch { expected: String, found: String },

    #[error("group {group_id} not found")]
    GroupNotFound { group_id: String },

    #[error("stale metadata for {group_id}: version {imported} does not supersede {current}")]
    StaleVersion {
        group_id: String,
        current: u64,
        imported: u64,
    },

    #[error("key version {version} is not available")]
    KeyVersionUnavailable { version: u64 },

    #[error("invalid method: expected {expected}, found {found}")]
    InvalidMethod {
        expected: EncryptionMethod,
        found: EncryptionMethod,
    },

    #[error("{member} lacks {permission} permission")]
    PermissionDenied {
        member: String,
        permission: &'static str,
    },

    #[error("context {context_id} not found")]
    ContextNotFound { context_id: String },

    #[error("compression failed: {0}")]
    Compression(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
