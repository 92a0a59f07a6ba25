use thiserror::Error;

use crate::encoding::Encoding;

pub type CoreResult<T> = Result<T, CoreError>;

/// Text input did not match its declared encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {encoding} input: {reason}")]
pub struct EncodingError {
    pub encoding: Encoding,
    pub reason: String,
}

impl EncodingError {
    pub fn new(encoding: Encoding, reason: impl Into<String>) -> Self {
        Self {
            encoding,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("config error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
