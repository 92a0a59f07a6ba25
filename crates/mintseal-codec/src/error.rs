use thiserror::Error;

use mintseal_core::EncodingError;

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Which part of an instruction was too short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionPart {
    Accounts,
    Data,
}

impl std::fmt::Display for InstructionPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstructionPart::Accounts => f.write_str("account keys"),
            InstructionPart::Data => f.write_str("data bytes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer underrun: reading {requested} bytes at offset {offset} exceeds buffer length {len}")]
    BufferUnderrun {
        offset: usize,
        requested: usize,
        len: usize,
    },

    #[error("malformed account: {len} bytes (expected at least {expected})")]
    MalformedAccount { len: usize, expected: usize },

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("no decoder registered under '{name}'")]
    NoDecoderFound { name: String },

    #[error("decoder '{name}' is already registered")]
    DuplicateDecoder { name: String },

    #[error("incomplete {program} instruction (opcode {opcode}): expected at least {expected} {part}, found {actual}")]
    IncompleteInstruction {
        program: &'static str,
        opcode: u32,
        part: InstructionPart,
        expected: usize,
        actual: usize,
    },

    #[error("empty {program} instruction data")]
    EmptyInstruction { program: &'static str },

    #[error("account index {index} out of range ({len} account keys)")]
    AccountIndexOutOfRange { index: usize, len: usize },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("account {address} not found")]
    AccountNotFound { address: String },

    #[error("rpc error: {0}")]
    Rpc(String),
}
