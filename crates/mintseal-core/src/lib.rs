//! mintseal-core: shared types, configuration, error types, text encodings and
//! the RPC collaborator contract used by the codec and crypto crates.

pub mod config;
pub mod encoding;
pub mod error;
pub mod rpc;
pub mod types;

pub use encoding::{
    bytes_from_base58, bytes_from_base64, bytes_from_hex, bytes_to_base58, bytes_to_base64,
    bytes_to_hex, decode_text, encode_bytes, Encoding,
};
pub use error::{CoreError, CoreResult, EncodingError};
pub use types::{Address, ADDRESS_LEN};
