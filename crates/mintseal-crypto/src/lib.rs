//! mintseal-crypto: client-side encryption for token metadata and messages
//!
//! Layers, bottom up:
//!   - `aead`: AES-256-GCM with detached tags, envelope framing
//!   - `exchange`: X25519 key pairs, ECDH and HKDF-SHA256 key derivation
//!   - `personal` / `direct`: single-owner and two-party encryption
//!   - `group`: static groups sharing a master key via per-member key shares
//!   - `shared`: shared-key groups with permissions, rotation and key history
//!   - `scalable`: contexts that move from direct to shared-key encryption
//!     once enough recipients join
//!
//! Every encryption returns an [`EncryptionResult`] tagged with the method
//! that produced it; decrypting through a different method fails with
//! [`CryptoError::InvalidMethod`].

pub mod aead;
pub mod compression;
pub mod direct;
pub mod envelope;
pub mod error;
pub mod exchange;
pub mod group;
pub mod keyshare;
pub mod personal;
pub mod scalable;
pub mod shared;

/// AES-256 key size in bytes
pub const KEY_SIZE: usize = 32;
/// AES-GCM nonce size in bytes
pub const IV_SIZE: usize = 12;
/// AES-GCM authentication tag size in bytes
pub const TAG_SIZE: usize = 16;

pub use aead::{
    combine_buffers, decrypt_aes, decrypt_aes_with_aad, encrypt_aes, encrypt_aes_with_aad,
    generate_random_bytes, split_buffer, AeadCiphertext, SymmetricKey,
};
pub use compression::{CompressionInfo, CompressionPolicy};
pub use direct::{decrypt_direct, encrypt_direct};
pub use envelope::{EncryptionMethod, EncryptionResult, PayloadMetadata};
pub use error::{CryptoError, CryptoResult};
pub use exchange::{hkdf_derive, perform_key_exchange, KeyPair, PublicKey, SecretKey, SharedSecret};
pub use group::{
    add_group_member, create_group, decrypt_group, encrypt_group, remove_group_member,
    GroupEncryptionMetadata,
};
pub use keyshare::{GroupId, KeyShare, RecipientId};
pub use personal::{decrypt_personal, encrypt_personal};
pub use scalable::{ContextMethod, EncryptionContext, ScalableEncryption, ScalingConfig};
pub use shared::{MemberRecord, Permission, Permissions, SharedKeyManager, SignatureGroupMetadata};
