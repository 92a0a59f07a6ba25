//! Group identifiers, per-recipient key shares and the group payload envelope.
//!
//! A master key is never stored in the clear. Each recipient gets a share:
//! the master key sealed under `HKDF(X25519(wrapper, recipient))`, bound to
//! the group id and the recipient's public key through AAD.
//!
//! Payload envelope: `groupId(32) ‖ iv(12) ‖ authTag(16) ‖ ciphertext`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use mintseal_core::{bytes_from_base58, bytes_to_base58};

use crate::aead::{open_envelope, seal_envelope, SymmetricKey};
use crate::compression::{bind_compression, CompressionInfo};
use crate::envelope::now_secs;
use crate::error::{CryptoError, CryptoResult};
use crate::exchange::{perform_key_exchange, KeyPair, PublicKey, KEY_SHARE_DOMAIN};
use crate::{IV_SIZE, TAG_SIZE};

pub const GROUP_ID_SIZE: usize = 32;

/// Content fingerprint of a group's name and initial member set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId([u8; GROUP_ID_SIZE]);

impl GroupId {
    /// `blake3(name ‖ 0x00 ‖ sorted, deduplicated public keys)`. Member order
    /// does not matter.
    pub fn derive(name: &str, members: &[PublicKey]) -> Self {
        let mut sorted = members.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut hasher = blake3::Hasher::new();
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
        for key in &sorted {
            hasher.update(key.as_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn from_bytes(bytes: [u8; GROUP_ID_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; GROUP_ID_SIZE] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bytes_to_base58(&self.0)
    }

    pub fn from_base58(text: &str) -> CryptoResult<Self> {
        let bytes = bytes_from_base58(text)?;
        let bytes: [u8; GROUP_ID_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidEnvelope(format!(
                "group id must be {GROUP_ID_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl std::fmt::Debug for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GroupId({})", self.to_base58())
    }
}

impl std::str::FromStr for GroupId {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl Serialize for GroupId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for GroupId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base58(&s).map_err(serde::de::Error::custom)
    }
}

/// Stable index of a member record inside a shared-key group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub u32);

impl std::fmt::Display for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyShare {
    pub recipient_public_key: PublicKey,
    /// Public half of the key pair that sealed this share.
    pub wrapped_by: PublicKey,
    /// base58 `iv ‖ authTag ‖ wrapped master key`
    pub encrypted_share: String,
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<RecipientId>,
}

fn share_aad(group_id: &GroupId, recipient: &PublicKey) -> [u8; 64] {
    let mut aad = [0u8; 64];
    aad[..32].copy_from_slice(group_id.as_bytes());
    aad[32..].copy_from_slice(recipient.as_bytes());
    aad
}

/// Seal `master` for `recipient` using the wrapper's secret key.
pub fn wrap_share(
    master: &SymmetricKey,
    group_id: &GroupId,
    wrapper: &KeyPair,
    recipient: &PublicKey,
) -> CryptoResult<KeyShare> {
    let kek = perform_key_exchange(&wrapper.secret_key, recipient)?.derive_key(KEY_SHARE_DOMAIN)?;
    let sealed = seal_envelope(master.as_bytes(), &kek, &share_aad(group_id, recipient))?;
    Ok(KeyShare {
        recipient_public_key: *recipient,
        wrapped_by: wrapper.public_key,
        encrypted_share: bytes_to_base58(&sealed),
        created_at: now_secs(),
        recipient_id: None,
    })
}

/// Recover the master key from a share addressed to `member`.
pub fn open_share(
    share: &KeyShare,
    group_id: &GroupId,
    member: &KeyPair,
) -> CryptoResult<SymmetricKey> {
    if share.recipient_public_key != member.public_key {
        return Err(CryptoError::MemberNotFound {
            recipient: member.public_key.to_base58(),
        });
    }
    let kek =
        perform_key_exchange(&member.secret_key, &share.wrapped_by)?.derive_key(KEY_SHARE_DOMAIN)?;
    let sealed = bytes_from_base58(&share.encrypted_share)?;
    let mut raw = open_envelope(&sealed, &kek, &share_aad(group_id, &member.public_key))?;
    let key = SymmetricKey::from_slice(&raw);
    raw.zeroize();
    key
}

fn payload_aad(group_id: &GroupId, compression: Option<&CompressionInfo>) -> Vec<u8> {
    bind_compression(group_id.as_bytes().to_vec(), compression)
}

/// `groupId ‖ iv ‖ authTag ‖ ciphertext`, with the group id and the
/// compression record as AAD.
pub fn seal_group_payload(
    body: &[u8],
    master: &SymmetricKey,
    group_id: &GroupId,
    compression: Option<&CompressionInfo>,
) -> CryptoResult<Vec<u8>> {
    let sealed = seal_envelope(body, master, &payload_aad(group_id, compression))?;
    let mut out = Vec::with_capacity(GROUP_ID_SIZE + sealed.len());
    out.extend_from_slice(group_id.as_bytes());
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// The group id embedded at the front of a payload envelope.
pub fn peek_group_id(envelope: &[u8]) -> CryptoResult<GroupId> {
    if envelope.len() < GROUP_ID_SIZE + IV_SIZE + TAG_SIZE {
        return Err(CryptoError::InvalidEnvelope(format!(
            "group envelope of {} bytes is shorter than header ({})",
            envelope.len(),
            GROUP_ID_SIZE + IV_SIZE + TAG_SIZE
        )));
    }
    let mut id = [0u8; GROUP_ID_SIZE];
    id.copy_from_slice(&envelope[..GROUP_ID_SIZE]);
    Ok(GroupId(id))
}

/// Fail with `GroupMismatch` unless the envelope belongs to `expected`.
pub fn check_group_id(envelope: &[u8], expected: &GroupId) -> CryptoResult<()> {
    let found = peek_group_id(envelope)?;
    if found != *expected {
        return Err(CryptoError::GroupMismatch {
            expected: expected.to_base58(),
            found: found.to_base58(),
        });
    }
    Ok(())
}

pub fn open_group_payload(
    envelope: &[u8],
    master: &SymmetricKey,
    group_id: &GroupId,
    compression: Option<&CompressionInfo>,
) -> CryptoResult<Vec<u8>> {
    check_group_id(envelope, group_id)?;
    open_envelope(
        &envelope[GROUP_ID_SIZE..],
        master,
        &payload_aad(group_id, compression),
    )
}
