//! Static groups: a master key shared through per-member key shares.
//!
//! The metadata is the whole state; callers persist it. Any member holding a
//! valid share may add or remove members. Removing a member only drops their
//! share and never rotates the key. Use
//! [`SharedKeyManager`](crate::shared::SharedKeyManager) when removed members
//! must lose access to new data.

use serde::{Deserialize, Serialize};

use crate::aead::SymmetricKey;
use crate::compression::{restore, CompressionPolicy};
use crate::envelope::{metadata_mismatch, now_secs, EncryptionMethod, EncryptionResult, PayloadMetadata};
use crate::error::{CryptoError, CryptoResult};
use crate::exchange::{KeyPair, PublicKey};
use crate::keyshare::{
    check_group_id, open_group_payload, open_share, seal_group_payload, wrap_share, GroupId,
    KeyShare,
};

/// Static groups never rotate, so every payload uses the first key.
pub const STATIC_KEY_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEncryptionMetadata {
    pub group_id: GroupId,
    pub name: String,
    pub key_shares: Vec<KeyShare>,
    pub creator_public_key: PublicKey,
    pub timestamp: u64,
    /// Bumped on every membership change.
    pub version: u64,
}

impl GroupEncryptionMetadata {
    pub fn share_for(&self, member: &PublicKey) -> Option<&KeyShare> {
        self.key_shares
            .iter()
            .find(|s| s.recipient_public_key == *member)
    }

    pub fn is_member(&self, member: &PublicKey) -> bool {
        self.share_for(member).is_some()
    }

    pub fn members(&self) -> impl Iterator<Item = &PublicKey> {
        self.key_shares.iter().map(|s| &s.recipient_public_key)
    }

    pub fn to_json(&self) -> CryptoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> CryptoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn unwrap_master(&self, member: &KeyPair) -> CryptoResult<SymmetricKey> {
        let share = self
            .share_for(&member.public_key)
            .ok_or_else(|| CryptoError::MemberNotFound {
                recipient: member.public_key.to_base58(),
            })?;
        open_share(share, &self.group_id, member)
    }
}

/// Create a group whose members are `members` plus the creator.
pub fn create_group(
    name: &str,
    creator: &KeyPair,
    members: &[PublicKey],
) -> CryptoResult<GroupEncryptionMetadata> {
    let mut recipients = vec![creator.public_key];
    for member in members {
        if !recipients.contains(member) {
            recipients.push(*member);
        }
    }

    let group_id = GroupId::derive(name, &recipients);
    let master = SymmetricKey::generate();
    let key_shares = recipients
        .iter()
        .map(|r| wrap_share(&master, &group_id, creator, r))
        .collect::<CryptoResult<Vec<_>>>()?;

    tracing::info!(%group_id, name, members = key_shares.len(), "static group created");
    Ok(GroupEncryptionMetadata {
        group_id,
        name: name.to_string(),
        key_shares,
        creator_public_key: creator.public_key,
        timestamp: now_secs(),
        version: 1,
    })
}

pub fn encrypt_group(
    plaintext: &[u8],
    metadata: &GroupEncryptionMetadata,
    sender: &KeyPair,
    compression: &CompressionPolicy,
) -> CryptoResult<EncryptionResult> {
    let master = metadata.unwrap_master(sender)?;
    let (body, compression) = compression.apply(plaintext)?;
    let envelope = seal_group_payload(&body, &master, &metadata.group_id, compression.as_ref())?;
    tracing::debug!(group_id = %metadata.group_id, size = plaintext.len(), "group encrypt");
    Ok(EncryptionResult::new(
        &envelope,
        EncryptionMethod::Group,
        PayloadMetadata::Group {
            group_id: metadata.group_id,
            key_version: STATIC_KEY_VERSION,
            sender_public_key: sender.public_key,
            timestamp: now_secs(),
            compression,
        },
    ))
}

pub fn decrypt_group(
    result: &EncryptionResult,
    metadata: &GroupEncryptionMetadata,
    member: &KeyPair,
) -> CryptoResult<Vec<u8>> {
    result.expect_method(EncryptionMethod::Group)?;
    let PayloadMetadata::Group { compression, .. } = &result.metadata else {
        return Err(metadata_mismatch(result.method));
    };
    let envelope = result.envelope_bytes()?;
    check_group_id(&envelope, &metadata.group_id)?;

    let master = metadata.unwrap_master(member)?;
    let body = open_group_payload(&envelope, &master, &metadata.group_id, compression.as_ref())?;
    restore(body, compression.as_ref())
}

/// Wrap a share for `new_member` using the authorizer's own share.
pub fn add_group_member(
    metadata: &mut GroupEncryptionMetadata,
    authorizer: &KeyPair,
    new_member: &PublicKey,
) -> CryptoResult<()> {
    if metadata.is_member(new_member) {
        return Err(CryptoError::MemberExists {
            recipient: new_member.to_base58(),
        });
    }
    let master = metadata.unwrap_master(authorizer)?;
    let share = wrap_share(&master, &metadata.group_id, authorizer, new_member)?;
    metadata.key_shares.push(share);
    metadata.version += 1;
    tracing::info!(group_id = %metadata.group_id, member = %new_member, version = metadata.version, "group member added");
    Ok(())
}

/// Drop a member's share on behalf of `authorizer`, who must open their own
/// share first. The master key is unchanged, so a copy of the old share
/// still opens every payload.
pub fn remove_group_member(
    metadata: &mut GroupEncryptionMetadata,
    authorizer: &KeyPair,
    member: &PublicKey,
) -> CryptoResult<()> {
    metadata.unwrap_master(authorizer)?;
    let before = metadata.key_shares.len();
    metadata
        .key_shares
        .retain(|s| s.recipient_public_key != *member);
    if metadata.key_shares.len() == before {
        return Err(CryptoError::MemberNotFound {
            recipient: member.to_base58(),
        });
    }
    metadata.version += 1;
    tracing::info!(group_id = %metadata.group_id, %member, by = %authorizer.public_key, version = metadata.version, "group member removed without rotation");
    Ok(())
}
