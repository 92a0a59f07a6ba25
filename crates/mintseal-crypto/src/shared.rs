//! Shared-key groups with per-member permissions and key rotation.
//!
//! Each group is a [`SignatureGroupMetadata`] record cached by group id. The
//! record keeps an arena of [`MemberRecord`]s keyed by [`RecipientId`]; key
//! shares point into it by id. Mutations of one group are serialized by that
//! group's lock, and every mutation bumps `version`.
//!
//! Rotation generates a new master key, rewraps a share for every remaining
//! member and re-seals all earlier master keys under the new one, so
//! remaining members can still open payloads from before the rotation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use mintseal_core::config::CryptoConfig;
use mintseal_core::{bytes_from_base58, bytes_to_base58};

use crate::aead::{open_envelope, seal_envelope, SymmetricKey};
use crate::compression::{restore, CompressionPolicy};
use crate::envelope::{metadata_mismatch, now_secs, EncryptionMethod, EncryptionResult, PayloadMetadata};
use crate::error::{CryptoError, CryptoResult};
use crate::exchange::{KeyPair, PublicKey};
use crate::keyshare::{
    check_group_id, open_group_payload, open_share, seal_group_payload, wrap_share, GroupId,
    KeyShare, RecipientId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_decrypt: bool,
    pub can_encrypt: bool,
    pub can_share: bool,
    pub can_revoke: bool,
}

/// Decrypt and encrypt, no membership management.
impl Default for Permissions {
    fn default() -> Self {
        Self {
            can_decrypt: true,
            can_encrypt: true,
            can_share: false,
            can_revoke: false,
        }
    }
}

impl Permissions {
    pub const fn full() -> Self {
        Self {
            can_decrypt: true,
            can_encrypt: true,
            can_share: true,
            can_revoke: true,
        }
    }

    pub const fn read_only() -> Self {
        Self {
            can_decrypt: true,
            can_encrypt: false,
            can_share: false,
            can_revoke: false,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Decrypt => self.can_decrypt,
            Permission::Encrypt => self.can_encrypt,
            Permission::Share => self.can_share,
            Permission::Revoke => self.can_revoke,
        }
    }

    /// Nobody can grant what they do not hold.
    pub fn capped_by(self, limit: Permissions) -> Self {
        Self {
            can_decrypt: self.can_decrypt && limit.can_decrypt,
            can_encrypt: self.can_encrypt && limit.can_encrypt,
            can_share: self.can_share && limit.can_share,
            can_revoke: self.can_revoke && limit.can_revoke,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Decrypt,
    Encrypt,
    Share,
    Revoke,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decrypt => "decrypt",
            Self::Encrypt => "encrypt",
            Self::Share => "share",
            Self::Revoke => "revoke",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: RecipientId,
    pub public_key: PublicKey,
    pub permissions: Permissions,
    pub added_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<RecipientId>,
}

/// An earlier master key sealed under the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedKey {
    pub key_version: u64,
    /// base58 `iv ‖ authTag ‖ key`
    pub sealed_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureGroupMetadata {
    pub group_id: GroupId,
    pub name: String,
    pub members: Vec<MemberRecord>,
    pub key_shares: Vec<KeyShare>,
    pub creator_public_key: PublicKey,
    pub timestamp: u64,
    /// Bumped on every mutation.
    pub version: u64,
    /// Bumped on every rotation.
    pub key_version: u64,
    #[serde(default)]
    pub previous_keys: Vec<ArchivedKey>,
    pub next_recipient_id: u32,
}

fn archive_aad(group_id: &GroupId, key_version: u64) -> [u8; 40] {
    let mut aad = [0u8; 40];
    aad[..32].copy_from_slice(group_id.as_bytes());
    aad[32..].copy_from_slice(&key_version.to_le_bytes());
    aad
}

impl SignatureGroupMetadata {
    pub fn member(&self, public_key: &PublicKey) -> Option<&MemberRecord> {
        self.members.iter().find(|m| m.public_key == *public_key)
    }

    pub fn is_member(&self, public_key: &PublicKey) -> bool {
        self.member(public_key).is_some()
    }

    pub fn share_for(&self, id: RecipientId) -> Option<&KeyShare> {
        self.key_shares.iter().find(|s| s.recipient_id == Some(id))
    }

    pub fn to_json(&self) -> CryptoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> CryptoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The caller's record, provided it holds `permission`.
    fn authorize(&self, who: &PublicKey, permission: Permission) -> CryptoResult<&MemberRecord> {
        let record = self.member(who).ok_or_else(|| CryptoError::MemberNotFound {
            recipient: who.to_base58(),
        })?;
        if !record.permissions.allows(permission) {
            tracing::warn!(group_id = %self.group_id, member = %who, permission = permission.as_str(), "operation not permitted");
            return Err(CryptoError::PermissionDenied {
                member: who.to_base58(),
                permission: permission.as_str(),
            });
        }
        Ok(record)
    }

    fn unwrap_master(&self, member: &KeyPair, id: RecipientId) -> CryptoResult<SymmetricKey> {
        let share = self.share_for(id).ok_or_else(|| CryptoError::MemberNotFound {
            recipient: member.public_key.to_base58(),
        })?;
        open_share(share, &self.group_id, member)
    }

    fn key_for_version(&self, master: SymmetricKey, key_version: u64) -> CryptoResult<SymmetricKey> {
        if key_version == self.key_version {
            return Ok(master);
        }
        let entry = self
            .previous_keys
            .iter()
            .find(|k| k.key_version == key_version)
            .ok_or(CryptoError::KeyVersionUnavailable {
                version: key_version,
            })?;
        open_archived(entry, &master, &self.group_id)
    }

    fn push_member(
        &mut self,
        public_key: PublicKey,
        permissions: Permissions,
        added_by: Option<RecipientId>,
        master: &SymmetricKey,
        wrapper: &KeyPair,
    ) -> CryptoResult<RecipientId> {
        let id = RecipientId(self.next_recipient_id);
        let mut share = wrap_share(master, &self.group_id, wrapper, &public_key)?;
        share.recipient_id = Some(id);
        self.next_recipient_id += 1;
        self.members.push(MemberRecord {
            id,
            public_key,
            permissions,
            added_at: now_secs(),
            added_by,
        });
        self.key_shares.push(share);
        Ok(id)
    }

    fn rotate(&mut self, authorizer: &KeyPair, current: &SymmetricKey) -> CryptoResult<()> {
        let next = SymmetricKey::generate();

        let mut archive = Vec::with_capacity(self.previous_keys.len() + 1);
        for entry in &self.previous_keys {
            let key = open_archived(entry, current, &self.group_id)?;
            archive.push(seal_archived(&key, entry.key_version, &next, &self.group_id)?);
        }
        archive.push(seal_archived(current, self.key_version, &next, &self.group_id)?);

        let mut shares = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let mut share = wrap_share(&next, &self.group_id, authorizer, &member.public_key)?;
            share.recipient_id = Some(member.id);
            shares.push(share);
        }

        self.previous_keys = archive;
        self.key_shares = shares;
        self.key_version += 1;
        self.version += 1;
        tracing::info!(group_id = %self.group_id, key_version = self.key_version, members = self.members.len(), "shared key rotated");
        Ok(())
    }
}

fn seal_archived(
    key: &SymmetricKey,
    key_version: u64,
    under: &SymmetricKey,
    group_id: &GroupId,
) -> CryptoResult<ArchivedKey> {
    let sealed = seal_envelope(key.as_bytes(), under, &archive_aad(group_id, key_version))?;
    Ok(ArchivedKey {
        key_version,
        sealed_key: bytes_to_base58(&sealed),
    })
}

fn open_archived(
    entry: &ArchivedKey,
    under: &SymmetricKey,
    group_id: &GroupId,
) -> CryptoResult<SymmetricKey> {
    let sealed = bytes_from_base58(&entry.sealed_key)?;
    let mut raw = open_envelope(&sealed, under, &archive_aad(group_id, entry.key_version))?;
    let key = SymmetricKey::from_slice(&raw);
    raw.zeroize();
    key
}

type GroupHandle = Arc<Mutex<SignatureGroupMetadata>>;

/// Cache of shared-key groups keyed by group id.
#[derive(Debug)]
pub struct SharedKeyManager {
    groups: Mutex<HashMap<GroupId, GroupHandle>>,
    rotate_on_remove: bool,
    compression: CompressionPolicy,
}

impl Default for SharedKeyManager {
    fn default() -> Self {
        Self::from_config(&CryptoConfig::default())
    }
}

impl SharedKeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CryptoConfig) -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
            rotate_on_remove: config.rotate_on_remove,
            compression: CompressionPolicy::from_config(config),
        }
    }

    pub fn with_compression(mut self, compression: CompressionPolicy) -> Self {
        self.compression = compression;
        self
    }

    fn group(&self, group_id: &GroupId) -> CryptoResult<GroupHandle> {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(group_id)
            .cloned()
            .ok_or_else(|| CryptoError::GroupNotFound {
                group_id: group_id.to_base58(),
            })
    }

    pub fn contains(&self, group_id: &GroupId) -> bool {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(group_id)
    }

    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self
            .groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Create a group for `creator` (full permissions) and `members`.
    ///
    /// Creating the same name and member set again returns the existing id.
    pub fn create_shared_key(
        &self,
        name: &str,
        creator: &KeyPair,
        members: &[(PublicKey, Permissions)],
    ) -> CryptoResult<GroupId> {
        let mut initial = vec![(creator.public_key, Permissions::full())];
        for (key, permissions) in members {
            if !initial.iter().any(|(k, _)| k == key) {
                initial.push((*key, *permissions));
            }
        }
        let keys: Vec<PublicKey> = initial.iter().map(|(k, _)| *k).collect();
        let group_id = GroupId::derive(name, &keys);

        let mut groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        if groups.contains_key(&group_id) {
            tracing::debug!(%group_id, "shared key already exists");
            return Ok(group_id);
        }

        let master = SymmetricKey::generate();
        let mut metadata = SignatureGroupMetadata {
            group_id,
            name: name.to_string(),
            members: Vec::with_capacity(initial.len()),
            key_shares: Vec::with_capacity(initial.len()),
            creator_public_key: creator.public_key,
            timestamp: now_secs(),
            version: 1,
            key_version: 1,
            previous_keys: Vec::new(),
            next_recipient_id: 0,
        };
        for (key, permissions) in initial {
            metadata.push_member(key, permissions, None, &master, creator)?;
        }

        tracing::info!(%group_id, name, members = metadata.members.len(), "shared key created");
        groups.insert(group_id, Arc::new(Mutex::new(metadata)));
        Ok(group_id)
    }

    pub fn encrypt(
        &self,
        group_id: &GroupId,
        plaintext: &[u8],
        sender: &KeyPair,
    ) -> CryptoResult<EncryptionResult> {
        let handle = self.group(group_id)?;
        let group = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let record = group.authorize(&sender.public_key, Permission::Encrypt)?;
        let master = group.unwrap_master(sender, record.id)?;

        let (body, compression) = self.compression.apply(plaintext)?;
        let envelope = seal_group_payload(&body, &master, group_id, compression.as_ref())?;
        tracing::debug!(%group_id, key_version = group.key_version, size = plaintext.len(), "shared key encrypt");
        Ok(EncryptionResult::new(
            &envelope,
            EncryptionMethod::SignatureGroup,
            PayloadMetadata::Group {
                group_id: *group_id,
                key_version: group.key_version,
                sender_public_key: sender.public_key,
                timestamp: now_secs(),
                compression,
            },
        ))
    }

    pub fn decrypt(&self, result: &EncryptionResult, member: &KeyPair) -> CryptoResult<Vec<u8>> {
        result.expect_method(EncryptionMethod::SignatureGroup)?;
        let PayloadMetadata::Group {
            group_id,
            key_version,
            compression,
            ..
        } = &result.metadata
        else {
            return Err(metadata_mismatch(result.method));
        };
        let envelope = result.envelope_bytes()?;
        check_group_id(&envelope, group_id)?;

        let handle = self.group(group_id)?;
        let group = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let record = group.authorize(&member.public_key, Permission::Decrypt)?;
        let master = group.unwrap_master(member, record.id)?;
        let key = group.key_for_version(master, *key_version)?;

        let body = open_group_payload(&envelope, &key, group_id, compression.as_ref())?;
        restore(body, compression.as_ref())
    }

    /// Wrap a share for `new_member`. Granted permissions are capped to the
    /// authorizer's own.
    pub fn add_member(
        &self,
        group_id: &GroupId,
        authorizer: &KeyPair,
        new_member: &PublicKey,
        permissions: Permissions,
    ) -> CryptoResult<RecipientId> {
        let handle = self.group(group_id)?;
        let mut group = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let record = group.authorize(&authorizer.public_key, Permission::Share)?;
        if group.is_member(new_member) {
            return Err(CryptoError::MemberExists {
                recipient: new_member.to_base58(),
            });
        }
        let (by, limit) = (record.id, record.permissions);
        let master = group.unwrap_master(authorizer, by)?;
        let id = group.push_member(
            *new_member,
            permissions.capped_by(limit),
            Some(by),
            &master,
            authorizer,
        )?;
        group.version += 1;
        tracing::info!(%group_id, member = %new_member, recipient_id = id.0, version = group.version, "member added");
        Ok(id)
    }

    /// Remove `member`. `rotate` defaults to the manager's configured policy;
    /// without rotation a retained copy of the old share keeps working.
    ///
    /// The group is left untouched unless removal and rotation both succeed.
    pub fn remove_member(
        &self,
        group_id: &GroupId,
        authorizer: &KeyPair,
        member: &PublicKey,
        rotate: Option<bool>,
    ) -> CryptoResult<()> {
        let handle = self.group(group_id)?;
        let mut group = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let by = group.authorize(&authorizer.public_key, Permission::Revoke)?.id;
        let removed = group
            .member(member)
            .map(|m| m.id)
            .ok_or_else(|| CryptoError::MemberNotFound {
                recipient: member.to_base58(),
            })?;
        let master = group.unwrap_master(authorizer, by)?;

        let mut next = group.clone();
        next.members.retain(|m| m.id != removed);
        next.key_shares.retain(|s| s.recipient_id != Some(removed));
        next.version += 1;

        let rotate = rotate.unwrap_or(self.rotate_on_remove);
        if rotate {
            next.rotate(authorizer, &master)?;
        }
        *group = next;
        tracing::info!(%group_id, %member, rotate, version = group.version, key_version = group.key_version, "member removed");
        Ok(())
    }

    /// Rotate without changing membership. Returns the new key version.
    pub fn rotate_keys(&self, group_id: &GroupId, authorizer: &KeyPair) -> CryptoResult<u64> {
        let handle = self.group(group_id)?;
        let mut group = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let by = group.authorize(&authorizer.public_key, Permission::Revoke)?.id;
        let master = group.unwrap_master(authorizer, by)?;
        group.rotate(authorizer, &master)?;
        Ok(group.key_version)
    }

    /// Replace a member's permissions, capped to the authorizer's own.
    pub fn update_permissions(
        &self,
        group_id: &GroupId,
        authorizer: &KeyPair,
        member: &PublicKey,
        permissions: Permissions,
    ) -> CryptoResult<Permissions> {
        let handle = self.group(group_id)?;
        let mut group = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let limit = group
            .authorize(&authorizer.public_key, Permission::Revoke)?
            .permissions;
        let granted = permissions.capped_by(limit);
        let record = group
            .members
            .iter_mut()
            .find(|m| m.public_key == *member)
            .ok_or_else(|| CryptoError::MemberNotFound {
                recipient: member.to_base58(),
            })?;
        record.permissions = granted;
        group.version += 1;
        tracing::info!(%group_id, %member, version = group.version, "permissions updated");
        Ok(granted)
    }

    pub fn metadata(&self, group_id: &GroupId) -> CryptoResult<SignatureGroupMetadata> {
        let handle = self.group(group_id)?;
        let group = handle.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(group.clone())
    }

    pub fn export_metadata(&self, group_id: &GroupId) -> CryptoResult<String> {
        self.metadata(group_id)?.to_json()
    }

    /// Load exported metadata. An already cached group is replaced only by a
    /// strictly newer version.
    pub fn import_metadata(&self, json: &str) -> CryptoResult<GroupId> {
        let imported = SignatureGroupMetadata::from_json(json)?;
        let group_id = imported.group_id;

        let mut groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = groups.get(&group_id) {
            let mut current = existing.lock().unwrap_or_else(PoisonError::into_inner);
            if imported.version <= current.version {
                return Err(CryptoError::StaleVersion {
                    group_id: group_id.to_base58(),
                    current: current.version,
                    imported: imported.version,
                });
            }
            tracing::info!(%group_id, from = current.version, to = imported.version, "shared key metadata replaced");
            *current = imported;
            return Ok(group_id);
        }

        tracing::info!(%group_id, version = imported.version, "shared key metadata imported");
        groups.insert(group_id, Arc::new(Mutex::new(imported)));
        Ok(group_id)
    }

    /// Forget a group. Returns whether it was cached.
    pub fn drop_group(&self, group_id: &GroupId) -> bool {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(group_id)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Team {
        manager: SharedKeyManager,
        id: GroupId,
        a: KeyPair,
        b: KeyPair,
        c: KeyPair,
    }

    fn team() -> Team {
        let manager = SharedKeyManager::new();
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let c = KeyPair::generate();
        let id = manager
            .create_shared_key(
                "ops",
                &a,
                &[
                    (b.public_key, Permissions::default()),
                    (c.public_key, Permissions::read_only()),
                ],
            )
            .unwrap();
        Team { manager, id, a, b, c }
    }

    #[test]
    fn members_roundtrip() {
        let t = team();
        let result = t.manager.encrypt(&t.id, b"deploy at noon", &t.b).unwrap();
        assert_eq!(result.method, EncryptionMethod::SignatureGroup);
        for member in [&t.a, &t.b, &t.c] {
            assert_eq!(t.manager.decrypt(&result, member).unwrap(), b"deploy at noon");
        }
        assert!(matches!(
            t.manager.decrypt(&result, &KeyPair::generate()),
            Err(CryptoError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn arena_ids_are_referenced_by_shares() {
        let t = team();
        let meta = t.manager.metadata(&t.id).unwrap();
        assert_eq!(meta.members.len(), 3);
        assert_eq!(meta.members[0].public_key, t.a.public_key);
        assert_eq!(meta.members[0].permissions, Permissions::full());
        for member in &meta.members {
            let share = meta.share_for(member.id).unwrap();
            assert_eq!(share.recipient_public_key, member.public_key);
        }
    }

    #[test]
    fn create_is_idempotent() {
        let t = team();
        let again = t
            .manager
            .create_shared_key(
                "ops",
                &t.a,
                &[
                    (t.c.public_key, Permissions::read_only()),
                    (t.b.public_key, Permissions::default()),
                ],
            )
            .unwrap();
        assert_eq!(again, t.id);
        assert_eq!(t.manager.group_ids(), vec![t.id]);
    }

    #[test]
    fn read_only_member_cannot_encrypt() {
        let t = team();
        assert!(matches!(
            t.manager.encrypt(&t.id, b"x", &t.c),
            Err(CryptoError::PermissionDenied {
                permission: "encrypt",
                ..
            })
        ));
    }

    #[test]
    fn sharing_requires_permission_and_caps_grants() {
        let t = team();
        let d = KeyPair::generate();
        assert!(matches!(
            t.manager
                .add_member(&t.id, &t.b, &d.public_key, Permissions::default()),
            Err(CryptoError::PermissionDenied {
                permission: "share",
                ..
            })
        ));

        t.manager
            .update_permissions(
                &t.id,
                &t.a,
                &t.b.public_key,
                Permissions {
                    can_share: true,
                    ..Permissions::default()
                },
            )
            .unwrap();
        let id = t
            .manager
            .add_member(&t.id, &t.b, &d.public_key, Permissions::full())
            .unwrap();

        let meta = t.manager.metadata(&t.id).unwrap();
        let record = meta.member(&d.public_key).unwrap();
        assert_eq!(record.id, id);
        assert!(record.permissions.can_share);
        assert!(!record.permissions.can_revoke);
        assert_eq!(record.added_by, meta.member(&t.b.public_key).map(|m| m.id));

        let result = t.manager.encrypt(&t.id, b"welcome", &t.a).unwrap();
        assert_eq!(t.manager.decrypt(&result, &d).unwrap(), b"welcome");
        assert!(matches!(
            t.manager
                .add_member(&t.id, &t.a, &d.public_key, Permissions::default()),
            Err(CryptoError::MemberExists { .. })
        ));
    }

    #[test]
    fn rotation_on_removal_locks_out_removed_member() {
        let t = team();
        let before = t.manager.encrypt(&t.id, b"before", &t.a).unwrap();
        let meta = t.manager.metadata(&t.id).unwrap();
        let c_id = meta.member(&t.c.public_key).unwrap().id;
        let old_share = meta.share_for(c_id).cloned().unwrap();

        t.manager
            .remove_member(&t.id, &t.a, &t.c.public_key, Some(true))
            .unwrap();
        let after = t.manager.encrypt(&t.id, b"after", &t.a).unwrap();

        let meta = t.manager.metadata(&t.id).unwrap();
        assert_eq!(meta.key_version, 2);
        assert_eq!(meta.previous_keys.len(), 1);
        assert!(!meta.is_member(&t.c.public_key));

        assert!(matches!(
            t.manager.decrypt(&after, &t.c),
            Err(CryptoError::MemberNotFound { .. })
        ));
        let old_master = open_share(&old_share, &t.id, &t.c).unwrap();
        let envelope = after.envelope_bytes().unwrap();
        assert!(matches!(
            open_group_payload(&envelope, &old_master, &t.id, None),
            Err(CryptoError::AuthenticationFailed)
        ));

        assert_eq!(t.manager.decrypt(&after, &t.b).unwrap(), b"after");
        assert_eq!(t.manager.decrypt(&before, &t.b).unwrap(), b"before");
    }

    #[test]
    fn removal_without_rotation_keeps_key() {
        let t = team();
        t.manager
            .remove_member(&t.id, &t.a, &t.c.public_key, Some(false))
            .unwrap();
        let meta = t.manager.metadata(&t.id).unwrap();
        assert_eq!(meta.key_version, 1);
        assert!(meta.previous_keys.is_empty());
        assert_eq!(meta.members.len(), 2);
    }

    #[test]
    fn removal_requires_revoke() {
        let t = team();
        assert!(matches!(
            t.manager.remove_member(&t.id, &t.b, &t.c.public_key, None),
            Err(CryptoError::PermissionDenied {
                permission: "revoke",
                ..
            })
        ));
        assert!(matches!(
            t.manager
                .remove_member(&t.id, &t.a, &KeyPair::generate().public_key, None),
            Err(CryptoError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn repeated_rotation_keeps_history() {
        let t = team();
        let v1 = t.manager.encrypt(&t.id, b"one", &t.a).unwrap();
        assert_eq!(t.manager.rotate_keys(&t.id, &t.a).unwrap(), 2);
        let v2 = t.manager.encrypt(&t.id, b"two", &t.b).unwrap();
        assert_eq!(t.manager.rotate_keys(&t.id, &t.a).unwrap(), 3);
        let v3 = t.manager.encrypt(&t.id, b"three", &t.b).unwrap();

        assert_eq!(t.manager.decrypt(&v1, &t.c).unwrap(), b"one");
        assert_eq!(t.manager.decrypt(&v2, &t.c).unwrap(), b"two");
        assert_eq!(t.manager.decrypt(&v3, &t.c).unwrap(), b"three");
        assert!(t.manager.rotate_keys(&t.id, &t.b).is_err());
    }

    #[test]
    fn unknown_key_version() {
        let t = team();
        let mut result = t.manager.encrypt(&t.id, b"x", &t.a).unwrap();
        if let PayloadMetadata::Group { key_version, .. } = &mut result.metadata {
            *key_version = 9;
        }
        assert!(matches!(
            t.manager.decrypt(&result, &t.a),
            Err(CryptoError::KeyVersionUnavailable { version: 9 })
        ));
    }

    #[test]
    fn metadata_group_mismatch() {
        let t = team();
        let mut result = t.manager.encrypt(&t.id, b"x", &t.a).unwrap();
        if let PayloadMetadata::Group { group_id, .. } = &mut result.metadata {
            *group_id = GroupId::from_bytes([9u8; 32]);
        }
        assert!(matches!(
            t.manager.decrypt(&result, &t.a),
            Err(CryptoError::GroupMismatch { .. })
        ));
    }

    #[test]
    fn unknown_group() {
        let manager = SharedKeyManager::new();
        let a = KeyPair::generate();
        assert!(matches!(
            manager.encrypt(&GroupId::from_bytes([1u8; 32]), b"x", &a),
            Err(CryptoError::GroupNotFound { .. })
        ));
    }

    #[test]
    fn export_import() {
        let t = team();
        let before = t.manager.encrypt(&t.id, b"persist me", &t.a).unwrap();
        let json = t.manager.export_metadata(&t.id).unwrap();

        let other = SharedKeyManager::new();
        assert_eq!(other.import_metadata(&json).unwrap(), t.id);
        assert_eq!(other.decrypt(&before, &t.b).unwrap(), b"persist me");

        assert!(matches!(
            other.import_metadata(&json),
            Err(CryptoError::StaleVersion { .. })
        ));

        t.manager.rotate_keys(&t.id, &t.a).unwrap();
        let newer = t.manager.export_metadata(&t.id).unwrap();
        other.import_metadata(&newer).unwrap();
        assert_eq!(other.metadata(&t.id).unwrap().key_version, 2);

        assert!(other.drop_group(&t.id));
        assert!(!other.contains(&t.id));
    }

    #[test]
    fn permission_capping() {
        let capped = Permissions::full().capped_by(Permissions::read_only());
        assert_eq!(capped, Permissions::read_only());
        assert_eq!(
            Permissions::default().capped_by(Permissions::full()),
            Permissions::default()
        );
    }

    #[test]
    fn failed_rotation_leaves_group_untouched() {
        let t = team();
        t.manager.rotate_keys(&t.id, &t.a).unwrap();
        let mut meta = t.manager.metadata(&t.id).unwrap();
        assert_eq!(meta.previous_keys.len(), 1);
        meta.previous_keys[0].sealed_key = bytes_to_base58(&[0u8; 60]);

        let damaged = SharedKeyManager::new();
        damaged.import_metadata(&meta.to_json().unwrap()).unwrap();
        assert!(matches!(
            damaged.remove_member(&t.id, &t.a, &t.c.public_key, Some(true)),
            Err(CryptoError::AuthenticationFailed)
        ));

        let after = damaged.metadata(&t.id).unwrap();
        assert_eq!(after, meta);
        assert_eq!(after.members.len(), 3);
        assert_eq!(after.version, meta.version);
        assert_eq!(after.key_version, 2);
        assert!(after.is_member(&t.c.public_key));
    }

    #[test]
    fn compression_record_is_authenticated() {
        let t = team();
        let manager = SharedKeyManager::new().with_compression(CompressionPolicy {
            enabled: true,
            level: 3,
            min_bytes: 16,
        });
        manager
            .import_metadata(&t.manager.export_metadata(&t.id).unwrap())
            .unwrap();
        let mut result = manager.encrypt(&t.id, &b"r".repeat(600), &t.a).unwrap();
        assert!(result.metadata.compression().is_some());
        if let PayloadMetadata::Group {
            compression: Some(info),
            ..
        } = &mut result.metadata
        {
            info.compressed_size += 1;
        }
        assert!(matches!(
            manager.decrypt(&result, &t.b),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn concurrent_rotations_are_serialized() {
        const THREADS: u64 = 8;
        let t = team();
        let first = t.manager.encrypt(&t.id, b"v1", &t.a).unwrap();

        let mut versions: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| scope.spawn(|| t.manager.rotate_keys(&t.id, &t.a).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        versions.sort_unstable();
        assert_eq!(versions, (2..=THREADS + 1).collect::<Vec<_>>());

        let meta = t.manager.metadata(&t.id).unwrap();
        assert_eq!(meta.key_version, THREADS + 1);
        assert_eq!(meta.version, THREADS + 1);
        assert_eq!(meta.previous_keys.len() as u64, THREADS);
        assert_eq!(t.manager.decrypt(&first, &t.c).unwrap(), b"v1");
    }

    #[test]
    fn concurrent_remove_and_rotate_account_for_every_update() {
        const ROTATIONS: u64 = 6;
        let t = team();

        std::thread::scope(|scope| {
            let rotations: Vec<_> = (0..ROTATIONS)
                .map(|_| scope.spawn(|| t.manager.rotate_keys(&t.id, &t.a).unwrap()))
                .collect();
            let removal = scope.spawn(|| {
                t.manager
                    .remove_member(&t.id, &t.a, &t.c.public_key, Some(true))
                    .unwrap()
            });
            for handle in rotations {
                handle.join().unwrap();
            }
            removal.join().unwrap();
        });

        let meta = t.manager.metadata(&t.id).unwrap();
        // Each rotation bumps both counters; removal adds one more version.
        assert_eq!(meta.key_version, 1 + ROTATIONS + 1);
        assert_eq!(meta.version, 1 + ROTATIONS + 2);
        assert_eq!(meta.members.len(), 2);
        assert_eq!(meta.key_shares.len(), 2);
        assert!(meta
            .key_shares
            .iter()
            .all(|s| s.recipient_public_key != t.c.public_key));

        let result = t.manager.encrypt(&t.id, b"after", &t.b).unwrap();
        assert_eq!(t.manager.decrypt(&result, &t.a).unwrap(), b"after");
        assert!(t.manager.decrypt(&result, &t.c).is_err());
    }
}
