//! Encryption contexts that start with per-recipient direct encryption and
//! move to a shared key once the recipient list grows past a threshold.
//!
//! The transition is evaluated lazily at the next `add_recipient` or
//! `encrypt` call and never reverses.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use mintseal_core::config::CryptoConfig;

use crate::compression::CompressionPolicy;
use crate::direct::{decrypt_direct, encrypt_direct};
use crate::envelope::{now_secs, EncryptionMethod, EncryptionResult};
use crate::error::{CryptoError, CryptoResult};
use crate::exchange::{KeyPair, PublicKey};
use crate::keyshare::GroupId;
use crate::personal::decrypt_personal;
use crate::shared::{Permission, Permissions, SharedKeyManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingConfig {
    /// Recipient count at which a direct context becomes a group context.
    pub auto_transition_threshold: usize,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self::from_config(&CryptoConfig::default())
    }
}

impl ScalingConfig {
    pub fn from_config(config: &CryptoConfig) -> Self {
        Self {
            auto_transition_threshold: config.auto_transition_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextMethod {
    Direct,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionContext {
    pub context_id: String,
    pub owner: PublicKey,
    /// Insertion-ordered, no duplicates.
    pub recipients: Vec<PublicKey>,
    pub method: ContextMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_key_id: Option<GroupId>,
    pub scaling_config: ScalingConfig,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub created_at: u64,
}

impl EncryptionContext {
    pub fn is_party(&self, key: &PublicKey) -> bool {
        self.owner == *key || self.recipients.contains(key)
    }

    /// Direct-mode targets for `sender`: every recipient, plus the owner
    /// unless the owner is sending.
    pub fn direct_targets(&self, sender: &PublicKey) -> Vec<PublicKey> {
        let mut targets = self.recipients.clone();
        if self.owner != *sender && !targets.contains(&self.owner) {
            targets.push(self.owner);
        }
        targets
    }

    fn should_transition(&self) -> bool {
        self.method == ContextMethod::Direct
            && self.recipients.len() >= self.scaling_config.auto_transition_threshold
    }
}

pub struct ScalableEncryption {
    manager: Arc<SharedKeyManager>,
    contexts: Mutex<HashMap<String, EncryptionContext>>,
    scaling: ScalingConfig,
    compression: CompressionPolicy,
}

impl std::fmt::Debug for ScalableEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let contexts = self
            .contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("ScalableEncryption")
            .field("contexts", &contexts)
            .field("scaling", &self.scaling)
            .finish()
    }
}

impl Default for ScalableEncryption {
    fn default() -> Self {
        Self::from_config(&CryptoConfig::default())
    }
}

impl ScalableEncryption {
    pub fn new(manager: Arc<SharedKeyManager>, scaling: ScalingConfig) -> Self {
        Self {
            manager,
            contexts: Mutex::new(HashMap::new()),
            scaling,
            compression: CompressionPolicy::default(),
        }
    }

    pub fn from_config(config: &CryptoConfig) -> Self {
        Self {
            manager: Arc::new(SharedKeyManager::from_config(config)),
            contexts: Mutex::new(HashMap::new()),
            scaling: ScalingConfig::from_config(config),
            compression: CompressionPolicy::from_config(config),
        }
    }

    pub fn manager(&self) -> &Arc<SharedKeyManager> {
        &self.manager
    }

    pub fn create_context(
        &self,
        owner: &PublicKey,
        recipients: &[PublicKey],
        metadata: BTreeMap<String, String>,
    ) -> EncryptionContext {
        let mut ordered = Vec::with_capacity(recipients.len());
        for r in recipients {
            if !ordered.contains(r) {
                ordered.push(*r);
            }
        }
        let context = EncryptionContext {
            context_id: uuid::Uuid::new_v4().to_string(),
            owner: *owner,
            recipients: ordered,
            method: ContextMethod::Direct,
            shared_key_id: None,
            scaling_config: self.scaling,
            metadata,
            created_at: now_secs(),
        };
        tracing::debug!(context_id = %context.context_id, recipients = context.recipients.len(), "context created");
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(context.context_id.clone(), context.clone());
        context
    }

    pub fn context(&self, context_id: &str) -> CryptoResult<EncryptionContext> {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(context_id)
            .cloned()
            .ok_or_else(|| CryptoError::ContextNotFound {
                context_id: context_id.to_string(),
            })
    }

    /// Add `recipient`, transitioning to a shared key when the threshold is
    /// reached. The authorizer must be the owner or a recipient.
    pub fn add_recipient(
        &self,
        context_id: &str,
        authorizer: &KeyPair,
        recipient: &PublicKey,
    ) -> CryptoResult<EncryptionContext> {
        let mut contexts = self.contexts.lock().unwrap_or_else(PoisonError::into_inner);
        let context = contexts
            .get_mut(context_id)
            .ok_or_else(|| CryptoError::ContextNotFound {
                context_id: context_id.to_string(),
            })?;
        authorize_party(context, &authorizer.public_key, Permission::Share)?;
        if context.recipients.contains(recipient) {
            return Ok(context.clone());
        }

        if let (ContextMethod::Group, Some(group_id)) = (context.method, context.shared_key_id) {
            self.manager
                .add_member(&group_id, authorizer, recipient, Permissions::default())?;
        }
        context.recipients.push(*recipient);
        self.maybe_transition(context, authorizer)?;
        Ok(context.clone())
    }

    /// Direct contexts yield one result per target (see
    /// [`EncryptionContext::direct_targets`]); group contexts yield a single
    /// shared-key result.
    pub fn encrypt(
        &self,
        context_id: &str,
        plaintext: &[u8],
        sender: &KeyPair,
    ) -> CryptoResult<Vec<EncryptionResult>> {
        let mut contexts = self.contexts.lock().unwrap_or_else(PoisonError::into_inner);
        let context = contexts
            .get_mut(context_id)
            .ok_or_else(|| CryptoError::ContextNotFound {
                context_id: context_id.to_string(),
            })?;
        authorize_party(context, &sender.public_key, Permission::Encrypt)?;
        self.maybe_transition(context, sender)?;

        match (context.method, context.shared_key_id) {
            (ContextMethod::Group, Some(group_id)) => {
                Ok(vec![self.manager.encrypt(&group_id, plaintext, sender)?])
            }
            _ => context
                .direct_targets(&sender.public_key)
                .iter()
                .map(|r| encrypt_direct(plaintext, sender, r, &self.compression))
                .collect(),
        }
    }

    /// Open any result this context family produces.
    pub fn decrypt(&self, result: &EncryptionResult, local: &KeyPair) -> CryptoResult<Vec<u8>> {
        match result.method {
            EncryptionMethod::Direct => decrypt_direct(result, local),
            EncryptionMethod::SignatureGroup => self.manager.decrypt(result, local),
            EncryptionMethod::Personal => decrypt_personal(result, local),
            EncryptionMethod::Group => Err(CryptoError::InvalidMethod {
                expected: EncryptionMethod::SignatureGroup,
                found: EncryptionMethod::Group,
            }),
        }
    }

    fn maybe_transition(
        &self,
        context: &mut EncryptionContext,
        authorizer: &KeyPair,
    ) -> CryptoResult<()> {
        if !context.should_transition() {
            return Ok(());
        }

        let mut members: Vec<(PublicKey, Permissions)> = context
            .recipients
            .iter()
            .map(|r| (*r, Permissions::default()))
            .collect();
        for key in [context.owner, authorizer.public_key] {
            match members.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = Permissions::full(),
                None => members.push((key, Permissions::full())),
            }
        }

        let name = format!("context-{}", context.context_id);
        let group_id = self.manager.create_shared_key(&name, authorizer, &members)?;
        context.method = ContextMethod::Group;
        context.shared_key_id = Some(group_id);
        tracing::info!(context_id = %context.context_id, %group_id, recipients = context.recipients.len(), "context moved to shared key");
        Ok(())
    }
}

fn authorize_party(
    context: &EncryptionContext,
    who: &PublicKey,
    permission: Permission,
) -> CryptoResult<()> {
    if context.is_party(who) {
        return Ok(());
    }
    tracing::warn!(context_id = %context.context_id, caller = %who, "caller is not part of context");
    Err(CryptoError::PermissionDenied {
        member: who.to_base58(),
        permission: permission.as_str(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::PayloadMetadata;

    fn scalable(threshold: usize) -> ScalableEncryption {
        ScalableEncryption::new(
            Arc::new(SharedKeyManager::new()),
            ScalingConfig {
                auto_transition_threshold: threshold,
            },
        )
    }

    #[test]
    fn direct_below_threshold() {
        let enc = scalable(3);
        let owner = KeyPair::generate();
        let b = KeyPair::generate();
        let c = KeyPair::generate();
        let ctx = enc.create_context(&owner.public_key, &[b.public_key, c.public_key], BTreeMap::new());
        assert_eq!(ctx.method, ContextMethod::Direct);

        let results = enc.encrypt(&ctx.context_id, b"hello", &owner).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.method == EncryptionMethod::Direct));
        assert_eq!(enc.decrypt(&results[0], &b).unwrap(), b"hello");
        assert_eq!(enc.decrypt(&results[1], &c).unwrap(), b"hello");
    }

    #[test]
    fn recipient_sender_reaches_owner() {
        let enc = scalable(3);
        let owner = KeyPair::generate();
        let b = KeyPair::generate();
        let c = KeyPair::generate();
        let ctx = enc.create_context(&owner.public_key, &[b.public_key, c.public_key], BTreeMap::new());

        let results = enc.encrypt(&ctx.context_id, b"reply", &b).unwrap();
        assert_eq!(results.len(), 3);
        let for_owner: Vec<_> = results
            .iter()
            .filter(|r| {
                matches!(
                    &r.metadata,
                    PayloadMetadata::Direct { recipient_public_key, .. }
                        if *recipient_public_key == owner.public_key
                )
            })
            .collect();
        assert_eq!(for_owner.len(), 1);
        assert_eq!(enc.decrypt(for_owner[0], &owner).unwrap(), b"reply");
        assert_eq!(ctx.direct_targets(&owner.public_key), vec![b.public_key, c.public_key]);
    }

    #[test]
    fn transitions_at_threshold() {
        let enc = scalable(3);
        let owner = KeyPair::generate();
        let r1 = KeyPair::generate();
        let r2 = KeyPair::generate();
        let r3 = KeyPair::generate();
        let ctx = enc.create_context(&owner.public_key, &[r1.public_key], BTreeMap::new());

        let ctx = enc.add_recipient(&ctx.context_id, &owner, &r2.public_key).unwrap();
        assert_eq!(ctx.method, ContextMethod::Direct);
        assert!(ctx.shared_key_id.is_none());

        let ctx = enc.add_recipient(&ctx.context_id, &owner, &r3.public_key).unwrap();
        assert_eq!(ctx.method, ContextMethod::Group);
        let group_id = ctx.shared_key_id.unwrap();

        let results = enc.encrypt(&ctx.context_id, b"scaled", &owner).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].method, EncryptionMethod::SignatureGroup);
        assert_eq!(enc.decrypt(&results[0], &r1).unwrap(), b"scaled");
        assert_eq!(enc.decrypt(&results[0], &r3).unwrap(), b"scaled");

        let meta = enc.manager().metadata(&group_id).unwrap();
        assert_eq!(meta.member(&owner.public_key).unwrap().permissions, Permissions::full());
        assert_eq!(
            meta.member(&r1.public_key).unwrap().permissions,
            Permissions::default()
        );
    }

    #[test]
    fn lazy_transition_at_encrypt() {
        let enc = scalable(2);
        let owner = KeyPair::generate();
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let ctx = enc.create_context(&owner.public_key, &[a.public_key, b.public_key], BTreeMap::new());
        assert_eq!(ctx.method, ContextMethod::Direct);

        let results = enc.encrypt(&ctx.context_id, b"x", &owner).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(enc.context(&ctx.context_id).unwrap().method, ContextMethod::Group);
    }

    #[test]
    fn group_context_adds_members_to_shared_key() {
        let enc = scalable(1);
        let owner = KeyPair::generate();
        let a = KeyPair::generate();
        let late = KeyPair::generate();
        let ctx = enc.create_context(&owner.public_key, &[a.public_key], BTreeMap::new());
        enc.encrypt(&ctx.context_id, b"warmup", &owner).unwrap();

        let ctx = enc.add_recipient(&ctx.context_id, &owner, &late.public_key).unwrap();
        assert_eq!(ctx.method, ContextMethod::Group);
        let results = enc.encrypt(&ctx.context_id, b"for everyone", &a).unwrap();
        assert_eq!(enc.decrypt(&results[0], &late).unwrap(), b"for everyone");
    }

    #[test]
    fn outsiders_are_rejected() {
        let enc = scalable(10);
        let owner = KeyPair::generate();
        let outsider = KeyPair::generate();
        let ctx = enc.create_context(&owner.public_key, &[], BTreeMap::new());
        assert!(matches!(
            enc.add_recipient(&ctx.context_id, &outsider, &outsider.public_key),
            Err(CryptoError::PermissionDenied { .. })
        ));
        assert!(matches!(
            enc.encrypt(&ctx.context_id, b"x", &outsider),
            Err(CryptoError::PermissionDenied { .. })
        ));
        assert!(matches!(
            enc.context("missing"),
            Err(CryptoError::ContextNotFound { .. })
        ));
    }

    #[test]
    fn recipients_stay_unique() {
        let enc = scalable(10);
        let owner = KeyPair::generate();
        let a = KeyPair::generate();
        let ctx = enc.create_context(&owner.public_key, &[a.public_key, a.public_key], BTreeMap::new());
        assert_eq!(ctx.recipients.len(), 1);
        let ctx = enc.add_recipient(&ctx.context_id, &owner, &a.public_key).unwrap();
        assert_eq!(ctx.recipients, vec![a.public_key]);
    }

    #[test]
    fn context_serializes_camel_case() {
        let enc = scalable(10);
        let owner = KeyPair::generate();
        let mut meta = BTreeMap::new();
        meta.insert("topic".to_string(), "payroll".to_string());
        let ctx = enc.create_context(&owner.public_key, &[], meta);
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("contextId"));
        assert!(json.contains("autoTransitionThreshold"));
        assert!(!json.contains("sharedKeyId"));
        let back: EncryptionContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }
}
