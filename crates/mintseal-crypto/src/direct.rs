//! Direct encryption between two key pairs via X25519.

use crate::aead::{open_envelope, seal_envelope, SymmetricKey};
use crate::compression::{bind_compression, restore, CompressionInfo, CompressionPolicy};
use crate::envelope::{metadata_mismatch, now_secs, EncryptionMethod, EncryptionResult, PayloadMetadata};
use crate::error::CryptoResult;
use crate::exchange::{perform_key_exchange, KeyPair, PublicKey, SecretKey, DIRECT_DOMAIN};

fn direct_key(local: &SecretKey, remote: &PublicKey) -> CryptoResult<SymmetricKey> {
    perform_key_exchange(local, remote)?.derive_key(DIRECT_DOMAIN)
}

/// Both public keys, sender first, then the compression record.
fn direct_aad(
    sender: &PublicKey,
    recipient: &PublicKey,
    compression: Option<&CompressionInfo>,
) -> Vec<u8> {
    let mut aad = Vec::with_capacity(64 + 1);
    aad.extend_from_slice(sender.as_bytes());
    aad.extend_from_slice(recipient.as_bytes());
    bind_compression(aad, compression)
}

pub fn encrypt_direct(
    plaintext: &[u8],
    sender: &KeyPair,
    recipient: &PublicKey,
    compression: &CompressionPolicy,
) -> CryptoResult<EncryptionResult> {
    let key = direct_key(&sender.secret_key, recipient)?;
    let (body, compression) = compression.apply(plaintext)?;
    let aad = direct_aad(&sender.public_key, recipient, compression.as_ref());
    let envelope = seal_envelope(&body, &key, &aad)?;
    tracing::debug!(%recipient, size = plaintext.len(), "direct encrypt");
    Ok(EncryptionResult::new(
        &envelope,
        EncryptionMethod::Direct,
        PayloadMetadata::Direct {
            sender_public_key: sender.public_key,
            recipient_public_key: *recipient,
            timestamp: now_secs(),
            compression,
        },
    ))
}

/// Open a direct payload as either its recipient or its sender.
pub fn decrypt_direct(result: &EncryptionResult, local: &KeyPair) -> CryptoResult<Vec<u8>> {
    result.expect_method(EncryptionMethod::Direct)?;
    let PayloadMetadata::Direct {
        sender_public_key,
        recipient_public_key,
        compression,
        ..
    } = &result.metadata
    else {
        return Err(metadata_mismatch(result.method));
    };

    let remote = if local.public_key == *sender_public_key {
        recipient_public_key
    } else {
        sender_public_key
    };
    let key = direct_key(&local.secret_key, remote)?;
    let body = open_envelope(
        &result.envelope_bytes()?,
        &key,
        &direct_aad(sender_public_key, recipient_public_key, compression.as_ref()),
    )?;
    restore(body, compression.as_ref())
}
