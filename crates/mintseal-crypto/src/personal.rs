//! Personal encryption: one key pair seals and opens.

use crate::aead::{open_envelope, seal_envelope};
use crate::compression::{bind_compression, restore, CompressionPolicy};
use crate::envelope::{metadata_mismatch, now_secs, EncryptionMethod, EncryptionResult, PayloadMetadata};
use crate::error::CryptoResult;
use crate::exchange::{KeyPair, PERSONAL_DOMAIN};

pub fn encrypt_personal(
    plaintext: &[u8],
    owner: &KeyPair,
    compression: &CompressionPolicy,
) -> CryptoResult<EncryptionResult> {
    let key = owner.secret_key.derive_symmetric_key(PERSONAL_DOMAIN)?;
    let (body, compression) = compression.apply(plaintext)?;
    let aad = bind_compression(owner.public_key.as_bytes().to_vec(), compression.as_ref());
    let envelope = seal_envelope(&body, &key, &aad)?;
    tracing::debug!(size = plaintext.len(), compressed = compression.is_some(), "personal encrypt");
    Ok(EncryptionResult::new(
        &envelope,
        EncryptionMethod::Personal,
        PayloadMetadata::Personal {
            public_key: owner.public_key,
            timestamp: now_secs(),
            compression,
        },
    ))
}

pub fn decrypt_personal(result: &EncryptionResult, owner: &KeyPair) -> CryptoResult<Vec<u8>> {
    result.expect_method(EncryptionMethod::Personal)?;
    let PayloadMetadata::Personal { compression, .. } = &result.metadata else {
        return Err(metadata_mismatch(result.method));
    };
    let key = owner.secret_key.derive_symmetric_key(PERSONAL_DOMAIN)?;
    let aad = bind_compression(owner.public_key.as_bytes().to_vec(), compression.as_ref());
    let body = open_envelope(&result.envelope_bytes()?, &key, &aad)?;
    restore(body, compression.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;

    #[test]
    fn roundtrip() {
        let owner = KeyPair::generate();
        let result = encrypt_personal(b"my notes", &owner, &CompressionPolicy::disabled()).unwrap();
        assert_eq!(result.method, EncryptionMethod::Personal);
        assert_eq!(decrypt_personal(&result, &owner).unwrap(), b"my notes");
    }

    #[test]
    fn other_key_fails() {
        let result =
            encrypt_personal(b"mine", &KeyPair::generate(), &CompressionPolicy::disabled()).unwrap();
        assert!(matches!(
            decrypt_personal(&result, &KeyPair::generate()),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn compressed_roundtrip() {
        let owner = KeyPair::generate();
        let policy = CompressionPolicy {
            enabled: true,
            level: 3,
            min_bytes: 16,
        };
        let data = b"abcdefgh".repeat(100);
        let result = encrypt_personal(&data, &owner, &policy).unwrap();
        assert!(result.metadata.compression().is_some());
        assert_eq!(decrypt_personal(&result, &owner).unwrap(), data);
    }

    #[test]
    fn compression_record_is_authenticated() {
        let owner = KeyPair::generate();
        let policy = CompressionPolicy {
            enabled: true,
            level: 3,
            min_bytes: 16,
        };
        let result = encrypt_personal(&b"abcdefgh".repeat(100), &owner, &policy).unwrap();

        let mut stripped = result.clone();
        if let PayloadMetadata::Personal { compression, .. } = &mut stripped.metadata {
            *compression = None;
        }
        assert!(matches!(
            decrypt_personal(&stripped, &owner),
            Err(CryptoError::AuthenticationFailed)
        ));

        let mut resized = result;
        if let PayloadMetadata::Personal {
            compression: Some(info),
            ..
        } = &mut resized.metadata
        {
            info.original_size += 1;
        }
        assert!(matches!(
            decrypt_personal(&resized, &owner),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn json_roundtrip() {
        let owner = KeyPair::generate();
        let result = encrypt_personal(b"x", &owner, &CompressionPolicy::disabled()).unwrap();
        let back = EncryptionResult::from_json(&result.to_json().unwrap()).unwrap();
        assert_eq!(back, result);
        assert_eq!(decrypt_personal(&back, &owner).unwrap(), b"x");
    }
}
