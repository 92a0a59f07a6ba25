//! AES-256-GCM primitives and buffer framing.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::{IV_SIZE, KEY_SIZE, TAG_SIZE};

/// A 256-bit symmetric key. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "symmetric key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Output of [`encrypt_aes`]: ciphertext with its IV and detached tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadCiphertext {
    pub encrypted: Vec<u8>,
    pub iv: [u8; IV_SIZE],
    pub auth_tag: [u8; TAG_SIZE],
}

impl AeadCiphertext {
    /// `iv ‖ authTag ‖ ciphertext`
    pub fn to_bytes(&self) -> Vec<u8> {
        combine_buffers(&[&self.iv[..], &self.auth_tag[..], &self.encrypted[..]])
    }

    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < IV_SIZE + TAG_SIZE {
            return Err(CryptoError::InvalidEnvelope(format!(
                "{} bytes is shorter than iv and tag ({})",
                bytes.len(),
                IV_SIZE + TAG_SIZE
            )));
        }
        let parts = split_buffer(
            bytes,
            &[IV_SIZE, TAG_SIZE, bytes.len() - IV_SIZE - TAG_SIZE],
        )?;
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(parts[0]);
        let mut auth_tag = [0u8; TAG_SIZE];
        auth_tag.copy_from_slice(parts[1]);
        Ok(Self {
            encrypted: parts[2].to_vec(),
            iv,
            auth_tag,
        })
    }
}

/// `n` bytes from the thread-local CSPRNG.
pub fn generate_random_bytes(n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut out);
    out
}

pub fn encrypt_aes(plaintext: &[u8], key: &SymmetricKey) -> CryptoResult<AeadCiphertext> {
    encrypt_aes_with_aad(plaintext, key, &[])
}

/// Encrypt with a fresh random 96-bit IV, binding `aad`.
pub fn encrypt_aes_with_aad(
    plaintext: &[u8],
    key: &SymmetricKey,
    aad: &[u8],
) -> CryptoResult<AeadCiphertext> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), aad, &mut buffer)
        .map_err(|e| CryptoError::InvalidEnvelope(format!("encryption failed: {e}")))?;

    let mut auth_tag = [0u8; TAG_SIZE];
    auth_tag.copy_from_slice(&tag);
    Ok(AeadCiphertext {
        encrypted: buffer,
        iv,
        auth_tag,
    })
}

pub fn decrypt_aes(
    ciphertext: &[u8],
    key: &SymmetricKey,
    iv: &[u8],
    auth_tag: &[u8],
) -> CryptoResult<Vec<u8>> {
    decrypt_aes_with_aad(ciphertext, key, iv, auth_tag, &[])
}

/// Decrypt and verify. On failure no plaintext is returned.
pub fn decrypt_aes_with_aad(
    ciphertext: &[u8],
    key: &SymmetricKey,
    iv: &[u8],
    auth_tag: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    if iv.len() != IV_SIZE {
        return Err(CryptoError::InvalidEnvelope(format!(
            "IV must be {IV_SIZE} bytes, got {}",
            iv.len()
        )));
    }
    if auth_tag.len() != TAG_SIZE {
        return Err(CryptoError::InvalidEnvelope(format!(
            "auth tag must be {TAG_SIZE} bytes, got {}",
            auth_tag.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let mut buffer = ciphertext.to_vec();
    if cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(iv),
            aad,
            &mut buffer,
            Tag::from_slice(auth_tag),
        )
        .is_err()
    {
        buffer.zeroize();
        return Err(CryptoError::AuthenticationFailed);
    }
    Ok(buffer)
}

/// Open an `iv ‖ authTag ‖ ciphertext` envelope.
pub fn open_envelope(envelope: &[u8], key: &SymmetricKey, aad: &[u8]) -> CryptoResult<Vec<u8>> {
    let sealed = AeadCiphertext::from_bytes(envelope)?;
    decrypt_aes_with_aad(&sealed.encrypted, key, &sealed.iv, &sealed.auth_tag, aad)
}

/// Seal into an `iv ‖ authTag ‖ ciphertext` envelope.
pub fn seal_envelope(plaintext: &[u8], key: &SymmetricKey, aad: &[u8]) -> CryptoResult<Vec<u8>> {
    Ok(encrypt_aes_with_aad(plaintext, key, aad)?.to_bytes())
}

pub fn combine_buffers(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// Split `buffer` into consecutive slices of the given lengths. The lengths
/// must add up to the buffer length exactly.
pub fn split_buffer<'a>(buffer: &'a [u8], lengths: &[usize]) -> CryptoResult<Vec<&'a [u8]>> {
    let expected: usize = lengths.iter().sum();
    if expected != buffer.len() {
        return Err(CryptoError::SplitMismatch {
            expected,
            actual: buffer.len(),
        });
    }
    let mut parts = Vec::with_capacity(lengths.len());
    let mut offset = 0;
    for &len in lengths {
        parts.push(&buffer[offset..offset + len]);
        offset += len;
    }
    Ok(parts)
}
