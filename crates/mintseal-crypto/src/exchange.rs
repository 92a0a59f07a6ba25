//! X25519 key pairs, key exchange and HKDF key derivation.

use hkdf::Hkdf;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use x25519_dalek::StaticSecret;
use zeroize::Zeroize;

use mintseal_core::{bytes_from_base58, bytes_to_base58};

use crate::aead::SymmetricKey;
use crate::error::{CryptoError, CryptoResult};
use crate::KEY_SIZE;

/// HKDF info strings, one per purpose.
pub const PERSONAL_DOMAIN: &[u8] = b"mintseal-personal";
pub const DIRECT_DOMAIN: &[u8] = b"mintseal-direct";
pub const KEY_SHARE_DOMAIN: &[u8] = b"mintseal-keyshare";

/// An X25519 public key. Text form is base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; KEY_SIZE]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bytes_to_base58(&self.0)
    }

    pub fn from_base58(text: &str) -> CryptoResult<Self> {
        let bytes = bytes_from_base58(text)?;
        let bytes: [u8; KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "public key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    fn to_dalek(self) -> x25519_dalek::PublicKey {
        x25519_dalek::PublicKey::from(self.0)
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.to_base58())
    }
}

impl std::str::FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base58(&s).map_err(serde::de::Error::custom)
    }
}

/// An X25519 secret key. Zeroized on drop; `Debug` is redacted.
#[derive(Clone)]
pub struct SecretKey(StaticSecret);

impl SecretKey {
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(OsRng))
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    pub fn from_base58(text: &str) -> CryptoResult<Self> {
        let mut bytes = bytes_from_base58(text)?;
        let result = <[u8; KEY_SIZE]>::try_from(bytes.as_slice())
            .map(Self::from_bytes)
            .map_err(|_| {
                CryptoError::InvalidKey(format!(
                    "secret key must be {KEY_SIZE} bytes, got {}",
                    bytes.len()
                ))
            });
        bytes.zeroize();
        result
    }

    pub fn to_base58(&self) -> String {
        let mut bytes = self.0.to_bytes();
        let text = bytes_to_base58(&bytes);
        bytes.zeroize();
        text
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(x25519_dalek::PublicKey::from(&self.0).to_bytes())
    }

    /// Symmetric key for data only this secret can open.
    pub fn derive_symmetric_key(&self, domain: &[u8]) -> CryptoResult<SymmetricKey> {
        let mut bytes = self.0.to_bytes();
        let key = hkdf_derive(&bytes, domain);
        bytes.zeroize();
        key
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretKey").field(&"[REDACTED]").finish()
    }
}

impl Serialize for SecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut s = String::deserialize(deserializer)?;
        let key = Self::from_base58(&s).map_err(serde::de::Error::custom);
        s.zeroize();
        key
    }
}

/// A secret key with its public half.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub secret_key: SecretKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self::from_secret(SecretKey::generate())
    }

    pub fn from_secret(secret_key: SecretKey) -> Self {
        Self {
            public_key: secret_key.public_key(),
            secret_key,
        }
    }
}

/// Raw X25519 output. Zeroized on drop.
pub struct SharedSecret([u8; KEY_SIZE]);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Expand into a symmetric key for `domain`.
    pub fn derive_key(&self, domain: &[u8]) -> CryptoResult<SymmetricKey> {
        hkdf_derive(&self.0, domain)
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedSecret").field(&"[REDACTED]").finish()
    }
}

/// X25519 Diffie-Hellman. `exchange(a, B) == exchange(b, A)`.
///
/// Low-order remote keys produce an all-zero secret and are rejected.
pub fn perform_key_exchange(local: &SecretKey, remote: &PublicKey) -> CryptoResult<SharedSecret> {
    let shared = local.0.diffie_hellman(&remote.to_dalek());
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidKey(format!(
            "public key {remote} is a low-order point"
        )));
    }
    Ok(SharedSecret(shared.to_bytes()))
}

/// HKDF-SHA256 key derivation with a domain-specific info string.
pub fn hkdf_derive(ikm: &[u8; KEY_SIZE], info: &[u8]) -> CryptoResult<SymmetricKey> {
    let hkdf = Hkdf::<Sha256>::new(None, ikm);
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(info, &mut okm)
        .map_err(|e| CryptoError::InvalidKey(format!("HKDF expand failed: {e}")))?;
    Ok(SymmetricKey::from_bytes(okm))
}
