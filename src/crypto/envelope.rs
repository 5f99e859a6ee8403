//! The `ProtectedValue` authenticated-encryption envelope.
//!
//! Uses AES-256-GCM with:
//! - 256-bit key
//! - 96-bit (12 byte) nonce
//! - 128-bit authentication tag, appended to the ciphertext
//! - A fresh nonce for every encryption, including in-place updates
//!
//! The nonce, ciphertext, and algorithm tag are the wire format; they must
//! match across implementations for cross-compatibility.

use crate::codec::{
    deserialize_array_base64, deserialize_vec_base64, serialize_array_base64, serialize_vec_base64,
};
use crate::crypto::{CryptoError, DecryptFailure, Result};
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use zeroize::Zeroize;

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;

/// The authenticated cipher protecting an envelope.
///
/// Currently exactly one variant; the tag is part of the wire format so that
/// a future algorithm migration stays decodable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
    #[serde(rename = "AES-256-GCM")]
    Aes256Gcm,
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes256Gcm => write!(f, "AES-256-GCM"),
        }
    }
}

/// A 256-bit symmetric encryption key.
///
/// The key is zeroized on drop. An all-zero key is the sentinel for
/// "cleared key material" and is rejected by every envelope operation.
#[derive(Clone)]
pub struct EncryptionKey {
    key: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Create a key from raw bytes (use with caution).
    pub fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Create a key from a slice, rejecting wrong lengths.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let key: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                got: bytes.len(),
            })?;
        Ok(Self { key })
    }

    /// Get the raw key bytes (use sparingly).
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Whether this key holds the all-zero "cleared" sentinel.
    pub fn is_cleared(&self) -> bool {
        self.key.iter().all(|&b| b == 0)
    }

    /// Overwrite the key material with zeros in place.
    pub fn clear(&mut self) {
        self.key.zeroize();
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// An authenticated-encrypted container for a serializable value.
///
/// The payload type `T` is carried as a phantom so the envelope can thread
/// it through generic model code; only `create`/`decrypt`/`update` touch it.
///
/// Equality and hashing are defined over the content of the binary fields
/// plus the algorithm tag, never over the payload type or instance identity.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ProtectedValue<T> {
    #[serde(
        rename = "initializationVector",
        serialize_with = "serialize_array_base64::<_, NONCE_SIZE>",
        deserialize_with = "deserialize_array_base64::<_, NONCE_SIZE>"
    )]
    nonce: [u8; NONCE_SIZE],

    /// Ciphertext with the 16-byte authentication tag appended.
    #[serde(
        rename = "encryptedValue",
        serialize_with = "serialize_vec_base64",
        deserialize_with = "deserialize_vec_base64"
    )]
    ciphertext: Vec<u8>,

    #[serde(rename = "encryptionAlgorithm")]
    algorithm: EncryptionAlgorithm,

    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> ProtectedValue<T> {
    /// Encrypt `value` into a new envelope.
    ///
    /// Serializes the value to canonical JSON bytes, generates a fresh
    /// nonce, and encrypts. Fails without constructing anything if the key
    /// is cleared, serialization fails, or the cipher rejects the input.
    pub fn create(
        algorithm: EncryptionAlgorithm,
        key: &EncryptionKey,
        value: &T,
    ) -> Result<Self>
    where
        T: Serialize,
    {
        if key.is_cleared() {
            return Err(CryptoError::ClearedKey);
        }

        let plaintext = serde_json::to_vec(value)
            .map_err(|e| CryptoError::SerializationFailed(e.to_string()))?;

        let nonce = generate_nonce();
        let ciphertext = seal(algorithm, key, &nonce, &plaintext)?;

        Ok(Self {
            nonce,
            ciphertext,
            algorithm,
            _marker: PhantomData,
        })
    }

    /// Decrypt and deserialize the contained value.
    ///
    /// This is a pure read; the envelope is never mutated. Authentication
    /// failure and plaintext-decode failure are both surfaced as
    /// [`CryptoError::DecryptionFailed`] with the cause distinguished in
    /// the payload.
    pub fn decrypt(&self, key: &EncryptionKey) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if key.is_cleared() {
            return Err(CryptoError::ClearedKey);
        }

        let plaintext = open(self.algorithm, key, &self.nonce, &self.ciphertext)?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| CryptoError::DecryptionFailed(DecryptFailure::Payload(e.to_string())))
    }

    /// Re-encrypt the envelope with a new value.
    ///
    /// A fresh nonce is generated for every update; reusing a nonce under
    /// the same key would break GCM's authentication guarantee. The stored
    /// nonce/ciphertext pair is only overwritten after the cipher call
    /// succeeds, so a failed update leaves the envelope intact.
    pub fn update(&mut self, key: &EncryptionKey, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        if key.is_cleared() {
            return Err(CryptoError::ClearedKey);
        }

        let plaintext = serde_json::to_vec(value)
            .map_err(|e| CryptoError::SerializationFailed(e.to_string()))?;

        let nonce = generate_nonce();
        let ciphertext = seal(self.algorithm, key, &nonce, &plaintext)?;

        self.nonce = nonce;
        self.ciphertext = ciphertext;

        Ok(())
    }

    pub fn algorithm(&self) -> EncryptionAlgorithm {
        self.algorithm
    }

    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

impl<T> Clone for ProtectedValue<T> {
    fn clone(&self) -> Self {
        Self {
            nonce: self.nonce,
            ciphertext: self.ciphertext.clone(),
            algorithm: self.algorithm,
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for ProtectedValue<T> {
    fn eq(&self, other: &Self) -> bool {
        self.nonce == other.nonce
            && self.ciphertext == other.ciphertext
            && self.algorithm == other.algorithm
    }
}

impl<T> Eq for ProtectedValue<T> {}

impl<T> Hash for ProtectedValue<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nonce.hash(state);
        self.ciphertext.hash(state);
        self.algorithm.hash(state);
    }
}

impl<T> fmt::Debug for ProtectedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectedValue")
            .field("algorithm", &self.algorithm)
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

fn generate_nonce() -> [u8; NONCE_SIZE] {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    nonce.into()
}

fn seal(
    algorithm: EncryptionAlgorithm,
    key: &EncryptionKey,
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    match algorithm {
        EncryptionAlgorithm::Aes256Gcm => {
            let cipher = Aes256Gcm::new(key.as_bytes().into());
            cipher
                .encrypt(&Nonce::from(*nonce), plaintext)
                .map_err(|e| CryptoError::EncryptionFailed(format!("{}", e)))
        }
    }
}

fn open(
    algorithm: EncryptionAlgorithm,
    key: &EncryptionKey,
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    match algorithm {
        EncryptionAlgorithm::Aes256Gcm => {
            let cipher = Aes256Gcm::new(key.as_bytes().into());
            cipher
                .decrypt(&Nonce::from(*nonce), ciphertext)
                .map_err(|_| CryptoError::DecryptionFailed(DecryptFailure::Authentication))
        }
    }
}
