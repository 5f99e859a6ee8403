//! Cryptographic model types for the password manager core.
//!
//! This module provides:
//! - The `ProtectedValue` authenticated-encryption envelope (AES-256-GCM)
//! - Key-derivation metadata and the key-derivation capability seam
//! - Zeroization utilities for key and password material

pub mod envelope;
pub mod kdf;
pub mod zero;

pub use envelope::{EncryptionAlgorithm, EncryptionKey, ProtectedValue};
pub use kdf::{KeyDerivation, KeyDerivationInformation};
pub use zero::{zeroize_bytes, MasterPassword};

use thiserror::Error;

/// Errors that can occur in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The supplied key is the all-zero "cleared key material" sentinel.
    #[error("Encryption key has been cleared")]
    ClearedKey,

    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(DecryptFailure),

    #[error("Key derivation failed: {0}")]
    KdfFailed(String),
}

/// The cause carried by [`CryptoError::DecryptionFailed`].
///
/// Callers treat both causes as non-recoverable for that ciphertext; the
/// distinction exists for diagnostics only.
#[derive(Error, Debug)]
pub enum DecryptFailure {
    /// Authentication tag did not verify: wrong key, tampering, or corruption.
    #[error("ciphertext authentication failed")]
    Authentication,

    /// Decryption succeeded but the plaintext is not valid for the target type.
    #[error("plaintext not valid for the target type: {0}")]
    Payload(String),
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
