//! Key-derivation metadata for master-password processing.
//!
//! The derivation function itself is a platform capability (hardware-backed
//! where available) consumed through the [`KeyDerivation`] trait; the core
//! only records and transports the parameters needed to re-derive the key.

use crate::codec::{deserialize_vec_base64, serialize_vec_base64};
use crate::crypto::{zero::MasterPassword, CryptoError, EncryptionKey, Result};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

const SALT_SIZE: usize = 32;

/// The salt and iteration count used to derive a key from a password.
///
/// Created once per password-setting event and persisted alongside the user
/// record; never mutated, only replaced wholesale when the master password
/// changes. Equality and hashing are by content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyDerivationInformation {
    #[serde(
        serialize_with = "serialize_vec_base64",
        deserialize_with = "deserialize_vec_base64"
    )]
    salt: Vec<u8>,

    #[serde(rename = "iterationCount")]
    iteration_count: u32,
}

impl KeyDerivationInformation {
    /// Create derivation metadata from existing parameters.
    ///
    /// Rejects an empty salt or a zero iteration count.
    pub fn new(salt: Vec<u8>, iteration_count: u32) -> Result<Self> {
        if salt.is_empty() {
            return Err(CryptoError::KdfFailed("Salt must not be empty".to_string()));
        }
        if iteration_count == 0 {
            return Err(CryptoError::KdfFailed(
                "Iteration count must be positive".to_string(),
            ));
        }

        Ok(Self {
            salt,
            iteration_count,
        })
    }

    /// Generate fresh metadata with a random 32-byte salt.
    pub fn generate(iteration_count: u32) -> Result<Self> {
        let mut salt = vec![0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);

        Self::new(salt, iteration_count)
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }
}

/// Password-based key derivation, consumed as an opaque capability.
///
/// Implementations turn a master password and its stored derivation
/// parameters into a symmetric encryption key. The host environment decides
/// the algorithm; the core only threads the parameters through.
pub trait KeyDerivation {
    fn derive_key(
        &self,
        password: &MasterPassword,
        information: &KeyDerivationInformation,
    ) -> Result<EncryptionKey>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_degenerate_parameters() {
        assert!(KeyDerivationInformation::new(vec![], 100_000).is_err());
        assert!(KeyDerivationInformation::new(vec![1, 2, 3], 0).is_err());
        assert!(KeyDerivationInformation::new(vec![1, 2, 3], 1).is_ok());
    }

    #[test]
    fn generate_produces_distinct_salts() {
        let a = KeyDerivationInformation::generate(100_000).unwrap();
        let b = KeyDerivationInformation::generate(100_000).unwrap();

        assert_eq!(a.salt().len(), 32);
        assert_ne!(a.salt(), b.salt());
        assert_eq!(a.iteration_count(), 100_000);
    }

    #[test]
    fn equality_is_by_content() {
        let a = KeyDerivationInformation::new(vec![1, 2, 3], 1000).unwrap();
        let b = KeyDerivationInformation::new(vec![1, 2, 3], 1000).unwrap();
        let c = KeyDerivationInformation::new(vec![1, 2, 3], 1001).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn wire_format_roundtrip() {
        let info = KeyDerivationInformation::new(vec![1, 2, 3], 250_000).unwrap();

        let json = serde_json::to_value(&info).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.get("salt").unwrap().as_str().unwrap(), "AQID");
        assert_eq!(obj.get("iterationCount").unwrap().as_i64().unwrap(), 250_000);

        let roundtripped: KeyDerivationInformation = serde_json::from_value(json).unwrap();
        assert_eq!(roundtripped, info);
    }

    #[test]
    fn derivation_seam_is_usable() {
        // A deterministic stand-in; production implementations live with the
        // platform glue, not in the core.
        struct DigestKdf;

        impl KeyDerivation for DigestKdf {
            fn derive_key(
                &self,
                password: &MasterPassword,
                information: &KeyDerivationInformation,
            ) -> Result<EncryptionKey> {
                let mut key = [0u8; 32];
                let material: Vec<u8> = password
                    .as_bytes()
                    .iter()
                    .chain(information.salt())
                    .copied()
                    .collect();
                for (i, byte) in material.iter().enumerate() {
                    key[i % 32] ^= byte.wrapping_mul((information.iteration_count() % 251) as u8);
                }
                Ok(EncryptionKey::from_bytes(key))
            }
        }

        let password = MasterPassword::from("correct horse battery staple");
        let info = KeyDerivationInformation::generate(100_000).unwrap();

        let key1 = DigestKdf.derive_key(&password, &info).unwrap();
        let key2 = DigestKdf.derive_key(&password, &info).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());

        let other_info = KeyDerivationInformation::generate(100_000).unwrap();
        let key3 = DigestKdf.derive_key(&password, &other_info).unwrap();
        assert_ne!(key1.as_bytes(), key3.as_bytes());
    }
}
