//! Synchronizable entity models: users, vault items, and their payloads.
//!
//! Sensitive fields are `ProtectedValue`-wrapped and stay opaque ciphertext
//! to the merge logic. Timestamps are epoch milliseconds supplied by the
//! caller's clock.

use crate::codec::{deserialize_vec_base64, serialize_vec_base64};
use crate::crypto::{
    EncryptionAlgorithm, EncryptionKey, KeyDerivation, KeyDerivationInformation, MasterPassword,
    ProtectedValue, Result,
};
use crate::sync::differentiation::Synchronizable;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw symmetric key material, transported only inside a protected envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptographicKey {
    #[serde(
        serialize_with = "serialize_vec_base64",
        deserialize_with = "deserialize_vec_base64"
    )]
    pub key: Vec<u8>,
}

impl CryptographicKey {
    /// Generate fresh 256-bit key material.
    pub fn generate() -> Self {
        Self {
            key: EncryptionKey::generate().as_bytes().to_vec(),
        }
    }

    pub fn as_encryption_key(&self) -> Result<EncryptionKey> {
        EncryptionKey::from_slice(&self.key)
    }
}

/// User preferences, stored encrypted with the master key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Seconds of inactivity before the vault locks itself.
    pub automatic_lock_timeout: u32,
    pub hide_passwords: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            automatic_lock_timeout: 60,
            hide_passwords: true,
        }
    }
}

/// Decrypted contents of a vault item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemData {
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: Option<String>,
    pub notes: Option<String>,
}

/// A vault user.
///
/// The master encryption key is wrapped with the password-derived key; the
/// settings are wrapped with the master encryption key. Changing the master
/// password replaces the derivation information wholesale and re-wraps the
/// master key, leaving every item envelope untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub master_key_derivation_information: KeyDerivationInformation,
    pub master_encryption_key: ProtectedValue<CryptographicKey>,
    pub settings: ProtectedValue<UserSettings>,
    pub deleted: bool,
    pub modified: i64,
    pub created: i64,
}

impl User {
    /// Create a new user from a master password.
    pub fn create(
        username: impl Into<String>,
        kdf: &dyn KeyDerivation,
        master_password: &MasterPassword,
        iteration_count: u32,
        now: i64,
    ) -> Result<Self> {
        let information = KeyDerivationInformation::generate(iteration_count)?;
        let derived_key = kdf.derive_key(master_password, &information)?;

        let master_key = CryptographicKey::generate();
        let protected_master_key =
            ProtectedValue::create(EncryptionAlgorithm::Aes256Gcm, &derived_key, &master_key)?;

        let settings = ProtectedValue::create(
            EncryptionAlgorithm::Aes256Gcm,
            &master_key.as_encryption_key()?,
            &UserSettings::default(),
        )?;

        Ok(Self {
            username: username.into(),
            master_key_derivation_information: information,
            master_encryption_key: protected_master_key,
            settings,
            deleted: false,
            modified: now,
            created: now,
        })
    }

    /// Unwrap the master encryption key with the password-derived key.
    pub fn master_key(&self, derived_key: &EncryptionKey) -> Result<EncryptionKey> {
        let master_key: CryptographicKey = self.master_encryption_key.decrypt(derived_key)?;
        master_key.as_encryption_key()
    }

    /// Re-encrypt the settings and bump the modification timestamp.
    pub fn update_settings(
        &mut self,
        master_key: &EncryptionKey,
        settings: &UserSettings,
        now: i64,
    ) -> Result<()> {
        self.settings.update(master_key, settings)?;
        self.modified = now;
        Ok(())
    }

    /// Replace the key-derivation information and re-wrap the master key
    /// under a key derived from the new password.
    pub fn change_master_password(
        &mut self,
        kdf: &dyn KeyDerivation,
        old_password: &MasterPassword,
        new_password: &MasterPassword,
        iteration_count: u32,
        now: i64,
    ) -> Result<()> {
        let old_derived = kdf.derive_key(old_password, &self.master_key_derivation_information)?;
        let master_key: CryptographicKey = self.master_encryption_key.decrypt(&old_derived)?;

        let information = KeyDerivationInformation::generate(iteration_count)?;
        let new_derived = kdf.derive_key(new_password, &information)?;
        let rewrapped =
            ProtectedValue::create(self.master_encryption_key.algorithm(), &new_derived, &master_key)?;

        self.master_encryption_key = rewrapped;
        self.master_key_derivation_information = information;
        self.modified = now;

        Ok(())
    }

    /// Soft-delete; the record stays in the collection as a tombstone.
    pub fn mark_deleted(&mut self, now: i64) {
        self.deleted = true;
        self.modified = now;
    }
}

impl Synchronizable for User {
    fn primary_key(&self) -> &str {
        &self.username
    }

    fn modified(&self) -> i64 {
        self.modified
    }

    fn created(&self) -> i64 {
        self.created
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// A vault item owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub user_id: String,
    pub data: ProtectedValue<ItemData>,
    pub deleted: bool,
    pub modified: i64,
    pub created: i64,
}

impl Item {
    /// Create a new item encrypted with the user's master key.
    pub fn create(
        user_id: impl Into<String>,
        master_key: &EncryptionKey,
        data: &ItemData,
        now: i64,
    ) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            data: ProtectedValue::create(EncryptionAlgorithm::Aes256Gcm, master_key, data)?,
            deleted: false,
            modified: now,
            created: now,
        })
    }

    /// Re-encrypt the item payload and bump the modification timestamp.
    pub fn update_data(
        &mut self,
        master_key: &EncryptionKey,
        data: &ItemData,
        now: i64,
    ) -> Result<()> {
        self.data.update(master_key, data)?;
        self.modified = now;
        Ok(())
    }

    /// Soft-delete; the record stays in the collection as a tombstone.
    pub fn mark_deleted(&mut self, now: i64) {
        self.deleted = true;
        self.modified = now;
    }
}

impl Synchronizable for Item {
    fn primary_key(&self) -> &str {
        &self.id
    }

    fn modified(&self) -> i64 {
        self.modified
    }

    fn created(&self) -> i64 {
        self.created
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
