//! Mirrorpass Core Library
//!
//! This library provides the device-independent core of the Mirrorpass
//! password manager: the encrypted data model, key-derivation metadata,
//! bearer-token expiration handling, and the reconciliation logic that
//! merges a local vault mirror with its remote counterpart.
//!
//! UI, persistence engines, and network transports are external
//! collaborators; the core consumes them through the `EntityStore` and
//! `KeyDerivation` traits and never touches a socket or a database itself.

pub mod codec;
pub mod crypto;
pub mod sync;
pub mod token;

pub use codec::{CodecError, JsonObjectExt};
pub use crypto::{
    CryptoError, DecryptFailure, EncryptionAlgorithm, EncryptionKey, KeyDerivation,
    KeyDerivationInformation, MasterPassword, ProtectedValue,
};
pub use sync::{
    collect_modified_items, collect_new_items, CryptographicKey, EntityStore, Item, ItemData,
    SyncEngine, SyncError, SyncReport, Synchronizable, User, UserSettings,
};
pub use token::{AuthToken, TokenError};

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, MirrorpassError>;

/// General error type aggregating the component-level errors.
#[derive(Error, Debug)]
pub enum MirrorpassError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),

    #[error("Codec error: {0}")]
    Codec(#[from] codec::CodecError),

    #[error("Token error: {0}")]
    Token(#[from] token::TokenError),

    #[error("Sync error: {0}")]
    Sync(#[from] sync::SyncError),
}
