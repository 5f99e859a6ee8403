//! Vault synchronization core.
//!
//! Merges two snapshots of the same entity collection (the local mirror and
//! the remote store):
//! - Pure differentiation over primary keys and modification timestamps
//! - Tombstone-based soft deletes so deletions propagate through the merge
//! - A two-way merge engine over abstract entity stores

pub mod differentiation;
pub mod engine;
pub mod models;

pub use differentiation::{collect_modified_items, collect_new_items, Synchronizable};
pub use engine::{EntityStore, SyncEngine, SyncReport};
pub use models::{CryptographicKey, Item, ItemData, User, UserSettings};

use thiserror::Error;

/// Errors from the synchronization core.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The two snapshots differ in size; the merge protocol never drops
    /// entities between snapshots, so this is a caller bug.
    #[error("Snapshot sizes do not match: current {current}, updated {updated}")]
    CollectionSizeMismatch { current: usize, updated: usize },

    /// The two snapshots do not cover the same primary keys.
    #[error("Snapshots do not cover the same primary keys: '{current}' vs '{updated}'")]
    PrimaryKeyMismatch { current: String, updated: String },

    /// A failure propagated from an entity store.
    #[error("Entity store failure: {0}")]
    Store(String),
}
