//! Two-way merge engine over abstract entity stores.
//!
//! The engine never interprets entity payloads; protected fields stay
//! opaque ciphertext throughout the merge. Persistence and transport are
//! behind [`EntityStore`], so the same cycle drives a local database
//! against a remote API or two in-memory snapshots in tests.

use crate::sync::differentiation::{collect_modified_items, collect_new_items, Synchronizable};
use crate::sync::SyncError;
use tracing::debug;

/// A store holding one side's snapshot of a synchronizable collection.
///
/// Implementations are expected to keep tombstoned entities listed;
/// deletions propagate as modifications of the `deleted` flag, never as
/// physical removal.
pub trait EntityStore {
    type Entity: Synchronizable;

    fn list(&self) -> Result<Vec<Self::Entity>, SyncError>;

    fn upsert_all(&mut self, entities: &[Self::Entity]) -> Result<(), SyncError>;
}

/// Counts of entities exchanged by one merge cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// New entities sent to the remote store.
    pub pushed_new: usize,
    /// New entities taken over from the remote store.
    pub pulled_new: usize,
    /// Newer versions sent to the remote store.
    pub pushed_modified: usize,
    /// Newer versions taken over from the remote store.
    pub pulled_modified: usize,
}

impl SyncReport {
    /// Whether the cycle changed anything on either side.
    pub fn is_noop(&self) -> bool {
        self.pushed_new == 0
            && self.pulled_new == 0
            && self.pushed_modified == 0
            && self.pulled_modified == 0
    }
}

/// Orchestrates the merge cycle between a local mirror and a remote store.
pub struct SyncEngine<L, R> {
    local: L,
    remote: R,
}

impl<L, R> SyncEngine<L, R>
where
    L: EntityStore,
    R: EntityStore<Entity = L::Entity>,
    L::Entity: Clone,
{
    pub fn new(local: L, remote: R) -> Self {
        Self { local, remote }
    }

    /// Run one full merge cycle.
    ///
    /// First the sides exchange entities the other has never seen, which
    /// brings both key sets into agreement; then each side takes over the
    /// strictly newer version of every shared entity. Safe to re-run: a
    /// second cycle over unchanged stores is a no-op.
    pub fn synchronize(&mut self) -> Result<SyncReport, SyncError> {
        let local_snapshot = self.local.list()?;
        let remote_snapshot = self.remote.list()?;

        let new_for_remote: Vec<L::Entity> = collect_new_items(&remote_snapshot, &local_snapshot)
            .into_iter()
            .cloned()
            .collect();
        let new_for_local: Vec<L::Entity> = collect_new_items(&local_snapshot, &remote_snapshot)
            .into_iter()
            .cloned()
            .collect();

        self.remote.upsert_all(&new_for_remote)?;
        self.local.upsert_all(&new_for_local)?;

        // Both sides now cover the same key set.
        let local_snapshot = self.local.list()?;
        let remote_snapshot = self.remote.list()?;

        let modified_for_local: Vec<L::Entity> =
            collect_modified_items(&local_snapshot, &remote_snapshot)?
                .into_iter()
                .cloned()
                .collect();
        let modified_for_remote: Vec<L::Entity> =
            collect_modified_items(&remote_snapshot, &local_snapshot)?
                .into_iter()
                .cloned()
                .collect();

        self.local.upsert_all(&modified_for_local)?;
        self.remote.upsert_all(&modified_for_remote)?;

        let report = SyncReport {
            pushed_new: new_for_remote.len(),
            pulled_new: new_for_local.len(),
            pushed_modified: modified_for_remote.len(),
            pulled_modified: modified_for_local.len(),
        };

        debug!(
            "merge cycle complete: {} new pushed, {} new pulled, {} updates pushed, {} updates pulled",
            report.pushed_new, report.pulled_new, report.pushed_modified, report.pulled_modified
        );

        Ok(report)
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }
}
