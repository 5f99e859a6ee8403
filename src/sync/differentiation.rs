//! Pure snapshot differentiation by primary key and modification timestamp.
//!
//! Both functions are deterministic and idempotent; they can be re-run on
//! the same pair of snapshots after a retried network round-trip and yield
//! the same result.

use crate::sync::SyncError;
use std::collections::HashSet;

/// An entity that can be reconciled between a local and a remote snapshot.
///
/// `primary_key` is assigned at creation and never changes; `modified` is
/// monotonically non-decreasing per entity as observed by any single source
/// of truth. Deletion is a soft marker so the event still propagates
/// through the merge.
pub trait Synchronizable {
    fn primary_key(&self) -> &str;

    /// Last-change timestamp in epoch milliseconds.
    fn modified(&self) -> i64;

    /// Creation timestamp in epoch milliseconds.
    fn created(&self) -> i64;

    fn is_deleted(&self) -> bool;
}

/// Every entity of `incoming` whose primary key does not appear in
/// `current`, in `incoming` order.
///
/// Entities present in both snapshots are excluded regardless of any other
/// field difference; those are [`collect_modified_items`]'s concern.
pub fn collect_new_items<'a, S: Synchronizable>(current: &[S], incoming: &'a [S]) -> Vec<&'a S> {
    let known: HashSet<&str> = current.iter().map(Synchronizable::primary_key).collect();

    incoming
        .iter()
        .filter(|entity| !known.contains(entity.primary_key()))
        .collect()
}

/// Every entity of `updated` whose `modified` timestamp is strictly newer
/// than its counterpart in `current`.
///
/// The snapshots must describe the same entity set: equal sizes and, after
/// sorting by primary key, identical key sequences. Anything else means the
/// caller paired unrelated snapshots and is an error, not a merge case.
/// Equal timestamps are not a change.
pub fn collect_modified_items<'a, S: Synchronizable>(
    current: &[S],
    updated: &'a [S],
) -> Result<Vec<&'a S>, SyncError> {
    if current.len() != updated.len() {
        return Err(SyncError::CollectionSizeMismatch {
            current: current.len(),
            updated: updated.len(),
        });
    }

    let mut current_sorted: Vec<&S> = current.iter().collect();
    current_sorted.sort_by(|a, b| a.primary_key().cmp(b.primary_key()));

    let mut updated_sorted: Vec<&'a S> = updated.iter().collect();
    updated_sorted.sort_by(|a, b| a.primary_key().cmp(b.primary_key()));

    let mut modified = Vec::new();

    for (old, new) in current_sorted.iter().zip(&updated_sorted) {
        if old.primary_key() != new.primary_key() {
            return Err(SyncError::PrimaryKeyMismatch {
                current: old.primary_key().to_string(),
                updated: new.primary_key().to_string(),
            });
        }

        if new.modified() > old.modified() {
            modified.push(*new);
        }
    }

    Ok(modified)
}
