//! Identity allocation.
//!
//! Each collection gets dense positive ids starting at 1. The last id handed
//! out is persisted in the snapshot so ids are never reused, even if records
//! were ever removed from a collection.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, StoreError};

/// Per-collection identity counters stored alongside the records.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Sequences {
    /// Last id assigned to a chirp (0 = none yet)
    #[serde(default)]
    pub chirps: u64,
    /// Last id assigned to a user (0 = none yet)
    #[serde(default)]
    pub users: u64,
}

/// Returns the next identity for `collection` and advances `counter`.
///
/// The result is one past the largest of the counter, the largest existing
/// key and the collection size. With no deletions all three agree and the
/// result is `collection.len() + 1`.
///
/// Fails with [`StoreError::Corruption`] when the id space is exhausted,
/// which only a tampered file can reach; `counter` is left unchanged.
pub fn next_identity<V>(counter: &mut u64, collection: &HashMap<u64, V>) -> Result<u64> {
    let highest_key = collection.keys().copied().max().unwrap_or(0);
    let floor = (*counter).max(highest_key).max(collection.len() as u64);
    let id = floor
        .checked_add(1)
        .ok_or_else(|| StoreError::Corruption(format!("identity space exhausted at {floor}")))?;
    *counter = id;
    Ok(id)
}
