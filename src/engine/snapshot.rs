use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io;

use super::chirps::Chirp;
use super::identity::Sequences;
use super::users::User;
use crate::error::{Result, StoreError};

/// Complete in-memory image of the database file.
///
/// The snapshot is the unit of persistence: every operation loads the whole
/// thing from disk, works on it, and (for mutations) writes the whole thing
/// back. Nothing is cached between calls.
///
/// ## File Format
/// ```json
/// {
///   "chirps": { "1": { "id": 1, "body": "hello" } },
///   "users": { "1": { "id": 1, "email": "a@b.c", "password": "$argon2id$..." } },
///   "sequences": { "chirps": 1, "users": 1 }
/// }
/// ```
///
/// Map keys are the stringified identities. `sequences` may be missing in
/// files written before the counters existed; allocation then falls back to
/// the largest id present.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// All chirps indexed by id
    #[serde(default)]
    pub chirps: HashMap<u64, Chirp>,
    /// All users indexed by id
    #[serde(default)]
    pub users: HashMap<u64, User>,
    /// Last identity handed out per collection
    #[serde(default)]
    pub sequences: Sequences,
}

impl Snapshot {
    /// Serializes the snapshot as pretty-printed JSON.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| StoreError::Io(io::Error::from(e)))
    }

    /// Decodes file content into a snapshot.
    ///
    /// Zero bytes is the valid empty database, not an error. Anything that
    /// fails to parse, or parses but breaks a store invariant, is reported
    /// as [`StoreError::Corruption`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Snapshot::default());
        }
        let snapshot: Snapshot = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::Corruption(format!("undecodable snapshot: {e}")))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Checks the invariants every committed snapshot must satisfy:
    /// keys match record ids, ids are positive, emails are unique.
    pub fn validate(&self) -> Result<()> {
        for (key, chirp) in &self.chirps {
            check_key("chirp", *key, chirp.id)?;
        }
        let mut emails = HashSet::with_capacity(self.users.len());
        for (key, user) in &self.users {
            check_key("user", *key, user.id)?;
            if !emails.insert(user.email.as_str()) {
                return Err(StoreError::Corruption(format!(
                    "email {} is held by more than one user",
                    user.email
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.chirps.is_empty() && self.users.is_empty()
    }
}

fn check_key(entity: &str, key: u64, id: u64) -> Result<()> {
    if id == 0 {
        return Err(StoreError::Corruption(format!("{entity} with id 0")));
    }
    if key != id {
        return Err(StoreError::Corruption(format!(
            "{entity} stored under key {key} has id {id}"
        )));
    }
    Ok(())
}
