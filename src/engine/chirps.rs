use serde::{Deserialize, Serialize};
use tracing::info;

use super::identity::next_identity;
use super::Store;
use crate::error::{Result, StoreError};

/// Maximum chirp length, counted in characters (Unicode scalar values).
pub const MAX_CHIRP_LEN: usize = 140;

/// Replacement written over censored words.
const CENSORED: &str = "****";

/// A short public post.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Chirp {
    pub id: u64,
    pub body: String,
}

/// Typed view over the chirp collection of a [`Store`].
///
/// Obtained with [`Store::chirps`].
pub struct Chirps<'a> {
    store: &'a Store,
}

impl<'a> Chirps<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Validates, censors and stores a new chirp.
    ///
    /// Fails with [`StoreError::Validation`] when `body` is longer than
    /// [`MAX_CHIRP_LEN`] characters, either as submitted or after censoring
    /// (a censored word shorter than `****` grows the body). Nothing is
    /// written in that case.
    pub fn create(&self, body: &str) -> Result<Chirp> {
        validate_body(body)?;
        let body = censor(body, &self.store.config().censored_words);
        validate_body(&body)?;

        let chirp = self.store.mutate(|snapshot| {
            let id = next_identity(&mut snapshot.sequences.chirps, &snapshot.chirps)?;
            let chirp = Chirp { id, body };
            snapshot.chirps.insert(id, chirp.clone());
            Ok(chirp)
        })?;
        info!(id = chirp.id, "chirp created");
        Ok(chirp)
    }

    /// Returns every chirp. Order is unspecified; sort by `id` if it matters.
    pub fn list(&self) -> Result<Vec<Chirp>> {
        let snapshot = self.store.load_snapshot()?;
        Ok(snapshot.chirps.into_values().collect())
    }

    /// Looks up one chirp by id.
    pub fn get(&self, id: u64) -> Result<Chirp> {
        let mut snapshot = self.store.load_snapshot()?;
        snapshot
            .chirps
            .remove(&id)
            .ok_or_else(|| StoreError::chirp_not_found(id))
    }
}

/// Rejects bodies longer than [`MAX_CHIRP_LEN`] characters.
pub fn validate_body(body: &str) -> Result<()> {
    let len = body.chars().count();
    if len > MAX_CHIRP_LEN {
        return Err(StoreError::Validation(format!(
            "chirp is too long: {len} characters (max {MAX_CHIRP_LEN})"
        )));
    }
    Ok(())
}

/// Replaces each space-separated word that case-insensitively equals one of
/// `words` with `****`. Punctuation attached to a word prevents a match.
pub fn censor(body: &str, words: &[String]) -> String {
    if words.is_empty() {
        return body.to_string();
    }
    body.split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if words.iter().any(|w| w.to_lowercase() == lowered) {
                CENSORED
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
