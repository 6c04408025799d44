//! Store configuration
//!
//! Controls where the database lives, how long callers wait for the file
//! lock, how expensive password hashing is, and which words are censored in
//! chirp bodies.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::HashCost;
use crate::error::{Result, StoreError};

/// Default backing file name used by the binary.
pub const DEFAULT_DB_FILE: &str = "database.json";

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backing file holding the whole-database snapshot
    pub path: PathBuf,
    /// Upper bound on lock acquisition (None = wait indefinitely)
    pub lock_timeout: Option<Duration>,
    /// Argon2 cost used for new password hashes
    pub hash_cost: HashCost,
    /// Words replaced by `****` in stored chirp bodies
    pub censored_words: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new(DEFAULT_DB_FILE)
    }
}

impl StoreConfig {
    /// Create config for the given backing file with default settings
    pub fn new(path: impl AsRef<Path>) -> Self {
        StoreConfig {
            path: path.as_ref().to_path_buf(),
            lock_timeout: None,
            hash_cost: HashCost::default(),
            censored_words: Vec::new(),
        }
    }

    /// Create config for testing
    ///
    /// Uses the cheapest hash cost Argon2 accepts.
    pub fn for_testing(path: impl AsRef<Path>) -> Self {
        StoreConfig::new(path).with_hash_cost(HashCost::for_testing())
    }

    /// Set a bounded wait for the file lock
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Set password hashing cost
    pub fn with_hash_cost(mut self, cost: HashCost) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Set the censored word list
    pub fn with_censored_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.censored_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(StoreError::Config("database path is empty".to_string()));
        }
        if self.lock_timeout == Some(Duration::ZERO) {
            return Err(StoreError::Config("lock timeout must be non-zero".to_string()));
        }
        if self.censored_words.iter().any(|w| w.is_empty() || w.contains(' ')) {
            return Err(StoreError::Config(
                "censored words must be non-empty single words".to_string(),
            ));
        }
        self.hash_cost
            .params()
            .map_err(|e| StoreError::Config(format!("hash cost: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.path, PathBuf::from(DEFAULT_DB_FILE));
        assert!(config.lock_timeout.is_none());
        assert!(config.censored_words.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = StoreConfig::new("/tmp/chirps.json")
            .with_lock_timeout(Duration::from_millis(250))
            .with_censored_words(["kerfuffle", "fornax"]);

        assert_eq!(config.lock_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.censored_words, vec!["kerfuffle", "fornax"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = StoreConfig::default().with_lock_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_hash_cost() {
        let cost = HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        let config = StoreConfig::default().with_hash_cost(cost);
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_multi_word_censor() {
        let config = StoreConfig::default().with_censored_words(["two words"]);
        assert!(config.validate().is_err());
    }
}
