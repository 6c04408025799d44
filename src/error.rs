//! Error types for the chirp store.
//!
//! Every fallible store operation returns [`StoreError`]. The transport layer
//! is expected to translate the variants into its own status signals.

use std::io;
use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types for the chirp store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input violates a stated constraint (e.g. chirp body too long)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another user already owns this email
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// Identity or email absent from its collection
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record that was looked up ("chirp", "user")
        entity: &'static str,
        /// The id or email that was requested
        key: String,
    },

    /// Password did not verify against the stored hash
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// On-disk content could not be decoded or breaks an invariant
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// I/O error on the backing file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Password hashing failed
    #[error("Hashing error: {0}")]
    Hashing(String),

    /// The file lock could not be acquired within the configured wait
    #[error("Timed out waiting for the database lock")]
    LockTimeout,

    /// Invalid store configuration
    #[error("Invalid config: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn chirp_not_found(id: u64) -> Self {
        StoreError::NotFound {
            entity: "chirp",
            key: id.to_string(),
        }
    }

    pub(crate) fn user_not_found(key: impl ToString) -> Self {
        StoreError::NotFound {
            entity: "user",
            key: key.to_string(),
        }
    }

    /// True for the two login failures (unknown email, wrong password).
    ///
    /// Callers facing untrusted clients should report both the same way so
    /// that responses do not reveal which emails are registered.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidCredentials | StoreError::NotFound { entity: "user", .. }
        )
    }
}
