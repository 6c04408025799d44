//! Password hashing and verification.
//!
//! Plaintext passwords enter the store only through this module and leave it
//! only as salted Argon2id hashes in PHC string form
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tracing::warn;

use crate::error::{Result, StoreError};

/// Argon2 cost parameters for newly created hashes.
///
/// Existing hashes carry their own parameters, so changing the cost never
/// locks anyone out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashCost {
    /// Memory size in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        HashCost {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashCost {
    /// Cheapest parameters Argon2 accepts. Only for tests.
    pub fn for_testing() -> Self {
        HashCost {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }

    pub(crate) fn params(&self) -> std::result::Result<Params, argon2::Error> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
    }
}

/// One-way password transformer shared by the user operations.
#[derive(Clone)]
pub struct Credentials {
    argon2: Argon2<'static>,
}

impl Credentials {
    pub fn new(cost: HashCost) -> Result<Self> {
        let params = cost
            .params()
            .map_err(|e| StoreError::Config(format!("hash cost: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes `plaintext` with a fresh random salt.
    ///
    /// Two calls with the same input produce different strings, and both
    /// verify against that input.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| StoreError::Hashing(e.to_string()))
    }

    /// Checks `plaintext` against a stored hash.
    ///
    /// The digest comparison is constant-time. A stored value that is not a
    /// parseable PHC string never matches.
    pub fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
