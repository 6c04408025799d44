//! # chirpy_db - A file-backed document store for chirps and users
//!
//! An embedded store that keeps a whole database of short posts ("chirps")
//! and user accounts in a single JSON file:
//! - **Whole-snapshot persistence**: every operation loads the full file; every
//!   mutation rewrites it atomically (temp file + rename)
//! - **Reader/writer locking**: concurrent reads, exclusive read-modify-write
//! - **Stable identities**: dense positive ids per collection, backed by
//!   persisted counters
//! - **Credentials**: Argon2id password hashes, verified on login and never
//!   returned to callers
//!
//! ## Usage Example
//!
//! ```no_run
//! use chirpy_db::engine::Store;
//!
//! # fn main() -> chirpy_db::error::Result<()> {
//! let store = Store::open("database.json")?;
//! let chirp = store.chirps().create("hello world")?;
//! let user = store.users().create("ada@example.com", "correct horse")?;
//! let same = store.users().authenticate("ada@example.com", "correct horse")?;
//! assert_eq!(user, same);
//! # let _ = chirp;
//! # Ok(())
//! # }
//! ```

/// Store settings (path, lock wait, hash cost, censored words)
pub mod config;

/// The store, its collections, codec, identity allocation and credentials
pub mod engine;

/// Typed errors returned by every store operation
pub mod error;
