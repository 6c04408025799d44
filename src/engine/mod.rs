use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::path::Path;
use tracing::{debug, info};

mod chirps;
mod credentials;
mod identity;
mod snapshot;
mod storage;
mod users;

pub use chirps::{censor, validate_body, Chirp, Chirps, MAX_CHIRP_LEN};
pub use credentials::{Credentials, HashCost};
pub use identity::{next_identity, Sequences};
pub use snapshot::Snapshot;
pub use storage::SnapshotFile;
pub use users::{PublicUser, User, Users};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

/// The file-backed document store.
///
/// The `Store` owns the database file and the reader/writer lock guarding
/// it. It keeps no records in memory: each call loads the whole snapshot,
/// works on it and, for mutations, writes it back before returning.
///
/// ## Architecture
///
/// ```text
/// ┌──────────────┐   ┌──────────────┐
/// │ Chirps view  │   │  Users view  │──── Credentials (Argon2)
/// └──────┬───────┘   └──────┬───────┘
///        └────────┬─────────┘
///         ┌───────▼────────┐
///         │     Store      │  RwLock<()> + Identity allocation
///         └───────┬────────┘
///         ┌───────▼────────┐
///         │  SnapshotFile  │  JSON snapshot, atomic replace
///         └────────────────┘
/// ```
///
/// ## Locking
/// - Reads take the shared lock for one load.
/// - Every create/update holds the exclusive lock across load → check →
///   mutate → save, so checks such as email uniqueness cannot be
///   invalidated between the check and the write.
///
/// Share a `Store` between threads with `Arc<Store>`.
pub struct Store {
    config: StoreConfig,
    file: SnapshotFile,
    lock: RwLock<()>,
    credentials: Credentials,
}

impl Store {
    /// Opens the store at `path` with default settings, creating an empty
    /// database file if none exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(StoreConfig::new(path))
    }

    /// Opens the store described by `config`.
    ///
    /// ## Returns
    /// * `Ok(Store)` - Ready to use; the backing file exists
    /// * `Err(StoreError::Config)` - `config` failed validation
    /// * `Err(StoreError::Io)` - The file could not be created or opened
    pub fn open_with(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let file = SnapshotFile::open(&config.path)?;
        let credentials = Credentials::new(config.hash_cost)?;
        info!(path = %config.path.display(), "store opened");
        Ok(Self {
            config,
            file,
            lock: RwLock::new(()),
            credentials,
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Settings the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Typed view over the chirp collection.
    pub fn chirps(&self) -> Chirps<'_> {
        Chirps::new(self)
    }

    /// Typed view over the user collection.
    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    /// Loads a consistent copy of the whole database under the shared lock.
    ///
    /// An empty or missing file yields an empty snapshot. Content that does
    /// not decode yields [`StoreError::Corruption`].
    pub fn load_snapshot(&self) -> Result<Snapshot> {
        let _guard = self.read_guard()?;
        self.read_unlocked()
    }

    /// Replaces the whole database with `snapshot` under the exclusive lock.
    ///
    /// The snapshot is validated first; an invalid one is rejected with
    /// [`StoreError::Corruption`] and the file is left as it was.
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let _guard = self.write_guard()?;
        self.write_unlocked(snapshot)
    }

    /// Runs `f` on the current snapshot inside one exclusive section and
    /// persists the result.
    ///
    /// If `f` returns an error nothing is written.
    pub(crate) fn mutate<T>(&self, f: impl FnOnce(&mut Snapshot) -> Result<T>) -> Result<T> {
        let _guard = self.write_guard()?;
        let mut snapshot = self.read_unlocked()?;
        let out = f(&mut snapshot)?;
        self.write_unlocked(&snapshot)?;
        Ok(out)
    }

    fn read_unlocked(&self) -> Result<Snapshot> {
        let bytes = self.file.read()?;
        debug!(bytes = bytes.len(), "snapshot loaded");
        Snapshot::decode(&bytes)
    }

    fn write_unlocked(&self, snapshot: &Snapshot) -> Result<()> {
        snapshot.validate()?;
        let bytes = snapshot.encode()?;
        self.file.write_atomic(&bytes)?;
        Ok(())
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, ()>> {
        match self.config.lock_timeout {
            Some(timeout) => self.lock.try_read_for(timeout).ok_or(StoreError::LockTimeout),
            None => Ok(self.lock.read()),
        }
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, ()>> {
        match self.config.lock_timeout {
            Some(timeout) => self.lock.try_write_for(timeout).ok_or(StoreError::LockTimeout),
            None => Ok(self.lock.write()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn open_temp() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_with(StoreConfig::for_testing(dir.path().join("db.json"))).unwrap();
        (dir, store)
    }

    #[test]
    fn test_fresh_store_is_empty() {
        let (_dir, store) = open_temp();
        assert!(store.load_snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store) = open_temp();
        let mut s = Snapshot::default();
        s.chirps.insert(1, Chirp { id: 1, body: "hi".into() });
        s.sequences.chirps = 1;

        store.save_snapshot(&s).unwrap();
        assert_eq!(store.load_snapshot().unwrap(), s);
    }

    #[test]
    fn test_save_rejects_invalid_snapshot() {
        let (_dir, store) = open_temp();
        let mut bad = Snapshot::default();
        bad.chirps.insert(1, Chirp { id: 9, body: "hi".into() });

        assert!(matches!(store.save_snapshot(&bad), Err(StoreError::Corruption(_))));
        assert!(store.load_snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_failed_mutation_writes_nothing() {
        let (_dir, store) = open_temp();
        store.chirps().create("keep me").unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let result: Result<()> = store.mutate(|s| {
            s.chirps.clear();
            Err(StoreError::Validation("abort".into()))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_lock_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::for_testing(dir.path().join("db.json"))
            .with_lock_timeout(Duration::from_millis(20));
        let store = Store::open_with(config).unwrap();

        let _held = store.lock.write();
        assert!(matches!(store.load_snapshot(), Err(StoreError::LockTimeout)));
        assert!(matches!(store.chirps().create("x"), Err(StoreError::LockTimeout)));
    }

    #[test]
    fn test_readers_share_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::for_testing(dir.path().join("db.json"))
            .with_lock_timeout(Duration::from_millis(20));
        let store = Store::open_with(config).unwrap();

        let _reader = store.lock.read();
        assert!(store.load_snapshot().is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = StoreConfig::new("");
        assert!(matches!(Store::open_with(config), Err(StoreError::Config(_))));
    }
}
