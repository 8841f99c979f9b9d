pub mod error;
pub mod queries;
pub mod snapshot;

use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};

pub use error::{Result, StoreError};
pub use snapshot::Snapshot;

/// Record store backed by a single JSON file.
///
/// The lock guards the file itself. Every mutation holds the write side for
/// the whole load-mutate-save cycle; reads hold the read side so they never
/// interleave with a save.
pub struct Database {
    path: RwLock<PathBuf>,
}

impl Database {
    /// Open the store at `path`, creating an empty file if none exists.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Self {
            path: RwLock::new(path.to_path_buf()),
        };
        db.ensure()?;

        info!("Store opened at {}", path.display());
        Ok(db)
    }

    /// Idempotently create an empty, well-formed store file.
    pub fn ensure(&self) -> Result<()> {
        let path = self.path.write().map_err(|_| StoreError::LockPoisoned)?;
        snapshot::ensure(&path)?;
        Ok(())
    }

    /// Decode the whole file under the shared lock.
    pub fn load(&self) -> Result<Snapshot> {
        let path = self.path.read().map_err(|_| StoreError::LockPoisoned)?;
        snapshot::read(&path).inspect_err(|e| warn!("Store load failed: {}", e))
    }

    /// Replace the whole file under the exclusive lock.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let path = self.path.write().map_err(|_| StoreError::LockPoisoned)?;
        snapshot::write(&path, snapshot).inspect_err(|e| warn!("Store save failed: {}", e))
    }

    pub fn with_snapshot<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Snapshot) -> Result<T>,
    {
        let path = self.path.read().map_err(|_| StoreError::LockPoisoned)?;
        let snapshot = snapshot::read(&path).inspect_err(|e| warn!("Store load failed: {}", e))?;
        f(&snapshot)
    }

    /// Run `f` against a freshly loaded snapshot and write it back if `f`
    /// succeeds. On error nothing is written.
    pub fn with_snapshot_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Snapshot) -> Result<T>,
    {
        let path = self.path.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut snapshot =
            snapshot::read(&path).inspect_err(|e| warn!("Store load failed: {}", e))?;
        let out = f(&mut snapshot)?;
        snapshot::write(&path, &snapshot).inspect_err(|e| warn!("Store save failed: {}", e))?;
        Ok(out)
    }
}
