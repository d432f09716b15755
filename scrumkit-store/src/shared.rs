//! Thread-safe handle for hosts that touch the store from several threads.
//!
//! Every mutation goes through the write lock, so ref allocation and the
//! mirror lists see one writer at a time.

use crate::snapshot::SnapshotStore;
use crate::ScrumStore;
use scrumkit_core::{ProjectId, RefNumber, ScrumResult, StorageError};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<ScrumStore>>,
}

impl SharedStore {
    pub fn new(store: ScrumStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Run a read-only closure under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&ScrumStore) -> R) -> ScrumResult<R> {
        let store = self.inner.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(f(&store))
    }

    /// Run a mutation under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut ScrumStore) -> ScrumResult<R>) -> ScrumResult<R> {
        let mut store = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        f(&mut store)
    }

    pub fn next_ref(&self, project: ProjectId) -> ScrumResult<RefNumber> {
        self.write(|store| Ok(store.next_ref(project)))
    }

    /// Snapshot under the read lock, then save without holding it.
    pub fn save_to(&self, backend: &dyn SnapshotStore) -> ScrumResult<()> {
        let snapshot = self.read(|store| store.snapshot())?;
        backend.save(&snapshot)?;
        tracing::info!(
            projects = snapshot.projects.len(),
            "shared store snapshot saved"
        );
        Ok(())
    }
}
