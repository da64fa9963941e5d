use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use dl_core::ProgressState;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::progress::ProgressObserver;
use crate::{Gid, JobOutcome};

/// Shared handle to one record; its fields are guarded by the record's own lock.
pub type RecordHandle = Arc<Mutex<JobRecord>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("job id {0} is already registered")]
    DuplicateId(Gid),
}

/// Bookkeeping for one job between submission and completion.
pub struct JobRecord {
    progress: ProgressState,
    completion: Option<oneshot::Sender<JobOutcome>>,
    observer: Arc<dyn ProgressObserver>,
}

impl JobRecord {
    /// Creates a record and the receiving end of its completion signal.
    pub fn new(
        resumed: bool,
        observer: Arc<dyn ProgressObserver>,
    ) -> (Self, oneshot::Receiver<JobOutcome>) {
        let (tx, rx) = oneshot::channel();
        let record = Self {
            progress: ProgressState::new(resumed),
            completion: Some(tx),
            observer,
        };
        (record, rx)
    }

    pub fn progress(&self) -> ProgressState {
        self.progress
    }

    pub(crate) fn set_progress(&mut self, progress: ProgressState) {
        self.progress = progress;
    }

    pub fn observer(&self) -> Arc<dyn ProgressObserver> {
        Arc::clone(&self.observer)
    }

    /// True until the completion signal has been fired.
    pub fn is_pending(&self) -> bool {
        self.completion.is_some()
    }

    /// Fires the completion signal. Only the first call delivers; later calls
    /// return false.
    pub fn signal(&mut self, outcome: JobOutcome) -> bool {
        match self.completion.take() {
            // The receiver only goes away when its worker stopped waiting.
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }
}

impl fmt::Debug for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRecord")
            .field("progress", &self.progress)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Locks a record, recovering the data from a poisoned lock.
pub fn lock_record(record: &Mutex<JobRecord>) -> MutexGuard<'_, JobRecord> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Active jobs keyed by engine identifier.
///
/// The map lock only covers insert, remove and handle lookup; record fields
/// are read and written under each record's own lock.
#[derive(Default)]
pub struct Registry {
    records: RwLock<HashMap<Gid, RecordHandle>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, gid: Gid, record: JobRecord) -> Result<RecordHandle, RegistryError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&gid) {
            return Err(RegistryError::DuplicateId(gid));
        }
        let handle = Arc::new(Mutex::new(record));
        records.insert(gid, Arc::clone(&handle));
        Ok(handle)
    }

    pub fn get(&self, gid: &str) -> Option<RecordHandle> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(gid)
            .cloned()
    }

    pub fn remove(&self, gid: &str) -> Option<RecordHandle> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(gid)
    }

    /// Point-in-time copy of every entry. Records removed afterwards stay
    /// readable through their handles but are no longer in the registry.
    pub fn snapshot(&self) -> Vec<(Gid, RecordHandle)> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(gid, handle)| (gid.clone(), Arc::clone(handle)))
            .collect()
    }

    pub fn ids(&self) -> Vec<Gid> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn contains(&self, gid: &str) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(gid)
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
