//! In-memory [`StoreBackend`] backed by `Arc<Mutex<..>>`.
//!
//! Clones share state, so a test can keep a handle after moving one into
//! an [`AclStore`](super::AclStore) and inspect what was saved.

use std::sync::{Arc, Mutex};

use pixel_types::StoreRecord;

use super::StoreBackend;
use crate::errors::StoreError;

#[derive(Debug, Default)]
struct Inner {
    record: StoreRecord,
    saves: usize,
    fail_saves: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new(record: StoreRecord) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                record,
                saves: 0,
                fail_saves: false,
            })),
        }
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.inner.lock().unwrap().saves
    }

    /// The last saved record (or the initial one).
    pub fn record(&self) -> StoreRecord {
        self.inner.lock().unwrap().record.clone()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.inner.lock().unwrap().fail_saves = fail;
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self) -> Result<StoreRecord, StoreError> {
        Ok(self.record())
    }

    fn save(&self, record: &StoreRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_saves {
            return Err(StoreError::Unavailable("memory backend set to fail".into()));
        }
        inner.record = record.clone();
        inner.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
