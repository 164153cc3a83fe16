//! The ACL/shortcut store: the persisted record plus its load/save backend.
//!
//! Mutations only touch memory. Handlers call [`AclStore::save`] after every
//! successful mutation; a failed save leaves the in-memory change in place.

pub mod json_file;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;

use pixel_types::{Identity, StoreRecord};
use tracing::{debug, info};

use crate::errors::StoreError;

pub use json_file::JsonFileBackend;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryBackend;

/// Durable home of the [`StoreRecord`].
pub trait StoreBackend: Send {
    fn load(&self) -> Result<StoreRecord, StoreError>;

    /// Rewrite the whole record.
    fn save(&self, record: &StoreRecord) -> Result<(), StoreError>;

    /// Where the record lives, for logs.
    fn describe(&self) -> String;
}

/// The three identity lists a command may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessList {
    Whitelist,
    Blacklist,
    AltTraders,
}

impl AccessList {
    pub fn label(self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
            Self::AltTraders => "alt trader list",
        }
    }
}

pub struct AclStore {
    record: StoreRecord,
    backend: Box<dyn StoreBackend>,
}

impl AclStore {
    pub fn load<B: StoreBackend + 'static>(backend: B) -> Result<Self, StoreError> {
        let record = backend.load()?.normalized();
        info!(
            source = %backend.describe(),
            whitelist = record.whitelist.len(),
            blacklist = record.blacklist.len(),
            shortcuts = record.shortcuts.len(),
            "Store loaded"
        );
        Ok(Self {
            record,
            backend: Box::new(backend),
        })
    }

    pub fn record(&self) -> &StoreRecord {
        &self.record
    }

    pub fn shortcut(&self, key: &str) -> Option<&str> {
        self.record
            .shortcuts
            .get(&key.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Keys in sorted order.
    pub fn shortcut_keys(&self) -> impl Iterator<Item = &str> {
        self.record.shortcuts.keys().map(String::as_str)
    }

    pub fn add_shortcut(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let key = key.trim().to_lowercase();
        if let Some(existing) = self.record.shortcuts.get(&key) {
            return Err(StoreError::KeyExists {
                key,
                existing: existing.clone(),
            });
        }
        self.record.shortcuts.insert(key, value.trim().to_string());
        Ok(())
    }

    /// Returns the removed shortcut text.
    pub fn remove_shortcut(&mut self, key: &str) -> Result<String, StoreError> {
        let key = key.trim().to_lowercase();
        self.record
            .shortcuts
            .remove(&key)
            .ok_or(StoreError::KeyMissing(key))
    }

    /// `false` when the identity was already listed.
    pub fn insert(&mut self, list: AccessList, id: Identity) -> bool {
        self.list_mut(list).insert(id)
    }

    /// `false` when the identity was not listed.
    pub fn remove(&mut self, list: AccessList, id: &Identity) -> bool {
        self.list_mut(list).remove(id)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.backend.save(&self.record)?;
        debug!(dest = %self.backend.describe(), "Store saved");
        Ok(())
    }

    fn list_mut(&mut self, list: AccessList) -> &mut std::collections::BTreeSet<Identity> {
        match list {
            AccessList::Whitelist => &mut self.record.whitelist,
            AccessList::Blacklist => &mut self.record.blacklist,
            AccessList::AltTraders => &mut self.record.alt_traders,
        }
    }
}

impl std::fmt::Debug for AclStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AclStore")
            .field("backend", &self.backend.describe())
            .field("shortcuts", &self.record.shortcuts.len())
            .finish()
    }
}
