//! Tab- and device-scoped identity caches.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use scooter_support_core::{IdentityId, PhoneNumber};

use crate::storage::{KeyValueStorage, MemoryStorage, StorageError};

/// Tab storage key for the last resolved identity.
pub const SESSION_CACHE_KEY: &str = "identity.current";
/// Device storage key for the phone to identity mapping.
pub const PHONE_MAPPING_KEY: &str = "identity.phone_mapping";

/// The identity resolved in this tab. Never shared across tabs.
#[derive(Clone)]
pub struct SessionCache {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionCache {
    /// Cache over tab-scoped storage.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// The cached identity. An unreadable entry counts as a miss.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage cannot be read.
    pub fn get(&self) -> Result<Option<IdentityId>, StorageError> {
        let Some(raw) = self.storage.get(SESSION_CACHE_KEY)? else {
            return Ok(None);
        };
        match raw.parse() {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable session cache entry");
                Ok(None)
            }
        }
    }

    /// Cache `identity` for this tab.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage cannot be written.
    pub fn set(&self, identity: IdentityId) -> Result<(), StorageError> {
        self.storage.set(SESSION_CACHE_KEY, &identity.to_string())
    }

    /// Forget the cached identity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(SESSION_CACHE_KEY)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MappingDoc {
    entries: BTreeMap<String, IdentityId>,
    last_phone: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredMapping {
    Current(MappingDoc),
    /// Older single-object form `{ "<phone>": "<identity>" }`.
    Legacy(BTreeMap<String, IdentityId>),
}

impl From<StoredMapping> for MappingDoc {
    fn from(stored: StoredMapping) -> Self {
        match stored {
            StoredMapping::Current(doc) => doc,
            StoredMapping::Legacy(entries) => {
                let last_phone = if entries.len() == 1 {
                    entries.keys().next().cloned()
                } else {
                    None
                };
                Self {
                    entries,
                    last_phone,
                }
            }
        }
    }
}

/// Phone to identity mapping shared by every tab on the device.
///
/// Keeps one entry per phone ever resolved here, plus which phone was
/// resolved last. Last writer wins across tabs.
#[derive(Clone)]
pub struct PersistentMapping {
    storage: Arc<dyn KeyValueStorage>,
}

impl PersistentMapping {
    /// Mapping over device-scoped storage.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    fn load(&self) -> Result<MappingDoc, StorageError> {
        let Some(raw) = self.storage.get(PHONE_MAPPING_KEY)? else {
            return Ok(MappingDoc::default());
        };
        match serde_json::from_str::<StoredMapping>(&raw) {
            Ok(stored) => Ok(stored.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable phone mapping");
                Ok(MappingDoc::default())
            }
        }
    }

    /// Identity recorded for `phone` on this device.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage cannot be read.
    pub fn lookup(&self, phone: &PhoneNumber) -> Result<Option<IdentityId>, StorageError> {
        Ok(self.load()?.entries.get(phone.as_str()).copied())
    }

    /// Identity of the phone most recently resolved on this device.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage cannot be read.
    pub fn last(&self) -> Result<Option<IdentityId>, StorageError> {
        let doc = self.load()?;
        Ok(doc
            .last_phone
            .as_ref()
            .and_then(|phone| doc.entries.get(phone))
            .copied())
    }

    /// Record `phone -> identity` and make it the most recent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage cannot be read or written.
    pub fn record(&self, phone: &PhoneNumber, identity: IdentityId) -> Result<(), StorageError> {
        let mut doc = self.load()?;
        doc.entries.insert(phone.as_str().to_owned(), identity);
        doc.last_phone = Some(phone.as_str().to_owned());
        self.storage
            .set(PHONE_MAPPING_KEY, &serde_json::to_string(&doc)?)
    }

    /// Number of phones recorded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage cannot be read.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.load()?.entries.len())
    }
}

/// Both identity caches for one tab, constructed once and passed down.
#[derive(Clone)]
pub struct IdentityContext {
    session: SessionCache,
    mapping: PersistentMapping,
}

impl IdentityContext {
    /// Context over a tab's storage and its device's storage.
    #[must_use]
    pub fn new(tab: Arc<dyn KeyValueStorage>, device: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            session: SessionCache::new(tab),
            mapping: PersistentMapping::new(device),
        }
    }

    /// A fresh tab on a fresh device, all in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    /// A new tab on the same device as `self`.
    #[must_use]
    pub fn new_tab(&self, tab: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            session: SessionCache::new(tab),
            mapping: self.mapping.clone(),
        }
    }

    /// The tab-scoped cache.
    #[must_use]
    pub const fn session(&self) -> &SessionCache {
        &self.session
    }

    /// The device-scoped mapping.
    #[must_use]
    pub const fn mapping(&self) -> &PersistentMapping {
        &self.mapping
    }
}
