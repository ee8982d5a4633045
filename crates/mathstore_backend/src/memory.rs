//! In-process object store backed by an ordered map.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::backend::{paginate, ListPage, ObjectBackend, StoredObject, DEFAULT_PAGE_SIZE};
use crate::error::BackendError;

/// An object store that lives entirely in memory.
///
/// Objects vanish with the process. Used by tests and by deployments that only
/// want a per-process cache.
pub struct MemoryBackend {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    page_size: usize,
}

impl MemoryBackend {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty store that lists keys in pages of `page_size`.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// Returns the number of stored objects.
    pub fn len(&self) -> usize {
        self.read().map(|objects| objects.len()).unwrap_or(0)
    }

    /// Returns `true` if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if an object is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.read()
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, StoredObject>>, BackendError> {
        self.objects.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, StoredObject>>, BackendError> {
        self.objects.write().map_err(|_| poisoned())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> BackendError {
    BackendError::Unavailable {
        reason: "memory backend lock poisoned".to_string(),
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), BackendError> {
        self.write()?.insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, BackendError> {
        self.read()?
            .get(key)
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                key: key.to_string(),
            })
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.write()?.remove(key);
        Ok(())
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<&str>,
        limit: usize,
    ) -> Result<ListPage, BackendError> {
        let objects = self.read()?;
        Ok(paginate(
            objects.keys().map(String::as_str),
            prefix,
            continuation,
            limit,
        ))
    }
}
