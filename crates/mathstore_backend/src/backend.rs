//! The object-store capability consumed by the cache.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{BackendError, SweepError};

/// Listing page size used when a backend does not configure one.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// An object as returned by [`ObjectBackend::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// The object payload.
    pub body: Vec<u8>,
    /// The content type recorded when the object was stored.
    pub content_type: String,
}

/// One page of a key listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Keys in this page, in ascending lexicographic order.
    pub keys: Vec<String>,
    /// Continuation token for the next page, `None` on the last page.
    pub next: Option<String>,
}

/// Running count of objects removed by a bulk delete.
///
/// The caller owns the counter, so progress stays readable when the sweep
/// future is dropped part way, e.g. by a timeout.
#[derive(Debug, Default)]
pub struct SweepProgress {
    deleted: AtomicUsize,
}

impl SweepProgress {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one removed object.
    pub fn record(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of objects removed so far.
    pub fn deleted(&self) -> usize {
        self.deleted.load(Ordering::Relaxed)
    }
}

/// A key-addressed object store.
///
/// Implementations must be safe for concurrent use. `put` has upsert
/// semantics (last writer wins), `get` reports a missing key as
/// [`BackendError::NotFound`] and nothing else, and `delete` of an absent key
/// succeeds.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Number of keys requested per listing page during bulk deletes.
    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// Stores `body` under `key`, replacing any existing object.
    async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), BackendError>;

    /// Fetches the object stored under `key`.
    async fn get(&self, key: &str) -> Result<StoredObject, BackendError>;

    /// Removes the object stored under `key`, if any.
    async fn delete(&self, key: &str) -> Result<(), BackendError>;

    /// Lists up to `limit` keys starting with `prefix`, after `continuation`.
    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<&str>,
        limit: usize,
    ) -> Result<ListPage, BackendError>;

    /// Deletes every object whose key starts with `prefix`.
    ///
    /// Returns the number of objects removed by this call. Each removal is
    /// also recorded in `progress` as it happens.
    async fn delete_all_under_prefix(
        &self,
        prefix: &str,
        progress: &SweepProgress,
    ) -> Result<usize, SweepError> {
        sweep_prefix(self, prefix, progress).await
    }

    /// Deletes every object in the backend's scope.
    async fn delete_all(&self, progress: &SweepProgress) -> Result<usize, SweepError> {
        self.delete_all_under_prefix("", progress).await
    }
}

/// Lists and deletes every key under `prefix`, following continuation tokens
/// until the listing is exhausted.
pub async fn sweep_prefix<B>(
    backend: &B,
    prefix: &str,
    progress: &SweepProgress,
) -> Result<usize, SweepError>
where
    B: ObjectBackend + ?Sized,
{
    let mut deleted = 0;
    let mut continuation: Option<String> = None;
    loop {
        let page = backend
            .list_page(prefix, continuation.as_deref(), backend.page_size())
            .await
            .map_err(|source| SweepError { deleted, source })?;

        for key in &page.keys {
            backend
                .delete(key)
                .await
                .map_err(|source| SweepError { deleted, source })?;
            deleted += 1;
            progress.record();
        }

        match page.next {
            Some(token) => continuation = Some(token),
            None => break,
        }
    }
    tracing::debug!(backend = backend.name(), prefix, deleted, "swept prefix");
    Ok(deleted)
}

/// Builds a listing page from keys already in ascending order.
///
/// The continuation token is the last key of the page, so the listing stays
/// correct while the caller deletes the keys it has seen.
pub(crate) fn paginate<'a, I>(
    sorted_keys: I,
    prefix: &str,
    continuation: Option<&str>,
    limit: usize,
) -> ListPage
where
    I: IntoIterator<Item = &'a str>,
{
    let limit = limit.max(1);
    let mut keys = Vec::new();
    let mut truncated = false;

    for key in sorted_keys {
        if !key.starts_with(prefix) {
            continue;
        }
        if continuation.is_some_and(|token| key <= token) {
            continue;
        }
        if keys.len() == limit {
            truncated = true;
            break;
        }
        keys.push(key.to_string());
    }

    let next = if truncated { keys.last().cloned() } else { None };
    ListPage { keys, next }
}
