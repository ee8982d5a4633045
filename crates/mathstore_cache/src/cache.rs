//! High-level storage and cache orchestrator.
//!
//! `StorageAndCache` ties together the digest codec, the key scheme and an
//! object backend into the interface used by the rendering service:
//! `code_digest`/`decode_digest` for formula source, `store_data`/
//! `retrieve_data` for rendered artifacts, and `delete_cache` for maintenance.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use mathstore_backend::{BackendError, ObjectBackend, SweepProgress};
use mathstore_common::{cache_key, content_type_of, formula_key, Digest, Service};
use mathstore_config::{ReadFailurePolicy, StoreConfig};

use crate::error::CacheError;
use crate::open::backend_from_config;
use crate::settings::CacheSettings;

/// Content type of formula source objects.
const FORMULA_CONTENT_TYPE: &str = "text/plain";

/// Outcome of a [`StorageAndCache::delete_cache`] sweep.
#[derive(Debug)]
pub struct DeleteReport {
    /// Number of objects known to have been deleted.
    pub deleted: usize,
    /// The failure that stopped the sweep early, if any.
    pub error: Option<BackendError>,
}

impl DeleteReport {
    /// Returns `true` if the sweep reached the end of the listing.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Digest-addressed storage for formula source and rendered artifacts.
///
/// The instance owns its backend handle. It starts uninitialized; every
/// operation fails with [`CacheError::Uninitialized`] until [`init`] installs a
/// backend, and again after [`close`]. Apart from that handle the orchestrator
/// is stateless, so it can be shared across tasks behind an `Arc`.
///
/// Two writers racing on the same key both succeed and the backend keeps the
/// last write. Since artifacts are a pure function of their digest, racing
/// writers store identical bytes.
///
/// [`init`]: StorageAndCache::init
/// [`close`]: StorageAndCache::close
pub struct StorageAndCache {
    backend: RwLock<Option<Arc<dyn ObjectBackend>>>,
    settings: CacheSettings,
}

impl StorageAndCache {
    /// Creates an uninitialized instance.
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            backend: RwLock::new(None),
            settings,
        }
    }

    /// Creates an instance already initialized with `backend`.
    pub fn with_backend(backend: Arc<dyn ObjectBackend>, settings: CacheSettings) -> Self {
        let cache = Self::new(settings);
        cache.init(backend);
        cache
    }

    /// Builds the configured backend and returns an initialized instance.
    pub fn open(config: &StoreConfig) -> Result<Self, CacheError> {
        let backend = backend_from_config(&config.backend)?;
        tracing::debug!(backend = backend.name(), "opened storage and cache");
        Ok(Self::with_backend(
            backend,
            CacheSettings::from(&config.cache),
        ))
    }

    /// Installs the backend handle.
    ///
    /// Idempotent: if a backend is already installed it is kept and `false` is
    /// returned.
    pub fn init(&self, backend: Arc<dyn ObjectBackend>) -> bool {
        let mut slot = self.backend.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(backend);
        true
    }

    /// Drops the backend handle. Later operations fail with
    /// [`CacheError::Uninitialized`] until `init` is called again.
    pub fn close(&self) {
        let mut slot = self.backend.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Returns `true` if a backend is installed.
    pub fn is_initialized(&self) -> bool {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the settings this instance was created with.
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Computes the digest of `content` and stores the content under it.
    ///
    /// Repeating the call with the same content rewrites the same object. A
    /// failed write is returned: without it the digest could never be decoded.
    pub async fn code_digest(&self, content: &[u8]) -> Result<Digest, CacheError> {
        let digest = Digest::compute(content);
        let key = formula_key(&digest);
        self.put("code_digest", key, content, FORMULA_CONTENT_TYPE)
            .await?;
        Ok(digest)
    }

    /// Returns the content previously stored for `digest`, or `None` on a miss.
    pub async fn decode_digest(&self, digest: &Digest) -> Result<Option<Vec<u8>>, CacheError> {
        self.read("decode_digest", formula_key(digest)).await
    }

    /// Stores a rendered artifact for the `(digest, service)` pair.
    pub async fn store_data(
        &self,
        digest: &Digest,
        service: &Service,
        data: &[u8],
    ) -> Result<(), CacheError> {
        let key = cache_key(digest, service);
        self.put("store_data", key, data, content_type_of(service))
            .await
    }

    /// Returns the artifact cached for the `(digest, service)` pair, or `None`.
    ///
    /// `None` means the caller must render the artifact again and call
    /// [`store_data`](Self::store_data).
    pub async fn retrieve_data(
        &self,
        digest: &Digest,
        service: &Service,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        self.read("retrieve_data", cache_key(digest, service)).await
    }

    /// Deletes every object in the backend, formula sources included.
    ///
    /// Best effort: a backend failure stops the sweep, is logged, and is
    /// recorded in the returned report. Objects written concurrently with the
    /// sweep may or may not survive it.
    pub async fn delete_cache(&self) -> Result<DeleteReport, CacheError> {
        let backend = self.backend()?;
        let after = self.settings.maintenance_timeout;

        let progress = SweepProgress::new();
        let report = match tokio::time::timeout(after, backend.delete_all(&progress)).await {
            Ok(Ok(deleted)) => DeleteReport {
                deleted,
                error: None,
            },
            Ok(Err(sweep)) => DeleteReport {
                deleted: sweep.deleted,
                error: Some(sweep.source),
            },
            Err(_) => DeleteReport {
                deleted: progress.deleted(),
                error: Some(BackendError::Timeout { after }),
            },
        };

        match &report.error {
            None => tracing::info!(
                backend = backend.name(),
                deleted = report.deleted,
                "deleted cache"
            ),
            Some(err @ BackendError::PermissionDenied { .. }) => tracing::error!(
                backend = backend.name(),
                deleted = report.deleted,
                error = %err,
                "could not delete the cache; check the configured backend credentials"
            ),
            Some(err) => tracing::error!(
                backend = backend.name(),
                deleted = report.deleted,
                error = %err,
                "could not delete the cache"
            ),
        }

        Ok(report)
    }

    fn backend(&self) -> Result<Arc<dyn ObjectBackend>, CacheError> {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CacheError::Uninitialized)
    }

    async fn put(
        &self,
        operation: &'static str,
        key: String,
        body: &[u8],
        content_type: &str,
    ) -> Result<(), CacheError> {
        let backend = self.backend()?;
        let result = bounded(self.settings.timeout, backend.put(&key, body, content_type)).await;
        match result {
            Ok(()) => {
                tracing::debug!(operation, key = %key, bytes = body.len(), "stored object");
                Ok(())
            }
            Err(source) => Err(CacheError::Backend {
                operation,
                key,
                source,
            }),
        }
    }

    async fn read(
        &self,
        operation: &'static str,
        key: String,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        let backend = self.backend()?;
        match bounded(self.settings.timeout, backend.get(&key)).await {
            Ok(object) => {
                tracing::debug!(operation, key = %key, "cache hit");
                Ok(Some(object.body))
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!(operation, key = %key, "cache miss");
                Ok(None)
            }
            Err(source) => match self.settings.read_failure {
                ReadFailurePolicy::FailOpen => {
                    tracing::warn!(
                        operation,
                        key = %key,
                        error = %source,
                        "backend read failed; treating as cache miss"
                    );
                    Ok(None)
                }
                ReadFailurePolicy::Surface => Err(CacheError::Backend {
                    operation,
                    key,
                    source,
                }),
            },
        }
    }
}

/// Runs a backend call with a time bound; elapsing maps to
/// [`BackendError::Timeout`].
async fn bounded<T, F>(after: Duration, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout { after }),
    }
}
