//! Error types for cache operations.

use mathstore_backend::BackendError;
use mathstore_common::KeyError;
use mathstore_config::ConfigError;

/// Errors returned by [`StorageAndCache`](crate::StorageAndCache).
///
/// A cache miss is never an error. Read paths only return `Backend` errors
/// under [`ReadFailurePolicy::Surface`](crate::ReadFailurePolicy::Surface);
/// write paths always propagate them.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An operation ran before `init` or after `close`.
    #[error("storage and cache is not initialized")]
    Uninitialized,

    /// A digest or service could not be turned into a key.
    #[error(transparent)]
    InvalidKey(#[from] KeyError),

    /// The backend failed an operation.
    #[error("backend {operation} failed for '{key}': {source}")]
    Backend {
        /// The cache operation that issued the backend call.
        operation: &'static str,
        /// The object key involved.
        key: String,
        /// The backend failure.
        source: BackendError,
    },

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
