//! Error types for backend operations.

use std::path::PathBuf;
use std::time::Duration;

/// Errors returned by an [`ObjectBackend`](crate::ObjectBackend).
///
/// `NotFound` is the only kind that means "the object does not exist"; every
/// other kind is a genuine failure that the caller may choose to mask.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No object exists under the key.
    #[error("object not found: {key}")]
    NotFound {
        /// The missing key.
        key: String,
    },

    /// The backend could not be reached or refused to serve the request.
    #[error("backend unavailable: {reason}")]
    Unavailable {
        /// Description of the failure.
        reason: String,
    },

    /// The backend rejected the credentials or the caller lacks access.
    #[error("permission denied: {reason}")]
    PermissionDenied {
        /// Description of the rejection.
        reason: String,
    },

    /// The call did not complete within its time bound.
    #[error("backend call timed out after {}ms", .after.as_millis())]
    Timeout {
        /// The bound that elapsed.
        after: Duration,
    },

    /// A local I/O error occurred.
    #[error("backend I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The stored object exists but cannot be decoded.
    #[error("corrupt object {key}: {reason}")]
    Corrupt {
        /// The key of the corrupt object.
        key: String,
        /// Description of the corruption.
        reason: String,
    },

    /// The key cannot be stored by this backend.
    #[error("invalid object key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why the key was rejected.
        reason: String,
    },
}

impl BackendError {
    /// Returns `true` if the error only reports a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Maps an I/O error on `path` to the matching backend error kind.
    pub fn from_io(key: &str, path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                key: key.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                reason: format!("{}: {source}", path.display()),
            },
            _ => Self::Io { path, source },
        }
    }

    /// Maps an I/O error raised while writing `path`.
    ///
    /// A missing file or directory during a write is an I/O failure, not a
    /// missing object, so it never maps to [`BackendError::NotFound`].
    pub fn from_write_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                reason: format!("{}: {source}", path.display()),
            },
            _ => Self::Io { path, source },
        }
    }
}

/// A bulk delete that stopped before reaching the end of the listing.
///
/// Objects already removed stay removed; re-running the sweep is safe.
#[derive(Debug, thiserror::Error)]
#[error("bulk delete stopped after {deleted} objects: {source}")]
pub struct SweepError {
    /// Number of objects deleted before the failure.
    pub deleted: usize,
    /// The failure that stopped the sweep.
    #[source]
    pub source: BackendError,
}
