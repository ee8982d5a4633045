//! Error types for digest and service validation.

/// Errors raised while building storage keys from caller input.
///
/// These indicate a programming or configuration error in the caller, never a
/// cache miss.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The digest cannot be mapped to a shard folder.
    #[error("invalid digest '{digest}': {reason}")]
    InvalidDigest {
        /// The rejected digest string.
        digest: String,
        /// Why the digest was rejected.
        reason: String,
    },

    /// The service name cannot be embedded in an object key.
    #[error("invalid service '{service}': {reason}")]
    InvalidService {
        /// The rejected service name.
        service: String,
        /// Why the service was rejected.
        reason: String,
    },
}
