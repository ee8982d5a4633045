//! Digest-addressed storage and cache for rendered formulas.
//!
//! [`StorageAndCache`] maps formula source to a content digest and back, and
//! caches rendered artifacts per `(digest, service)` pair on top of any
//! [`ObjectBackend`](mathstore_backend::ObjectBackend). Reads follow the
//! cache-miss contract: a missing object is `Ok(None)`, never an error, and the
//! caller regenerates and stores the data.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod open;
pub mod settings;

pub use cache::{DeleteReport, StorageAndCache};
pub use error::CacheError;
pub use open::backend_from_config;
pub use settings::CacheSettings;

pub use mathstore_common::{Digest, Service};
pub use mathstore_config::ReadFailurePolicy;
