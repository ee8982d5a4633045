//! Object-store backends for the mathstore cache.
//!
//! A backend is anything that can put, get, list and delete opaque objects by
//! string key. The cache orchestrator only ever talks to the
//! [`ObjectBackend`] trait; this crate ships an in-memory map and a
//! filesystem store.

#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod fs;
pub mod memory;

pub use backend::{
    sweep_prefix, ListPage, ObjectBackend, StoredObject, SweepProgress, DEFAULT_PAGE_SIZE,
};
pub use error::{BackendError, SweepError};
pub use fs::FsBackend;
pub use memory::MemoryBackend;
