//! Shared foundational types for the mathstore formula cache.
//!
//! This crate provides the content digest, the rendering service tag, and the
//! pure key scheme that maps both onto object-store keys.

#![warn(missing_docs)]

pub mod digest;
pub mod error;
pub mod keys;
pub mod service;

pub use digest::{Digest, DIGEST_ALGORITHM, MIN_DIGEST_LEN};
pub use error::KeyError;
pub use keys::{
    cache_key, content_type_of, extension_of, folder_of, folder_of_str, formula_key, Purpose,
};
pub use service::{Service, TextService};
