//! Parsing and validation of `mathstore.toml` configuration files.
//!
//! This crate reads the store configuration and produces a strongly-typed
//! [`StoreConfig`] describing which backend to open and how the cache treats
//! read failures and slow backend calls.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use types::*;
