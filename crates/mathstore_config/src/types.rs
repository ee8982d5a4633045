//! Configuration types deserialized from `mathstore.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default time bound for a single get or put, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Default time bound for a whole delete sweep, in milliseconds.
pub const DEFAULT_MAINTENANCE_TIMEOUT_MS: u64 = 300_000;

/// Default listing page size for delete sweeps.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// The top-level configuration parsed from `mathstore.toml`.
///
/// Every section is optional; an empty file yields an in-memory store with
/// fail-open reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// Which object store to open and how.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Cache behavior on top of the backend.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Object store selection.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// The backend implementation.
    #[serde(default)]
    pub kind: BackendKind,
    /// Root directory of a filesystem store. Required when `kind` is `filesystem`.
    #[serde(default)]
    pub root: Option<String>,
    /// Keys requested per listing page during delete sweeps.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Backend-specific settings (credentials, region, bucket, ...).
    ///
    /// Opaque to the cache; backends ignore keys they do not understand.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            root: None,
            page_size: DEFAULT_PAGE_SIZE,
            options: BTreeMap::new(),
        }
    }
}

/// Available backend implementations.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local map; contents vanish on exit.
    #[default]
    Memory,
    /// Files below a local root directory.
    Filesystem,
}

/// How read paths treat backend failures other than a missing object.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReadFailurePolicy {
    /// Log the failure and report a cache miss (default).
    #[default]
    FailOpen,
    /// Return the failure to the caller.
    Surface,
}

/// Cache behavior settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Read-failure policy for `decode_digest` and `retrieve_data`.
    #[serde(default)]
    pub read_failure: ReadFailurePolicy,
    /// Time bound for a single get or put, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Time bound for a whole delete sweep, in milliseconds.
    #[serde(default = "default_maintenance_timeout_ms")]
    pub maintenance_timeout_ms: u64,
}

impl CacheConfig {
    /// Returns the per-call time bound.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the delete sweep time bound.
    pub fn maintenance_timeout(&self) -> Duration {
        Duration::from_millis(self.maintenance_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            read_failure: ReadFailurePolicy::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            maintenance_timeout_ms: DEFAULT_MAINTENANCE_TIMEOUT_MS,
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_maintenance_timeout_ms() -> u64 {
    DEFAULT_MAINTENANCE_TIMEOUT_MS
}
