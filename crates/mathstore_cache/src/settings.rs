//! Runtime settings of the cache orchestrator.

use std::time::Duration;

use mathstore_config::{CacheConfig, ReadFailurePolicy};

/// How [`StorageAndCache`](crate::StorageAndCache) treats failures and slow
/// backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// What read paths do with backend failures other than a missing object.
    pub read_failure: ReadFailurePolicy,
    /// Bound on a single get or put.
    pub timeout: Duration,
    /// Bound on a whole delete sweep.
    pub maintenance_timeout: Duration,
}

impl CacheSettings {
    /// Returns these settings with a different read-failure policy.
    pub fn with_read_failure(mut self, policy: ReadFailurePolicy) -> Self {
        self.read_failure = policy;
        self
    }

    /// Returns these settings with a different per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns these settings with a different delete sweep timeout.
    pub fn with_maintenance_timeout(mut self, timeout: Duration) -> Self {
        self.maintenance_timeout = timeout;
        self
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            read_failure: config.read_failure,
            timeout: config.timeout(),
            maintenance_timeout: config.maintenance_timeout(),
        }
    }
}
