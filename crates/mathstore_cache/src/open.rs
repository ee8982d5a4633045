//! Backend construction from configuration.

use std::sync::Arc;

use mathstore_backend::{FsBackend, MemoryBackend, ObjectBackend};
use mathstore_config::{BackendConfig, BackendKind, ConfigError};

use crate::error::CacheError;

/// Builds the backend described by `config`.
///
/// A filesystem backend has its root directory created here, so an unusable
/// root fails at startup rather than on the first write.
pub fn backend_from_config(config: &BackendConfig) -> Result<Arc<dyn ObjectBackend>, CacheError> {
    let backend = build(config)?;
    for option in ignored_options(config) {
        tracing::warn!(
            backend = backend.name(),
            option,
            "ignoring backend option not understood by this backend"
        );
    }
    Ok(backend)
}

/// Returns the configured option keys the selected backend does not use.
///
/// Neither built-in backend takes options; the map exists for remote stores
/// (credentials, region, bucket).
fn ignored_options(config: &BackendConfig) -> Vec<&str> {
    match config.kind {
        BackendKind::Memory | BackendKind::Filesystem => {
            config.options.keys().map(String::as_str).collect()
        }
    }
}

fn build(config: &BackendConfig) -> Result<Arc<dyn ObjectBackend>, CacheError> {
    match config.kind {
        BackendKind::Memory => Ok(Arc::new(MemoryBackend::with_page_size(config.page_size))),
        BackendKind::Filesystem => {
            let root = config
                .root
                .as_deref()
                .ok_or_else(|| ConfigError::MissingField("backend.root"))?;
            let backend =
                FsBackend::create(root, config.page_size).map_err(|source| CacheError::Backend {
                    operation: "init",
                    key: root.to_string(),
                    source,
                })?;
            Ok(Arc::new(backend))
        }
    }
}
