//! Filesystem object store.
//!
//! Each object key maps to a file below the store root, with `/`-separated key
//! segments becoming directories. Every file starts with a small binary header
//! carrying magic bytes, a format version, the object's content type and a
//! checksum of the payload, so that a truncated or foreign file is reported as
//! corrupt instead of being served.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::{
    paginate, ListPage, ObjectBackend, StoredObject, SweepProgress, DEFAULT_PAGE_SIZE,
};
use crate::error::{BackendError, SweepError};

/// Magic bytes identifying a mathstore object file.
const OBJECT_MAGIC: [u8; 4] = *b"MSTO";

/// Current object file format version. Increment on breaking changes to the
/// header layout.
const OBJECT_FORMAT_VERSION: u32 = 1;

/// Distinguishes temporary files written concurrently by this process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Suffix of the temporary files a put writes before renaming.
const TEMP_SUFFIX: &str = ".tmp";

/// Header prepended to every stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectHeader {
    /// Magic bytes: must be `b"MSTO"`.
    pub magic: [u8; 4],

    /// Object file format version.
    pub format_version: u32,

    /// Content type given when the object was stored.
    pub content_type: String,

    /// XXH3-128 of the payload.
    pub checksum: [u8; 16],
}

fn checksum(data: &[u8]) -> [u8; 16] {
    xxhash_rust::xxh3::xxh3_128(data).to_le_bytes()
}

/// Serializes a header and payload into the on-disk object layout:
/// 4-byte header length (little-endian), header, payload.
pub fn encode_object(body: &[u8], content_type: &str) -> Result<Vec<u8>, BackendError> {
    let header = ObjectHeader {
        magic: OBJECT_MAGIC,
        format_version: OBJECT_FORMAT_VERSION,
        content_type: content_type.to_string(),
        checksum: checksum(body),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| BackendError::Unavailable {
            reason: format!("failed to encode object header: {e}"),
        })?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + body.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(body);
    Ok(output)
}

/// Parses an on-disk object, validating magic, version and checksum.
pub fn decode_object(key: &str, raw: &[u8]) -> Result<StoredObject, BackendError> {
    let corrupt = |reason: &str| BackendError::Corrupt {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if raw.len() < 4 {
        return Err(corrupt("truncated header length"));
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&raw[..4]);
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    if raw.len() - 4 < header_len {
        return Err(corrupt("truncated header"));
    }

    let (header, _): (ObjectHeader, usize) =
        bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
            .map_err(|e| corrupt(&format!("undecodable header: {e}")))?;

    if header.magic != OBJECT_MAGIC {
        return Err(corrupt("bad magic bytes"));
    }
    if header.format_version != OBJECT_FORMAT_VERSION {
        return Err(corrupt(&format!(
            "unsupported format version {}",
            header.format_version
        )));
    }

    let payload = &raw[4 + header_len..];
    if checksum(payload) != header.checksum {
        return Err(corrupt("checksum mismatch"));
    }

    Ok(StoredObject {
        body: payload.to_vec(),
        content_type: header.content_type,
    })
}

/// Object store rooted at a local directory.
pub struct FsBackend {
    root: PathBuf,
    page_size: usize,
}

impl FsBackend {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_page_size(root, DEFAULT_PAGE_SIZE)
    }

    /// Creates a store that lists keys in pages of `page_size`.
    pub fn with_page_size(root: impl Into<PathBuf>, page_size: usize) -> Self {
        Self {
            root: root.into(),
            page_size: page_size.max(1),
        }
    }

    /// Creates a store and makes sure its root directory exists.
    pub fn create(root: impl Into<PathBuf>, page_size: usize) -> Result<Self, BackendError> {
        let store = Self::with_page_size(root, page_size);
        std::fs::create_dir_all(&store.root)
            .map_err(|e| BackendError::from_write_io(store.root.clone(), e))?;
        Ok(store)
    }

    /// Returns the store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path for an object key.
    ///
    /// Rejects keys that could resolve outside the root: absolute keys, empty
    /// segments, `.`/`..` segments, backslashes, and segments starting with
    /// `.` (reserved for temporary files).
    pub fn object_path(&self, key: &str) -> Result<PathBuf, BackendError> {
        let invalid = |reason: &str| BackendError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        if key.is_empty() {
            return Err(invalid("key is empty"));
        }
        if key.contains('\\') {
            return Err(invalid("backslashes are not allowed"));
        }
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if segment.starts_with('.') {
                return Err(invalid("segments must not start with '.'"));
            }
            path.push(segment);
        }
        Ok(path)
    }

    fn temp_path(path: &Path) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(
            ".{name}.{}-{n}{TEMP_SUFFIX}",
            std::process::id()
        ))
    }

    async fn all_keys(&self) -> Result<Vec<String>, BackendError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || collect_keys(&root))
            .await
            .map_err(|e| BackendError::Unavailable {
                reason: format!("listing task failed: {e}"),
            })?
    }

    /// Removes leftover temporary files under `prefix`, then empty directories.
    async fn clean_below(&self, prefix: &str) -> Result<usize, BackendError> {
        let root = self.root.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || {
            let removed = remove_temp_files(&root, &prefix);
            prune_below(&root);
            removed
        })
        .await
        .map_err(|e| BackendError::Unavailable {
            reason: format!("directory cleanup task failed: {e}"),
        })
    }
}

#[async_trait]
impl ObjectBackend for FsBackend {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), BackendError> {
        let path = self.object_path(key)?;
        let output = encode_object(body, content_type)?;
        let temp = Self::temp_path(&path);

        // A dropped future does not stop the blocking task, so the write and
        // rename always finish or clean up together.
        tokio::task::spawn_blocking(move || write_atomically(&path, &temp, &output))
            .await
            .map_err(|e| BackendError::Unavailable {
                reason: format!("write task failed: {e}"),
            })??;

        tracing::trace!(key, bytes = body.len(), "wrote object file");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, BackendError> {
        let path = self.object_path(key)?;
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|e| BackendError::from_io(key, path, e))?;
        decode_object(key, &raw)
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::from_io(key, path, e)),
        }
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<&str>,
        limit: usize,
    ) -> Result<ListPage, BackendError> {
        let keys = self.all_keys().await?;
        Ok(paginate(
            keys.iter().map(String::as_str),
            prefix,
            continuation,
            limit,
        ))
    }

    /// Walks the tree once instead of once per listing page, then removes
    /// leftover temporary files and empty shard directories.
    async fn delete_all_under_prefix(
        &self,
        prefix: &str,
        progress: &SweepProgress,
    ) -> Result<usize, SweepError> {
        let keys = self
            .all_keys()
            .await
            .map_err(|source| SweepError { deleted: 0, source })?;

        let mut deleted = 0;
        for key in keys.iter().filter(|k| k.starts_with(prefix)) {
            self.delete(key)
                .await
                .map_err(|source| SweepError { deleted, source })?;
            deleted += 1;
            progress.record();
        }

        match self.clean_below(prefix).await {
            Ok(0) => {}
            Ok(temps) => tracing::debug!(temps, "removed leftover temporary files"),
            Err(e) => tracing::warn!(error = %e, "failed to clean up shard directories"),
        }
        tracing::debug!(backend = self.name(), prefix, deleted, "swept prefix");
        Ok(deleted)
    }
}

/// Writes `data` to `temp` and renames it onto `path`.
///
/// Readers never observe a partially written object. On failure the
/// temporary file is removed.
fn write_atomically(path: &Path, temp: &Path, data: &[u8]) -> Result<(), BackendError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| BackendError::from_write_io(parent.to_path_buf(), e))?;
    }
    if let Err(e) = std::fs::write(temp, data) {
        let _ = std::fs::remove_file(temp);
        return Err(BackendError::from_write_io(temp.to_path_buf(), e));
    }
    if let Err(e) = std::fs::rename(temp, path) {
        let _ = std::fs::remove_file(temp);
        return Err(BackendError::from_write_io(path.to_path_buf(), e));
    }
    Ok(())
}

/// Returns the object file name a temporary file was written for.
///
/// `.<name>.<pid>-<n>.tmp` yields `<name>`; anything else yields `None`.
fn temp_target(file_name: &str) -> Option<&str> {
    let inner = file_name.strip_prefix('.')?.strip_suffix(TEMP_SUFFIX)?;
    let (name, tag) = inner.rsplit_once('.')?;
    let (pid, n) = tag.split_once('-')?;
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    (numeric(pid) && numeric(n) && !name.is_empty()).then_some(name)
}

/// Removes temporary files whose target key starts with `prefix`.
///
/// Returns how many were removed.
fn remove_temp_files(root: &Path, prefix: &str) -> usize {
    let mut removed = 0;
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            let file_name = entry.file_name();
            let Some(target) = temp_target(&file_name.to_string_lossy()).map(str::to_string)
            else {
                continue;
            };
            let Ok(relative) = dir.strip_prefix(root) else {
                continue;
            };
            let mut segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            segments.push(target);
            if segments.join("/").starts_with(prefix) && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
    }
    removed
}

/// Walks the store and returns every object key in ascending order.
fn collect_keys(root: &Path) -> Result<Vec<String>, BackendError> {
    let mut keys = Vec::new();
    if !root.exists() {
        return Ok(keys);
    }

    let io_err = |path: &Path, source: std::io::Error| BackendError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&dir, e))?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                if let Ok(relative) = path.strip_prefix(root) {
                    let segments: Vec<String> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    keys.push(segments.join("/"));
                }
            }
        }
    }

    keys.sort();
    Ok(keys)
}

/// Removes empty directories below `root`, leaving `root` itself in place.
fn prune_below(root: &Path) {
    // Returns `true` if `dir` ended up empty.
    fn prune(dir: &Path) -> bool {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return false;
        };
        let mut empty = true;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir && prune(&path) && std::fs::remove_dir(&path).is_ok() {
                continue;
            }
            empty = false;
        }
        empty
    }
    prune(root);
}
