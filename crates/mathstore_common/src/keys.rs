//! Object-store key layout.
//!
//! Every object lives under one of two namespaces: `formula/` holds the
//! original source of a digest, `cache/` holds rendered artifacts. Below the
//! namespace, a two-level shard folder built from the first four digest
//! characters gives a 65536-way fan-out:
//!
//! ```text
//! formula/<d0d1>/<d2d3>/<digest>.ini
//! cache/<d0d1>/<d2d3>/<digest>.<ext>
//! ```
//!
//! These formats are shared with existing deployments and must not change.

use crate::digest::{Digest, MIN_DIGEST_LEN};
use crate::error::KeyError;
use crate::service::Service;

/// Extension of formula source objects.
const FORMULA_EXT: &str = "ini";

/// Characters taken from the digest for each shard folder level.
const SHARD_WIDTH: usize = 2;

/// The namespace an object key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Original formula content, addressed by digest.
    Formula,
    /// Rendered artifacts, addressed by digest and service.
    Cache,
}

impl Purpose {
    /// Returns the key prefix of this namespace, including the trailing `/`.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Formula => "formula/",
            Self::Cache => "cache/",
        }
    }
}

/// Returns the two-level shard folder of a digest, e.g. `"ab/12"`.
pub fn folder_of(digest: &Digest) -> String {
    let d = digest.as_str();
    format!(
        "{}/{}",
        &d[..SHARD_WIDTH],
        &d[SHARD_WIDTH..2 * SHARD_WIDTH]
    )
}

/// Returns the shard folder of a raw digest string.
///
/// A string shorter than four characters has no shard folder; that is a
/// configuration error reported as [`KeyError::InvalidDigest`].
/// [`Digest::parse`] runs every caller-supplied digest through this check.
pub fn folder_of_str(digest: &str) -> Result<String, KeyError> {
    if digest.len() < MIN_DIGEST_LEN
        || !digest.is_char_boundary(SHARD_WIDTH)
        || !digest.is_char_boundary(MIN_DIGEST_LEN)
    {
        return Err(KeyError::InvalidDigest {
            digest: digest.to_string(),
            reason: format!("must be at least {MIN_DIGEST_LEN} characters"),
        });
    }
    Ok(format!(
        "{}/{}",
        &digest[..SHARD_WIDTH],
        &digest[SHARD_WIDTH..2 * SHARD_WIDTH]
    ))
}

/// Returns the object extension for a service: `png`, `svg` or `<name>.txt`.
///
/// Text services embed their name so that two text services never collide on
/// the same digest.
pub fn extension_of(service: &Service) -> String {
    match service {
        Service::Png => "png".to_string(),
        Service::Svg => "svg".to_string(),
        Service::Text(name) => format!("{name}.txt"),
    }
}

/// Returns the `Content-Type` sent when storing an artifact of this service.
pub fn content_type_of(service: &Service) -> &'static str {
    match service {
        Service::Png => "image/png",
        Service::Svg => "image/svg+xml",
        Service::Text(_) => "text/plain",
    }
}

/// Returns the key of the formula source object for a digest.
pub fn formula_key(digest: &Digest) -> String {
    format!(
        "{}{}/{}.{FORMULA_EXT}",
        Purpose::Formula.prefix(),
        folder_of(digest),
        digest
    )
}

/// Returns the key of the cached artifact for a digest and service.
pub fn cache_key(digest: &Digest, service: &Service) -> String {
    format!(
        "{}{}/{}.{}",
        Purpose::Cache.prefix(),
        folder_of(digest),
        digest,
        extension_of(service)
    )
}
