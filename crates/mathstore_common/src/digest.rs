//! Content digests used as cache identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::KeyError;
use crate::keys::folder_of_str;

/// Name of the hash algorithm behind [`Digest::compute`].
///
/// Existing deployments key their objects by this algorithm. Changing it
/// orphans every object already in the store.
pub const DIGEST_ALGORITHM: &str = "md5";

/// Minimum digest length: two characters per shard folder level.
pub const MIN_DIGEST_LEN: usize = 4;

/// A content digest: the lowercase hex MD5 of a formula's source bytes.
///
/// Two contents with the same `Digest` are assumed to be identical. A digest
/// is either computed from content or parsed from a caller-supplied string;
/// parsed digests are validated so that they always yield a well-formed
/// shard folder and never contain path separators.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Computes the digest of the given content.
    pub fn compute(content: &[u8]) -> Self {
        Self(format!("{:x}", md5::compute(content)))
    }

    /// Parses a digest received from a caller.
    ///
    /// The input is lowercased. Fails with [`KeyError::InvalidDigest`] when the
    /// string is shorter than [`MIN_DIGEST_LEN`] or contains anything other
    /// than ASCII letters and digits.
    pub fn parse(digest: &str) -> Result<Self, KeyError> {
        folder_of_str(digest)?;
        if !digest.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(KeyError::InvalidDigest {
                digest: digest.to_string(),
                reason: "must contain only ASCII letters and digits".to_string(),
            });
        }
        Ok(Self(digest.to_ascii_lowercase()))
    }

    /// Returns the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Digest {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = Digest::compute(b"x^2+1");
        let b = Digest::compute(b"x^2+1");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = Digest::compute(b"x^2+1");
        let b = Digest::compute(b"x^2+2");
        assert_ne!(a, b);
    }

    #[test]
    fn known_md5_value() {
        assert_eq!(
            Digest::compute(b"").as_str(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            Digest::compute(b"hello world").as_str(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn computed_is_32_lowercase_hex() {
        let d = Digest::compute(b"<math><mi>x</mi></math>");
        assert_eq!(d.as_str().len(), 32);
        assert!(d
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn parse_accepts_computed_digest() {
        let d = Digest::compute(b"content");
        let parsed = Digest::parse(d.as_str()).unwrap();
        assert_eq!(parsed, d);
    }

    #[test]
    fn parse_lowercases() {
        let d = Digest::parse("AB12CD").unwrap();
        assert_eq!(d.as_str(), "ab12cd");
    }

    #[test]
    fn parse_too_short_errors() {
        let err = Digest::parse("abc").unwrap_err();
        assert!(matches!(err, KeyError::InvalidDigest { .. }));
        assert!(Digest::parse("").is_err());
    }

    #[test]
    fn parse_rejects_separators() {
        assert!(Digest::parse("ab/12cd").is_err());
        assert!(Digest::parse("../../etc").is_err());
        assert!(Digest::parse("ab12.cd").is_err());
    }

    #[test]
    fn parse_rejects_multibyte_shard_characters() {
        assert!(Digest::parse("aébc").is_err());
        assert!(Digest::parse("ab€cd").is_err());
    }

    #[test]
    fn from_str_and_display() {
        let d: Digest = "ab12cd".parse().unwrap();
        assert_eq!(d.to_string(), "ab12cd");
        assert_eq!(format!("{d:?}"), "Digest(ab12cd)");
    }

    #[test]
    fn serde_roundtrip() {
        let d = Digest::compute(b"serde test");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{d}\""));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }

    #[test]
    fn serde_rejects_invalid() {
        let result: Result<Digest, _> = serde_json::from_str("\"ab\"");
        assert!(result.is_err());
    }
}
