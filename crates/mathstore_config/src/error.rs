//! Errors raised while loading `mathstore.toml`.

use std::path::PathBuf;

/// A configuration that could not be read, parsed or accepted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The content is not valid TOML or does not match the schema.
    #[error("failed to parse {origin}: {reason}")]
    Parse {
        /// Where the content came from: a file path, or `configuration`.
        origin: String,
        /// The parser's description of the problem.
        reason: String,
    },

    /// A field required by the selected backend is absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A field is present but its value is unusable.
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field, e.g. `cache.timeout_ms`.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use crate::load_config_from_str;

    #[test]
    fn missing_root_names_the_field() {
        let err = load_config_from_str("[backend]\nkind = \"filesystem\"\n").unwrap_err();
        assert_eq!(err.to_string(), "missing required field `backend.root`");
    }

    #[test]
    fn zero_timeout_names_the_field() {
        let err = load_config_from_str("[cache]\ntimeout_ms = 0\n").unwrap_err();
        assert_eq!(err.to_string(), "invalid `cache.timeout_ms`: must be positive");
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let err = load_config_from_str("[cache]\nread_failure = \"retry\"\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("failed to parse configuration:"), "{msg}");
        assert!(msg.contains("retry"), "{msg}");
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let path = std::path::Path::new("/nonexistent/mathstore.toml");
        let err = crate::load_config_file(path).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("failed to read /nonexistent/mathstore.toml:"));
    }
}
