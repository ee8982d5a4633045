//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{BackendKind, StoreConfig};
use std::path::Path;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE: &str = "mathstore.toml";

/// Loads and validates `mathstore.toml` from a directory.
pub fn load_config(dir: &Path) -> Result<StoreConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<StoreConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, &path.display().to_string())
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<StoreConfig, ConfigError> {
    parse_config(content, "configuration")
}

fn parse_config(content: &str, origin: &str) -> Result<StoreConfig, ConfigError> {
    let config: StoreConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

fn positive(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

/// Validates that required fields are present and values are usable.
fn validate_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.backend.kind == BackendKind::Filesystem {
        match config.backend.root.as_deref() {
            None => return Err(ConfigError::MissingField("backend.root")),
            Some(root) if root.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    field: "backend.root",
                    reason: "must not be empty".to_string(),
                })
            }
            Some(_) => {}
        }
    }
    positive("backend.page_size", config.backend.page_size as u64)?;
    positive("cache.timeout_ms", config.cache.timeout_ms)?;
    positive(
        "cache.maintenance_timeout_ms",
        config.cache.maintenance_timeout_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReadFailurePolicy;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert!(config.backend.options.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[backend]
kind = "filesystem"
root = "/var/cache/mathstore"
page_size = 250

[backend.options]
bucket = "formulas"
region = "eu-west-1"

[cache]
read_failure = "surface"
timeout_ms = 1500
maintenance_timeout_ms = 60000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Filesystem);
        assert_eq!(config.backend.root.as_deref(), Some("/var/cache/mathstore"));
        assert_eq!(config.backend.page_size, 250);
        assert_eq!(config.backend.options["bucket"], "formulas");
        assert_eq!(config.backend.options["region"], "eu-west-1");
        assert_eq!(config.cache.read_failure, ReadFailurePolicy::Surface);
        assert_eq!(config.cache.timeout_ms, 1500);
        assert_eq!(config.cache.maintenance_timeout_ms, 60000);
    }

    #[test]
    fn filesystem_without_root_errors() {
        let toml = r#"
[backend]
kind = "filesystem"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("backend.root")));
    }

    #[test]
    fn filesystem_with_blank_root_errors() {
        let toml = r#"
[backend]
kind = "filesystem"
root = "  "
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "backend.root",
                ..
            }
        ));
    }

    #[test]
    fn zero_timeout_errors() {
        let err = load_config_from_str("[cache]\ntimeout_ms = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "cache.timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn zero_maintenance_timeout_errors() {
        let err = load_config_from_str("[cache]\nmaintenance_timeout_ms = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "cache.maintenance_timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn zero_page_size_errors() {
        let err = load_config_from_str("[backend]\npage_size = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "backend.page_size",
                ..
            }
        ));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[cache]\nread_failure = \"surface\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.cache.read_failure, ReadFailurePolicy::Surface);
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
