//! Settings file.
//!
//! A small JSON document read once at startup:
//!
//! ```json
//! { "host": "http://localhost:8080" }
//! ```
//!
//! `host` is where notifications go; events are posted to `{host}/event`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Base URL of the notification receiver.  Older config files spell the
    /// key `Host`.
    #[serde(alias = "Host")]
    pub host: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Read and validate the settings file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("`host` must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_host() {
        let file = write_config(r#"{ "host": "http://localhost:8080" }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.host, "http://localhost:8080");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let file = write_config(r#"{ "host": "http://h", "Extra": 1 }"#);
        assert_eq!(Config::load(file.path()).unwrap().host, "http://h");
    }

    #[test]
    fn capitalised_host_key_is_accepted() {
        let file = write_config(r#"{ "Host": "http://localhost:8080" }"#);
        assert_eq!(
            Config::load(file.path()).unwrap().host,
            "http://localhost:8080"
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }), "got {err:?}");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = write_config("{ host: ");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn empty_host_is_invalid() {
        let file = write_config(r#"{ "host": "  " }"#);
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }
}
