use std::path::Path;

use serde::Deserialize;

use coursebook_base::{CoursebookError, CoursebookResult};

/// Configuration for a coursebook server, read from `coursebook.toml`.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on. Absent means an OS-assigned port.
    #[serde(default)]
    pub port: Option<u16>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
        }
    }
}

/// Load the configuration from the given path.
///
/// A missing file is not an error; defaults apply. A file that exists but
/// does not parse is an error, so a typo never silently falls back.
pub fn load_config(path: &Path) -> CoursebookResult<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|e| {
        Box::new(CoursebookError::message(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        )))
    })?;

    toml::from_str(&raw).map_err(|e| {
        Box::new(CoursebookError::message(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, None);
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str("host = \"0.0.0.0\"\nport = 8080\n").unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, Some(8080));
    }

    #[test]
    fn test_parse_partial_config_applies_defaults() {
        let config: Config = toml::from_str("port = 3000\n").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, Some(3000));
    }

    #[test]
    fn test_broken_config_is_an_error() {
        let result: Result<Config, _> = toml::from_str("port = \"yes\"");
        assert!(result.is_err());
    }
}
