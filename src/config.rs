use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Environment variable overriding the service address of the config file
pub const API_URL_ENV: &str = "ROOMCAL_API_URL";

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address of the scheduling service
    pub api_url: String,

    /// Seconds before giving up on a request
    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            timeout_secs: 5,
            user_agent: format!("roomcal/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// Priority, from the highest: `api_url` argument, `ROOMCAL_API_URL`,
    /// config file (`path` or the default location), defaults.
    pub fn load(path: Option<&Path>, api_url: Option<&str>) -> Result<Self> {
        let file = path.map(Path::to_path_buf).or_else(default_path);
        let env = std::env::var(API_URL_ENV).ok();

        Self::resolve(file.as_deref(), env.as_deref(), api_url)
    }

    fn resolve(file: Option<&Path>, env: Option<&str>, api_url: Option<&str>) -> Result<Self> {
        let mut config = match file {
            Some(path) if path.exists() => {
                info!(config = %path.display(), "loading config");
                Self::from_file(path)?
            }
            _ => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };

        if let Some(url) = env.filter(|url| !url.is_empty()) {
            debug!(url, "service address from {API_URL_ENV}");
            config.api_url = url.to_owned();
        }
        if let Some(url) = api_url {
            config.api_url = url.to_owned();
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;

        toml::from_str(&raw).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `<config dir>/roomcal/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("roomcal").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file() {
        let config = Config::resolve(None, None, None).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, "http://127.0.0.1:8000");
        assert_eq!(config.timeout_secs, 5);
        assert!(config.user_agent.starts_with("roomcal/"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::resolve(Some(Path::new("/nonexistent/roomcal.toml")), None, None);

        assert_eq!(config.unwrap(), Config::default());
    }

    #[test]
    fn file_values_with_defaults_for_the_rest() {
        let file = config_file("api_url = \"http://scheduler.lan:9000\"\ntimeout_secs = 30\n");
        let config = Config::resolve(Some(file.path()), None, None).unwrap();

        assert_eq!(config.api_url, "http://scheduler.lan:9000");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.user_agent, Config::default().user_agent);
    }

    #[test]
    fn environment_then_argument_win() {
        let file = config_file("api_url = \"http://from-file\"\n");

        let config = Config::resolve(Some(file.path()), Some("http://from-env"), None).unwrap();
        assert_eq!(config.api_url, "http://from-env");

        let config =
            Config::resolve(Some(file.path()), Some("http://from-env"), Some("http://from-arg"))
                .unwrap();
        assert_eq!(config.api_url, "http://from-arg");

        let config = Config::resolve(Some(file.path()), Some(""), None).unwrap();
        assert_eq!(config.api_url, "http://from-file");
    }

    #[test]
    fn invalid_file_is_reported() {
        let file = config_file("timeout_secs = \"soon\"\n");

        let err = Config::resolve(Some(file.path()), None, None).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("invalid config file"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = config_file("api = \"http://typo\"\n");

        assert!(Config::resolve(Some(file.path()), None, None).is_err());
    }
}
