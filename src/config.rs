//! Runtime configuration
//!
//! Everything comes from the environment (a `.env` file is loaded by the
//! binary before this runs): per-upstream API keys, the snapshot TTL, and the
//! data directory. API keys are optional at load time; a missing key only
//! fails when the dataset that needs it is actually used.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use thiserror::Error;

/// Default snapshot TTL in hours, shared by all datasets
const DEFAULT_TTL_HOURS: u64 = 6;

/// Errors raised while loading or using the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable required by the requested dataset is unset
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// An environment variable is set but does not parse
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },

    /// No data directory could be determined (no home directory)
    #[error("could not determine a data directory; set COVCACHE_DATA_DIR")]
    NoDataDir,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenWeatherMap API key (`OWM_API_KEY`)
    pub owm_api_key: Option<String>,
    /// Naver application client id (`NAVER_CLIENT_ID`)
    pub naver_client_id: Option<String>,
    /// Naver application client secret (`NAVER_CLIENT_SECRET`)
    pub naver_client_secret: Option<String>,
    /// data.go.kr service key, shared by the three government datasets
    /// (`DATA_GO_KR_KEY`)
    pub data_go_kr_key: Option<String>,
    /// Snapshot time-to-live, identical across datasets
    pub ttl: Duration,
    /// Directory holding the metadata and dataset stores
    pub data_dir: PathBuf,
}

impl Config {
    /// Loads the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let ttl_hours = match env::var("COVCACHE_TTL_HOURS") {
            Ok(value) => value.parse::<u64>().map_err(|_| ConfigError::InvalidVar {
                name: "COVCACHE_TTL_HOURS",
                value,
            })?,
            Err(_) => DEFAULT_TTL_HOURS,
        };

        let data_dir = match env::var("COVCACHE_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => ProjectDirs::from("", "", "covcache")
                .ok_or(ConfigError::NoDataDir)?
                .data_dir()
                .to_path_buf(),
        };

        Ok(Self {
            owm_api_key: env::var("OWM_API_KEY").ok(),
            naver_client_id: env::var("NAVER_CLIENT_ID").ok(),
            naver_client_secret: env::var("NAVER_CLIENT_SECRET").ok(),
            data_go_kr_key: env::var("DATA_GO_KR_KEY").ok(),
            ttl: Duration::from_secs(ttl_hours * 3600),
            data_dir,
        })
    }

    /// OpenWeatherMap key, required by the weather dataset
    pub fn require_owm_key(&self) -> Result<&str, ConfigError> {
        require("OWM_API_KEY", &self.owm_api_key)
    }

    /// Naver credentials, required by the news dataset
    pub fn require_naver_keys(&self) -> Result<(&str, &str), ConfigError> {
        Ok((
            require("NAVER_CLIENT_ID", &self.naver_client_id)?,
            require("NAVER_CLIENT_SECRET", &self.naver_client_secret)?,
        ))
    }

    /// data.go.kr service key, required by the government datasets
    pub fn require_data_go_kr_key(&self) -> Result<&str, ConfigError> {
        require("DATA_GO_KR_KEY", &self.data_go_kr_key)
    }
}

fn require<'a>(name: &'static str, value: &'a Option<String>) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_config() -> Config {
        Config {
            owm_api_key: None,
            naver_client_id: None,
            naver_client_secret: None,
            data_go_kr_key: None,
            ttl: Duration::from_secs(DEFAULT_TTL_HOURS * 3600),
            data_dir: PathBuf::from("/tmp/covcache-test"),
        }
    }

    #[test]
    fn test_missing_key_names_the_variable() {
        let config = bare_config();
        match config.require_owm_key() {
            Err(ConfigError::MissingVar(name)) => assert_eq!(name, "OWM_API_KEY"),
            other => panic!("Expected MissingVar, got {:?}", other),
        }
    }

    #[test]
    fn test_present_key_is_returned() {
        let config = Config {
            owm_api_key: Some("abc123".to_string()),
            ..bare_config()
        };
        assert_eq!(config.require_owm_key().unwrap(), "abc123");
    }

    #[test]
    fn test_naver_requires_both_halves() {
        let config = Config {
            naver_client_id: Some("id".to_string()),
            ..bare_config()
        };
        match config.require_naver_keys() {
            Err(ConfigError::MissingVar(name)) => assert_eq!(name, "NAVER_CLIENT_SECRET"),
            other => panic!("Expected MissingVar, got {:?}", other),
        }
    }
}
