use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{
    DEFAULT_COMMENT_MAX_CHARS, DEFAULT_INSTAGRAM_BASE_URL, DEFAULT_SYNC_MAX_PAGES,
    DEFAULT_TIMEOUT_SECS,
};
use crate::instagram::InstagramSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    // Instagram Graph API
    pub access_token: String,
    pub account_id: String,
    pub instagram_base_url: String,
    pub request_timeout: Duration,

    // Sync / relay policy
    pub sync_max_pages: usize,
    pub sync_on_startup: bool,
    pub comment_max_chars: usize,

    // Database
    pub database_path: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
}

// Hand-written so the access token never ends up in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_token", &"<redacted>")
            .field("account_id", &self.account_id)
            .field("instagram_base_url", &self.instagram_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("sync_max_pages", &self.sync_max_pages)
            .field("sync_on_startup", &self.sync_on_startup)
            .field("comment_max_chars", &self.comment_max_chars)
            .field("database_path", &self.database_path)
            .field("web_host", &self.web_host)
            .field("web_port", &self.web_port)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Instagram Graph API
            access_token: required_env("INSTAGRAM_ACCESS_TOKEN")?,
            account_id: required_env("INSTAGRAM_USER_ID")?,
            instagram_base_url: env_or_default("INSTAGRAM_BASE_URL", DEFAULT_INSTAGRAM_BASE_URL),
            request_timeout: Duration::from_secs(parse_env_u64(
                "INSTAGRAM_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),

            // Sync / relay policy
            sync_max_pages: parse_env_usize("SYNC_MAX_PAGES", DEFAULT_SYNC_MAX_PAGES)?,
            sync_on_startup: parse_env_bool("SYNC_ON_STARTUP", false)?,
            comment_max_chars: parse_env_usize("COMMENT_MAX_CHARS", DEFAULT_COMMENT_MAX_CHARS)?,

            // Database
            database_path: PathBuf::from(env_or_default(
                "DATABASE_PATH",
                "./data/instagram.sqlite",
            )),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
        })
    }

    /// Configuration with harmless defaults, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            access_token: "test-token".to_string(),
            account_id: "17841400000000000".to_string(),
            instagram_base_url: DEFAULT_INSTAGRAM_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sync_max_pages: DEFAULT_SYNC_MAX_PAGES,
            sync_on_startup: false,
            comment_max_chars: DEFAULT_COMMENT_MAX_CHARS,
            database_path: PathBuf::from("./data/test.sqlite"),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "INSTAGRAM_ACCESS_TOKEN".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.account_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "INSTAGRAM_USER_ID".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if url::Url::parse(&self.instagram_base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "INSTAGRAM_BASE_URL".to_string(),
                message: format!("not a valid URL: '{}'", self.instagram_base_url),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "INSTAGRAM_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.sync_max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                name: "SYNC_MAX_PAGES".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.comment_max_chars == 0 {
            return Err(ConfigError::InvalidValue {
                name: "COMMENT_MAX_CHARS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Gateway settings derived from this configuration.
    #[must_use]
    pub fn instagram_settings(&self) -> InstagramSettings {
        InstagramSettings {
            access_token: self.access_token.clone(),
            base_url: self.instagram_base_url.clone(),
            timeout: self.request_timeout,
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}
