//! Configuration management
//!
//! Configuration is loaded from `config.yml` and may be overridden with
//! `YANEWS_*` environment variables. Missing values are filled with defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub comments: CommentsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, `sqlite:` URL or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/yanews.db".to_string()
}

/// Home page listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Maximum number of news items on the home page
    #[serde(default = "default_news_count_on_home_page")]
    pub news_count_on_home_page: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            news_count_on_home_page: default_news_count_on_home_page(),
        }
    }
}

fn default_news_count_on_home_page() -> u32 {
    10
}

/// Comment moderation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsConfig {
    /// Words that block a comment when found anywhere in its text
    #[serde(default = "default_bad_words")]
    pub bad_words: Vec<String>,
    /// Error shown on the `text` field when a bad word is found
    #[serde(default = "default_warning")]
    pub warning: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            bad_words: default_bad_words(),
            warning: default_warning(),
        }
    }
}

fn default_bad_words() -> Vec<String> {
    vec!["редиска".to_string(), "негодяй".to_string()]
}

fn default_warning() -> String {
    "Не ругайтесь!".to_string()
}

/// Authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_expiration_days")]
    pub session_expiration_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_expiration_days: default_session_expiration_days(),
        }
    }
}

/// Accepted values for `auth.session_expiration_days`
pub const SESSION_EXPIRATION_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=3650;

fn default_session_expiration_days() -> i64 {
    7
}

/// Template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Directory whose `.html` files replace the embedded templates by name
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file.
    ///
    /// A missing or empty file yields the default configuration. Invalid YAML
    /// is an error that names the line and column.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, then apply environment variable overrides:
    ///
    /// - YANEWS_SERVER_HOST
    /// - YANEWS_SERVER_PORT
    /// - YANEWS_DATABASE_URL
    /// - YANEWS_NEWS_COUNT_ON_HOME_PAGE
    /// - YANEWS_BAD_WORDS (comma separated)
    /// - YANEWS_WARNING
    /// - YANEWS_THEME_PATH
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.news.news_count_on_home_page == 0 {
            return Err(ConfigError::ValidationError(
                "news.news_count_on_home_page must be at least 1".to_string(),
            ));
        }
        if !SESSION_EXPIRATION_DAYS_RANGE.contains(&self.auth.session_expiration_days) {
            return Err(ConfigError::ValidationError(format!(
                "auth.session_expiration_days must be between {} and {}",
                SESSION_EXPIRATION_DAYS_RANGE.start(),
                SESSION_EXPIRATION_DAYS_RANGE.end()
            )));
        }
        if self.comments.bad_words.iter().any(|w| w.is_empty()) {
            return Err(ConfigError::ValidationError(
                "comments.bad_words must not contain empty words".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("YANEWS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("YANEWS_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(url) = std::env::var("YANEWS_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(count) = std::env::var("YANEWS_NEWS_COUNT_ON_HOME_PAGE") {
            if let Ok(count) = count.parse::<u32>() {
                self.news.news_count_on_home_page = count;
            }
        }

        if let Ok(words) = std::env::var("YANEWS_BAD_WORDS") {
            self.comments.bad_words = words
                .split(',')
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(warning) = std::env::var("YANEWS_WARNING") {
            self.comments.warning = warning;
        }

        if let Ok(path) = std::env::var("YANEWS_THEME_PATH") {
            self.theme.path = Some(PathBuf::from(path));
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
