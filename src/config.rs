//! Configuration and settings management
//!
//! Both processes read the same sources: optional `config/*` files, `APP__`
//! prefixed variables, then plain environment variables.

use crate::bot::session::SessionSettings;
use crate::geocoding::DADATA_DEFAULT_URL;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings of the HTTP API process
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiSettings {
    /// Listen address
    #[serde(default = "default_api_host")]
    pub api_host: String,
    /// Listen port
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Path to the SQLite address database
    pub db_name: String,
    /// Dadata API token
    pub dadata_token: String,
    /// Dadata suggestions API root
    #[serde(default = "default_dadata_url")]
    pub dadata_url: String,
}

/// Settings of the Telegram bot process
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BotSettings {
    /// Telegram Bot API token
    pub telegram_token: String,
    /// Chat id of the group users must join
    pub group_id: i64,
    /// Lifetime of cached results, seconds
    pub cache_expire_time: u64,
    /// Anti-spam gate lifetime after a tap, seconds
    pub anti_spam_time: u64,
    /// Upper bound of cached entries
    #[serde(default = "default_cache_max_capacity")]
    pub cache_max_capacity: u64,
    /// File with the help text
    pub start_message_path: Option<PathBuf>,
    /// Root of a running API; when unset the bot resolves in-process
    pub domofomka_api_url: Option<String>,
    /// Address database for in-process resolution
    pub db_name: Option<String>,
    /// Dadata token for in-process location lookups
    pub dadata_token: Option<String>,
    /// Dadata suggestions API root
    #[serde(default = "default_dadata_url")]
    pub dadata_url: String,
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_api_port() -> u16 {
    8000
}

fn default_dadata_url() -> String {
    DADATA_DEFAULT_URL.to_string()
}

const fn default_cache_max_capacity() -> u64 {
    100_000
}

fn builder() -> ConfigBuilder<DefaultState> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Plain UPPER_SNAKE_CASE variables; empty values count as unset
        .add_source(Environment::default().ignore_empty(true))
}

fn load<T: DeserializeOwned>() -> Result<T, ConfigError> {
    builder().build()?.try_deserialize()
}

impl ApiSettings {
    /// Load settings from files and environment
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required setting is missing or invalid.
    pub fn new() -> Result<Self, ConfigError> {
        load()
    }

    /// `host:port` to bind
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

impl BotSettings {
    /// Load settings from files and environment
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use domofomka::config::BotSettings;
    ///
    /// let settings = BotSettings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required setting is missing or invalid.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = load()?;
        settings.validate()?;
        Ok(settings)
    }

    /// In-process resolution needs a database.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` when neither an API nor a database is set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domofomka_api_url.is_none() && self.db_name.is_none() {
            return Err(ConfigError::Message(
                "db_name is required when domofomka_api_url is not set".to_string(),
            ));
        }
        Ok(())
    }

    /// Tunables of the conversation session
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            cache_expire_time: Duration::from_secs(self.cache_expire_time),
            anti_spam_time: Duration::from_secs(self.anti_spam_time),
            start_message_path: self.start_message_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use std::env;

    fn parse<T: DeserializeOwned>(toml: &str) -> Result<T, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn api_defaults_apply() -> Result<(), ConfigError> {
        let settings: ApiSettings = parse(
            r#"
            db_name = "codes.db"
            dadata_token = "secret"
            "#,
        )?;
        assert_eq!(settings.bind_address(), "0.0.0.0:8000");
        assert_eq!(settings.dadata_url, DADATA_DEFAULT_URL);
        Ok(())
    }

    #[test]
    fn api_requires_database() {
        let result: Result<ApiSettings, _> = parse(r#"dadata_token = "secret""#);
        assert!(result.is_err());
    }

    #[test]
    fn bot_session_settings_use_seconds() -> Result<(), ConfigError> {
        let settings: BotSettings = parse(
            r#"
            telegram_token = "1:abc"
            group_id = -100123
            cache_expire_time = 3600
            anti_spam_time = 3
            domofomka_api_url = "http://api:8000"
            "#,
        )?;
        settings.validate()?;

        let session = settings.session_settings();
        assert_eq!(session.cache_expire_time, Duration::from_secs(3600));
        assert_eq!(session.anti_spam_time, Duration::from_secs(3));
        assert!(session.start_message_path.is_none());
        assert_eq!(settings.cache_max_capacity, 100_000);
        Ok(())
    }

    #[test]
    fn bot_without_api_needs_database() -> Result<(), ConfigError> {
        let settings: BotSettings = parse(
            r#"
            telegram_token = "1:abc"
            group_id = 1
            cache_expire_time = 60
            anti_spam_time = 3
            "#,
        )?;
        assert!(settings.validate().is_err());
        Ok(())
    }

    // Single test so environment changes don't race
    #[test]
    fn environment_is_read() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("DB_NAME", "env.db");
        env::set_var("DADATA_TOKEN", "env-token");
        env::set_var("API_PORT", "9100");

        let settings = ApiSettings::new()?;
        assert_eq!(settings.db_name, "env.db");
        assert_eq!(settings.api_port, 9100);

        env::set_var("API_PORT", "");
        let settings = ApiSettings::new()?;
        assert_eq!(settings.api_port, 8000);

        env::remove_var("DB_NAME");
        env::remove_var("DADATA_TOKEN");
        env::remove_var("API_PORT");
        Ok(())
    }
}
