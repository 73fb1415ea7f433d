//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub storage: StorageConfig,
    pub chatbot: ChatbotConfig,
    pub preservation: PreservationConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Credential verification settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session secret key (32+ bytes)
    pub session_secret: String,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
}

/// Bootstrap administrator, created or refreshed on start-up
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_name")]
    pub name: String,
    pub email: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

/// Local media storage for story uploads
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded files are written to
    pub media_dir: PathBuf,
    /// Public URL prefix under which `media_dir` is served
    pub public_url: String,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

/// Generative AI chat endpoint and its outbound rate limits
#[derive(Debug, Clone, Deserialize)]
pub struct ChatbotConfig {
    /// API key; chat answers 503 while unset
    pub api_key: Option<String>,
    /// Base URL of the models endpoint
    pub api_url: String,
    /// Model name appended to `api_url`
    pub model: String,
    pub timeout_seconds: u64,
    /// Outbound calls allowed per window (default: 10)
    pub max_requests_per_window: usize,
    pub window_seconds: u64,
    /// Cooldown after the upstream reports quota exhaustion
    pub quota_cooldown_seconds: u64,
    /// Interval of the background prune task
    pub prune_interval_seconds: u64,
}

impl ChatbotConfig {
    /// API key, if one is configured and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Image comparison collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct PreservationConfig {
    /// Base URL exposing `/compare` and `/health`
    pub service_url: String,
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (GOMPA__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "data/gompa.db")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("admin.name", "Administrator")?
            .set_default("admin.email", "admin@gompa.local")?
            .set_default("storage.media_dir", "data/uploads")?
            .set_default("storage.public_url", "http://127.0.0.1:8080/uploads")?
            .set_default("storage.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default(
                "chatbot.api_url",
                "https://generativelanguage.googleapis.com/v1beta/models",
            )?
            .set_default("chatbot.model", "gemini-1.5-flash")?
            .set_default("chatbot.timeout_seconds", 30)?
            .set_default("chatbot.max_requests_per_window", 10)?
            .set_default("chatbot.window_seconds", 60)?
            .set_default("chatbot.quota_cooldown_seconds", 60)?
            .set_default("chatbot.prune_interval_seconds", 60)?
            .set_default("preservation.service_url", "http://127.0.0.1:5001")?
            .set_default("preservation.timeout_seconds", 60)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (GOMPA__*)
            .add_source(
                Environment::with_prefix("GOMPA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if self.auth.session_secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "auth.session_secret must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        if self.auth.session_max_age <= 0 {
            return Err(AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.admin.email.trim().is_empty() {
            return Err(AppError::Config("admin.email must not be empty".to_string()));
        }

        for (key, value) in [
            ("chatbot.api_url", &self.chatbot.api_url),
            ("preservation.service_url", &self.preservation.service_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::Config(format!("{key} is not a valid URL: {e}")))?;
        }

        if self.chatbot.max_requests_per_window == 0 || self.chatbot.window_seconds == 0 {
            return Err(AppError::Config(
                "chatbot.max_requests_per_window and chatbot.window_seconds must be greater than 0"
                    .to_string(),
            ));
        }

        if self.chatbot.api_key().is_none() {
            tracing::warn!("chatbot.api_key is not set; chat requests will answer 503");
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/gompa-test.db"),
            },
            auth: AuthConfig {
                session_secret: "x".repeat(32),
                session_max_age: 604_800,
            },
            admin: AdminConfig {
                name: "Administrator".to_string(),
                email: "admin@example.com".to_string(),
            },
            storage: StorageConfig {
                media_dir: PathBuf::from("/tmp/gompa-test-media"),
                public_url: "http://localhost:8080/uploads".to_string(),
                max_upload_bytes: 1024 * 1024,
            },
            chatbot: ChatbotConfig {
                api_key: None,
                api_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
                model: "gemini-1.5-flash".to_string(),
                timeout_seconds: 30,
                max_requests_per_window: 10,
                window_seconds: 60,
                quota_cooldown_seconds: 60,
                prune_interval_seconds: 60,
            },
            preservation: PreservationConfig {
                service_url: "http://127.0.0.1:5001".to_string(),
                timeout_seconds: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_session_secret() {
        let mut config = valid_config();
        config.auth.session_secret = "short-secret".to_string();

        let error = config
            .validate()
            .expect_err("session secret shorter than 32 bytes must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.session_secret")
        ));
    }

    #[test]
    fn validate_rejects_malformed_service_url() {
        let mut config = valid_config();
        config.preservation.service_url = "not a url".to_string();

        let error = config
            .validate()
            .expect_err("service url must parse");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("preservation.service_url")
        ));
    }

    #[test]
    fn blank_api_key_counts_as_unset() {
        let mut config = valid_config();
        config.chatbot.api_key = Some("   ".to_string());
        assert!(config.chatbot.api_key().is_none());

        config.chatbot.api_key = Some("key".to_string());
        assert_eq!(config.chatbot.api_key(), Some("key"));
    }
}
