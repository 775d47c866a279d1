//! Configuration module for Danke.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::policy::DEFAULT_EDIT_WINDOW_MINUTES;
use crate::{DankeError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/danke.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/danke.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Authentication configuration.
///
/// Sessions are issued by the external identity provider; Danke only
/// verifies the tokens it signs.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// Shared secret used to verify session tokens (HS256).
    #[serde(default)]
    pub jwt_secret: String,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Moderation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    /// Minutes during which authors may edit their own posts.
    #[serde(default = "default_edit_window")]
    pub edit_window_minutes: u32,
    /// Interval in seconds between scheduled deletion sweeps.
    #[serde(default = "default_sweep_interval")]
    pub deletion_sweep_interval_secs: u64,
}

fn default_edit_window() -> u32 {
    DEFAULT_EDIT_WINDOW_MINUTES as u32
}

fn default_sweep_interval() -> u64 {
    300 // 5 minutes
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            edit_window_minutes: default_edit_window(),
            deletion_sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl ModerationConfig {
    /// The edit window as a duration.
    pub fn edit_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.edit_window_minutes))
    }
}

/// Feature flags exposed to clients.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct FeaturesConfig {
    /// Whether clients should use the multi-step board creation form.
    #[serde(default)]
    pub multi_step_form: bool,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Moderation configuration.
    #[serde(default)]
    pub moderation: ModerationConfig,
    /// Feature flags.
    #[serde(default)]
    pub features: FeaturesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DankeError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DankeError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DANKE_JWT_SECRET`: Override the JWT secret key
    /// - `DANKE_ENABLE_MULTI_STEP_FORM`: Enable the multi-step creation form
    ///   (`true`/`1`/`yes`)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("DANKE_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.auth.jwt_secret = jwt_secret;
            }
        }
        if let Ok(flag) = std::env::var("DANKE_ENABLE_MULTI_STEP_FORM") {
            if let Some(enabled) = parse_flag(&flag) {
                self.features.multi_step_form = enabled;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the JWT secret is not set
    /// - the edit window is zero
    /// - the deletion sweep interval is zero
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(DankeError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via DANKE_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.moderation.edit_window_minutes == 0 {
            return Err(DankeError::Config(
                "moderation.edit_window_minutes must be at least 1".to_string(),
            ));
        }
        if self.moderation.deletion_sweep_interval_secs == 0 {
            return Err(DankeError::Config(
                "moderation.deletion_sweep_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "data/danke.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/danke.log");
        assert!(config.auth.jwt_secret.is_empty());
        assert!(config.auth.cors_origins.is_empty());
        assert_eq!(config.moderation.edit_window_minutes, 10);
        assert_eq!(config.moderation.deletion_sweep_interval_secs, 300);
        assert!(!config.features.multi_step_form);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000

[database]
path = "custom/db.sqlite"

[logging]
level = "debug"
file = "custom/logs/app.log"

[auth]
jwt_secret = "test-secret-key"
cors_origins = ["http://localhost:3000", "http://localhost:5173"]

[moderation]
edit_window_minutes = 15
deletion_sweep_interval_secs = 60

[features]
multi_step_form = true
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, "custom/db.sqlite");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");
        assert_eq!(config.auth.jwt_secret, "test-secret-key");
        assert_eq!(config.auth.cors_origins.len(), 2);
        assert_eq!(config.moderation.edit_window_minutes, 15);
        assert_eq!(config.moderation.edit_window(), chrono::Duration::minutes(15));
        assert_eq!(config.moderation.deletion_sweep_interval_secs, 60);
        assert!(config.features.multi_step_form);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 3000
"#;

        let config = Config::parse(toml).unwrap();

        // Specified values
        assert_eq!(config.server.port, 3000);

        // Default values
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.path, "data/danke.db");
        assert_eq!(config.moderation.edit_window_minutes, 10);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        if let Err(DankeError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[auth]\njwt_secret = \"file-secret\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.auth.jwt_secret, "file-secret");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(DankeError::Io(_))));
    }

    #[test]
    fn test_apply_env_overrides_jwt_secret() {
        let original = std::env::var("DANKE_JWT_SECRET").ok();

        std::env::set_var("DANKE_JWT_SECRET", "env-secret-key");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.auth.jwt_secret, "env-secret-key");

        // Empty values do not override.
        std::env::set_var("DANKE_JWT_SECRET", "");
        let mut config = Config::default();
        config.auth.jwt_secret = "original-secret".to_string();
        config.apply_env_overrides();
        assert_eq!(config.auth.jwt_secret, "original-secret");

        if let Some(val) = original {
            std::env::set_var("DANKE_JWT_SECRET", val);
        } else {
            std::env::remove_var("DANKE_JWT_SECRET");
        }
    }

    #[test]
    fn test_apply_env_overrides_feature_flag() {
        let original = std::env::var("DANKE_ENABLE_MULTI_STEP_FORM").ok();

        std::env::set_var("DANKE_ENABLE_MULTI_STEP_FORM", "true");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert!(config.features.multi_step_form);

        std::env::set_var("DANKE_ENABLE_MULTI_STEP_FORM", "maybe");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert!(!config.features.multi_step_form);

        if let Some(val) = original {
            std::env::set_var("DANKE_ENABLE_MULTI_STEP_FORM", val);
        } else {
            std::env::remove_var("DANKE_ENABLE_MULTI_STEP_FORM");
        }
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(DankeError::Config(_))));

        config.auth.jwt_secret = "secret".to_string();
        assert!(config.validate().is_ok());

        config.moderation.edit_window_minutes = 0;
        assert!(config.validate().is_err());

        config.moderation.edit_window_minutes = 10;
        config.moderation.deletion_sweep_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
