//! Configuration loading for the ingest service
//!
//! Each setting is resolved once at start-up in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing default config file is not an error; an explicitly named one is.
//! API credentials have no default and must come from one of the first three
//! tiers.

use crate::api::ApiCredentials;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG: &str = "POCKETLIFE_CONFIG";
pub const ENV_BIND: &str = "POCKETLIFE_BIND";
pub const ENV_DATABASE: &str = "POCKETLIFE_DATABASE";
pub const ENV_API_USERNAME: &str = "POCKETLIFE_API_USERNAME";
pub const ENV_API_PASSWORD: &str = "POCKETLIFE_API_PASSWORD";
pub const ENV_REALM: &str = "POCKETLIFE_REALM";
pub const ENV_REDACT_ERRORS: &str = "POCKETLIFE_REDACT_ERRORS";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5780";
pub const DEFAULT_REALM: &str = "Telemetry API";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub bind_addr: Option<String>,
    pub database_path: Option<PathBuf>,
    pub api_username: Option<String>,
    pub api_password: Option<String>,
    pub realm: Option<String>,
    pub redact_errors: Option<bool>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }
}

/// Values given on the command line (tier 1)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub database_path: Option<PathBuf>,
    pub api_username: Option<String>,
    pub api_password: Option<String>,
    pub realm: Option<String>,
    /// `--redact-errors` flag; `false` means "not given"
    pub redact_errors: bool,
}

/// Fully resolved service configuration, read-only after start-up
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub credentials: ApiCredentials,
    /// Realm announced in `WWW-Authenticate`
    pub realm: String,
    /// Replace internal error details in 500 responses
    pub redact_errors: bool,
    pub log_level: String,
    /// Config file that was read, if any
    pub config_file: Option<PathBuf>,
}

impl ServiceConfig {
    /// Resolve every setting through the four tiers
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let config_file = config_file_path(cli)?;
        let toml_config = match &config_file {
            Some(path) => TomlConfig::load(path)?,
            None => TomlConfig::default(),
        };

        let mut config = Self::resolve_with(cli, &toml_config)?;
        config.config_file = config_file;
        Ok(config)
    }

    /// Resolve against an already loaded TOML config
    pub fn resolve_with(cli: &CliOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let bind_addr = pick(cli.bind_addr.clone(), ENV_BIND, toml_config.bind_addr.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", bind_addr, e)))?;

        let database_path = cli
            .database_path
            .clone()
            .or_else(|| env_value(ENV_DATABASE).map(PathBuf::from))
            .or_else(|| toml_config.database_path.clone())
            .unwrap_or_else(default_database_path);

        let username = pick(cli.api_username.clone(), ENV_API_USERNAME, toml_config.api_username.clone())
            .ok_or_else(|| missing_credential("API username", "--api-username", ENV_API_USERNAME, "api_username"))?;
        let password = pick(cli.api_password.clone(), ENV_API_PASSWORD, toml_config.api_password.clone())
            .ok_or_else(|| missing_credential("API password", "--api-password", ENV_API_PASSWORD, "api_password"))?;

        let realm = pick(cli.realm.clone(), ENV_REALM, toml_config.realm.clone())
            .unwrap_or_else(|| DEFAULT_REALM.to_string());
        if realm.contains('"') {
            return Err(Error::Config("Realm must not contain '\"'".to_string()));
        }
        if let Some(bad) = realm.chars().find(|c| !is_header_safe(*c)) {
            return Err(Error::Config(format!(
                "Realm must be printable ASCII, found {:?}",
                bad
            )));
        }

        let redact_errors = if cli.redact_errors {
            true
        } else if let Some(raw) = env_value(ENV_REDACT_ERRORS) {
            parse_bool(&raw)
                .ok_or_else(|| Error::Config(format!("{} must be true or false, got '{}'", ENV_REDACT_ERRORS, raw)))?
        } else {
            toml_config.redact_errors.unwrap_or(false)
        };

        Ok(Self {
            bind_addr,
            database_path,
            credentials: ApiCredentials::new(username, password),
            realm,
            redact_errors,
            log_level: toml_config.logging.level.clone(),
            config_file: None,
        })
    }
}

/// CLI value, then environment, then TOML; blank strings count as unset
fn pick(cli: Option<String>, env_var: &str, toml_value: Option<String>) -> Option<String> {
    cli.filter(|v| !v.trim().is_empty())
        .or_else(|| env_value(env_var))
        .or_else(|| toml_value.filter(|v| !v.trim().is_empty()))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Characters allowed in a quoted `WWW-Authenticate` parameter
fn is_header_safe(c: char) -> bool {
    c == '\t' || (' '..='~').contains(&c)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn missing_credential(what: &str, flag: &str, env_var: &str, toml_key: &str) -> Error {
    Error::Config(format!(
        "{} not configured. Please configure using one of:\n\
         1. Command line: {} <value>\n\
         2. Environment: {}=<value>\n\
         3. TOML config: {} = \"<value>\"",
        what, flag, env_var, toml_key
    ))
}

/// Config file to read, if any
///
/// An explicit path (CLI or environment) must exist. The platform default is
/// used only when present.
fn config_file_path(cli: &CliOverrides) -> Result<Option<PathBuf>> {
    let explicit = cli
        .config_file
        .clone()
        .or_else(|| env_value(ENV_CONFIG).map(PathBuf::from));

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!("Config file not found: {}", path.display())));
        }
        return Ok(Some(path));
    }

    Ok(default_config_path().filter(|path| path.exists()))
}

/// `<config dir>/pocketlife/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pocketlife").join("config.toml"))
}

/// `<data dir>/pocketlife/telemetry.db` for the current platform
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("pocketlife"))
        .unwrap_or_else(|| PathBuf::from("./pocketlife_data"))
        .join("telemetry.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_toml_config_parses_all_keys() {
        let config: TomlConfig = toml::from_str(
            r#"
            bind_addr = "0.0.0.0:9000"
            database_path = "/tmp/t.db"
            api_username = "u"
            api_password = "p"
            realm = "Probe"
            redact_errors = true

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_addr.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/t.db")));
        assert_eq!(config.redact_errors, Some(true));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_toml_config_rejects_unknown_keys() {
        let result: std::result::Result<TomlConfig, _> = toml::from_str("api_user = \"u\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_defaults_when_table_missing() {
        let config: TomlConfig = toml::from_str("api_username = \"u\"").unwrap();
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_default_database_path_file_name() {
        assert!(default_database_path().ends_with("telemetry.db"));
    }
}
