//! Configuration loading for the back-office API.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `BACKOFFICE_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENV_PREFIX: &str = "BACKOFFICE_";
const MIN_JWT_SECRET_LEN: usize = 32;

/// Application configuration derived from `BACKOFFICE_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_jwt_ttl_seconds")]
    pub jwt_ttl_seconds: u64,
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,
    #[serde(default = "default_verification_code_ttl_hours")]
    pub verification_code_ttl_hours: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cors_allowed_origins: Vec<String>,
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite://backoffice.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_jwt_ttl_seconds() -> u64 {
    86_400
}

fn default_password_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_verification_code_ttl_hours() -> u64 {
    24
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            jwt_secret: None,
            jwt_ttl_seconds: default_jwt_ttl_seconds(),
            password_hash_cost: default_password_hash_cost(),
            verification_code_ttl_hours: default_verification_code_ttl_hours(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Parses the configured bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.api_bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr {
                value: self.api_bind_addr.clone(),
            })
    }

    /// Local and test profiles relax secret-strength requirements.
    pub fn is_development(&self) -> bool {
        matches!(self.profile.as_str(), "local" | "test")
    }

    /// Serializes the configuration with secrets replaced by `[REDACTED]`.
    pub fn redacted_json(&self) -> Result<String, serde_json::Error> {
        let mut config = self.clone();
        if config.jwt_secret.is_some() {
            config.jwt_secret = Some("[REDACTED]".to_string());
        }
        if let Some((scheme, _)) = config.database_url.split_once("://")
            && config.database_url.contains('@')
        {
            config.database_url = format!("{scheme}://[REDACTED]");
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning an error if required settings are missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        let Some(secret) = self.jwt_secret.as_deref() else {
            return Err(ConfigError::MissingJwtSecret);
        };
        if !self.is_development() && secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::WeakJwtSecret {
                length: secret.len(),
            });
        }

        if !(4..=31).contains(&self.password_hash_cost) {
            return Err(ConfigError::InvalidPasswordHashCost {
                value: self.password_hash_cost,
            });
        }

        if self.jwt_ttl_seconds == 0 {
            return Err(ConfigError::InvalidJwtTtl);
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidDbMaxConnections);
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        Ok(())
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid bind address: {value}")]
    InvalidBindAddr { value: String },
    #[error("BACKOFFICE_JWT_SECRET is required")]
    MissingJwtSecret,
    #[error("JWT secret must be at least 32 bytes outside local/test profiles, got {length}")]
    WeakJwtSecret { length: usize },
    #[error("password hash cost must be between 4 and 31, got {value}")]
    InvalidPasswordHashCost { value: u32 },
    #[error("JWT TTL must be positive")]
    InvalidJwtTtl,
    #[error("database pool needs at least one connection")]
    InvalidDbMaxConnections,
    #[error("log format must be `json` or `pretty`, got {value}")]
    InvalidLogFormat { value: String },
}

/// Loads configuration using layered `.env` files and `BACKOFFICE_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads configuration: `.env`, `.env.local`, `.env.<profile>`, `.env.<profile>.local`,
    /// then the process environment, later sources winning.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let mut take = |key: &str| layered.remove(key).filter(|v| !v.trim().is_empty());

        let profile = take("PROFILE").unwrap_or(profile_hint);
        let api_bind_addr = take("API_BIND_ADDR").unwrap_or_else(default_api_bind_addr);
        let log_level = take("LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format = take("LOG_FORMAT").unwrap_or_else(default_log_format);
        let database_url = take("DATABASE_URL").unwrap_or_else(default_database_url);
        let db_max_connections = parse_or(
            "DB_MAX_CONNECTIONS",
            take("DB_MAX_CONNECTIONS"),
            default_db_max_connections,
        )?;
        let db_acquire_timeout_ms = parse_or(
            "DB_ACQUIRE_TIMEOUT_MS",
            take("DB_ACQUIRE_TIMEOUT_MS"),
            default_db_acquire_timeout_ms,
        )?;
        let jwt_secret = take("JWT_SECRET").map(|s| s.trim().to_string());
        let jwt_ttl_seconds = parse_or(
            "JWT_TTL_SECONDS",
            take("JWT_TTL_SECONDS"),
            default_jwt_ttl_seconds,
        )?;
        let password_hash_cost = parse_or(
            "PASSWORD_HASH_COST",
            take("PASSWORD_HASH_COST"),
            default_password_hash_cost,
        )?;
        let verification_code_ttl_hours = parse_or(
            "VERIFICATION_CODE_TTL_HOURS",
            take("VERIFICATION_CODE_TTL_HOURS"),
            default_verification_code_ttl_hours,
        )?;
        let cors_allowed_origins = take("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            jwt_secret,
            jwt_ttl_seconds,
            password_hash_cost,
            verification_code_ttl_hours,
            cors_allowed_origins,
        })
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: fn() -> T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default()),
    }
}
