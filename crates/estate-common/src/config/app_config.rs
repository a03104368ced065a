//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use estate_core::{EventLimits, LifecycleConfig, RegistrationPolicy};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub jwt: JwtConfig,
    pub presence: PresenceConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Server bind configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// JWT configuration
///
/// The secret is shared with the marketplace backend that issues the tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
}

/// Presence and relay behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    #[serde(default)]
    pub registration_policy: RegistrationPolicy,
    #[serde(default = "default_strict_identity")]
    pub strict_identity: bool,
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
}

impl PresenceConfig {
    /// Lifecycle handler settings derived from this config
    #[must_use]
    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            strict_identity: self.strict_identity,
            limits: EventLimits {
                max_content_length: self.max_content_length,
            },
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            registration_policy: RegistrationPolicy::default(),
            strict_identity: default_strict_identity(),
            max_content_length: default_max_content_length(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "realty-gateway".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

fn default_strict_identity() -> bool {
    true
}

fn default_max_content_length() -> usize {
    estate_core::events::DEFAULT_MAX_CONTENT_LENGTH
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// # Errors
    /// Returns an error if required variables are missing or invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            app: AppSettings {
                name: var("APP_NAME").unwrap_or_else(default_app_name),
                env: parse_or(var("APP_ENV"), "APP_ENV", Environment::default)?,
            },
            gateway: ServerConfig {
                host: var("GATEWAY_HOST").unwrap_or_else(default_host),
                port: parse_required(var("GATEWAY_PORT"), "GATEWAY_PORT")?,
            },
            jwt: JwtConfig {
                secret: var("JWT_SECRET").ok_or(ConfigError::MissingVar("JWT_SECRET"))?,
                access_token_expiry: parse_or(
                    var("JWT_ACCESS_TOKEN_EXPIRY"),
                    "JWT_ACCESS_TOKEN_EXPIRY",
                    default_access_token_expiry,
                )?,
            },
            presence: PresenceConfig {
                registration_policy: parse_or(
                    var("PRESENCE_REGISTRATION_POLICY"),
                    "PRESENCE_REGISTRATION_POLICY",
                    RegistrationPolicy::default,
                )?,
                strict_identity: match var("PRESENCE_STRICT_IDENTITY") {
                    Some(v) => parse_bool(&v)
                        .ok_or(ConfigError::InvalidValue("PRESENCE_STRICT_IDENTITY", v))?,
                    None => default_strict_identity(),
                },
                max_content_length: parse_or(
                    var("MESSAGE_MAX_CONTENT_LENGTH"),
                    "MESSAGE_MAX_CONTENT_LENGTH",
                    default_max_content_length,
                )?,
            },
            cors: CorsConfig {
                allowed_origins: var("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }
}

fn parse_required<T: FromStr>(value: Option<String>, key: &'static str) -> Result<T, ConfigError> {
    let value = value.ok_or(ConfigError::MissingVar(key))?;
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key, value))
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    key: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue(key, v)),
        None => Ok(default()),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
