//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREROOM_TOKEN_SECRET` - Token signing secret (min 32 chars)
//! - `STOREROOM_DATABASE_URL` - `PostgreSQL` connection string (postgres
//!   backend only)
//!
//! ## Optional
//! - `STOREROOM_BACKEND` - `memory` or `postgres` (default: memory)
//! - `STOREROOM_DATABASE_URL_RO` - Read-replica connection string
//! - `STOREROOM_TOKEN_TTL_SECS` - Token lifetime in seconds (default: 900)
//! - `STOREROOM_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREROOM_PORT` - Listen port (default: 3000)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const DEFAULT_TOKEN_TTL_SECS: u64 = 900;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which store implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Memory,
    Postgres,
}

impl Backend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            other => Err(ConfigError::InvalidEnvVar(
                "STOREROOM_BACKEND".to_string(),
                format!("expected 'memory' or 'postgres', got '{other}'"),
            )),
        }
    }
}

/// Database connection configuration, required for the postgres backend.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL for writes (contains password)
    pub write_url: SecretString,
    /// Optional read-replica URL; writes' URL is reused when absent
    pub read_url: Option<SecretString>,
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Selected store backend
    pub backend: Backend,
    /// Database settings; `Some` exactly when the backend is postgres
    pub database: Option<DatabaseConfig>,
    /// Token signing secret
    pub token_secret: SecretString,
    /// Token lifetime
    pub token_ttl: Duration,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the token secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend = Backend::parse(&get_env_or_default("STOREROOM_BACKEND", "memory"))?;
        let database = match backend {
            Backend::Memory => None,
            Backend::Postgres => Some(DatabaseConfig {
                write_url: get_required_secret("STOREROOM_DATABASE_URL")?,
                read_url: get_optional_env("STOREROOM_DATABASE_URL_RO").map(SecretString::from),
            }),
        };

        let token_secret = get_required_secret("STOREROOM_TOKEN_SECRET")?;
        validate_token_secret(&token_secret, "STOREROOM_TOKEN_SECRET")?;
        let token_ttl = parse_ttl(&get_env_or_default(
            "STOREROOM_TOKEN_TTL_SECS",
            &DEFAULT_TOKEN_TTL_SECS.to_string(),
        ))?;

        let host = get_env_or_default("STOREROOM_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREROOM_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("STOREROOM_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREROOM_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            backend,
            database,
            token_secret,
            token_ttl,
            host,
            port,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_ttl(value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| {
            ConfigError::InvalidEnvVar("STOREROOM_TOKEN_TTL_SECS".to_string(), e.to_string())
        })
}

/// Validate that a token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_TOKEN_SECRET_LENGTH} characters"),
        ));
    }
    Ok(())
}
