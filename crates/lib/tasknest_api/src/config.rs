//! API server configuration.

use thiserror::Error;

/// Access-token lifetime default: 1 hour.
const DEFAULT_ACCESS_TTL_MS: i64 = 3_600_000;

/// Refresh-token lifetime default: 24 hours.
const DEFAULT_REFRESH_TTL_MS: i64 = 86_400_000;

/// Fatal configuration errors. Raised before the listener binds; never
/// swallowed per-request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set; refusing to serve traffic without a signing secret")]
    MissingSecret,

    #[error("{var} is not a valid millisecond count: {value}")]
    InvalidTtl { var: &'static str, value: String },
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret, base64-encoded binary (at least 256 bits).
    pub jwt_secret: String,
    /// Access-token TTL in milliseconds.
    pub access_ttl_ms: i64,
    /// Refresh-token TTL in milliseconds.
    pub refresh_ttl_ms: i64,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable               | Default                                  |
    /// |------------------------|------------------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:8080`                         |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/tasknest`     |
    /// | `JWT_SECRET`           | required                                 |
    /// | `ACCESS_TOKEN_TTL_MS`  | `3600000` (1 hour)                       |
    /// | `REFRESH_TOKEN_TTL_MS` | `86400000` (24 hours)                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => return Err(ConfigError::MissingSecret),
        };
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/tasknest".into()),
            jwt_secret,
            access_ttl_ms: ttl_from_env("ACCESS_TOKEN_TTL_MS", DEFAULT_ACCESS_TTL_MS)?,
            refresh_ttl_ms: ttl_from_env("REFRESH_TOKEN_TTL_MS", DEFAULT_REFRESH_TTL_MS)?,
        })
    }
}

fn ttl_from_env(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse::<i64>()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or(ConfigError::InvalidTtl { var, value }),
        Err(_) => Ok(default),
    }
}
