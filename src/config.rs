// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup. The signing key and token lifetimes are handed to
//! the token issuer and authenticator at construction and never re-read.

use chrono::Duration;
use std::env;

/// Minimum accepted length of the HS256 signing key.
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

const DEFAULT_ISSUER: &str = "simply-track";
const DEFAULT_AUDIENCE: &str = "simply-track-clients";
const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Which storage backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseBackend {
    Firestore,
    /// Process-local store; data is lost on restart.
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub database_backend: DatabaseBackend,

    /// JWT signing key for access tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// `iss` claim issued and required
    pub jwt_issuer: String,
    /// `aud` claim issued and required
    pub jwt_audience: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            database_backend: DatabaseBackend::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            jwt_issuer: DEFAULT_ISSUER.to_string(),
            jwt_audience: DEFAULT_AUDIENCE.to_string(),
            access_token_ttl: Duration::minutes(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            refresh_token_ttl: Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .trim()
            .as_bytes()
            .to_vec();
        if jwt_signing_key.len() < MIN_SIGNING_KEY_BYTES {
            return Err(ConfigError::Invalid(
                "JWT_SIGNING_KEY",
                format!("must be at least {} bytes", MIN_SIGNING_KEY_BYTES),
            ));
        }

        let database_backend = match env::var("DATABASE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_lowercase()
            .as_str()
        {
            "firestore" => DatabaseBackend::Firestore,
            "memory" => DatabaseBackend::Memory,
            other => {
                return Err(ConfigError::Invalid(
                    "DATABASE_BACKEND",
                    format!("unknown backend '{}'", other),
                ))
            }
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_backend,
            jwt_signing_key,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string()),
            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| DEFAULT_AUDIENCE.to_string()),
            access_token_ttl: Duration::minutes(positive_int_var(
                "ACCESS_TOKEN_TTL_MINUTES",
                DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
            )?),
            refresh_token_ttl: Duration::days(positive_int_var(
                "REFRESH_TOKEN_TTL_DAYS",
                DEFAULT_REFRESH_TOKEN_TTL_DAYS,
            )?),
        })
    }
}

fn positive_int_var(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().parse::<i64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::Invalid(
                name,
                format!("expected a positive integer, got '{}'", raw),
            )),
        },
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so env mutations don't race with each other.
    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "short");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("JWT_SIGNING_KEY", _))
        ));

        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!!");
        env::set_var("DATABASE_BACKEND", "memory");
        env::set_var("ACCESS_TOKEN_TTL_MINUTES", "5");
        env::remove_var("REFRESH_TOKEN_TTL_DAYS");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.database_backend, DatabaseBackend::Memory);
        assert_eq!(config.access_token_ttl, Duration::minutes(5));
        assert_eq!(config.refresh_token_ttl, Duration::days(30));
        assert_eq!(config.jwt_issuer, "simply-track");
        assert_eq!(config.port, 8080);

        env::set_var("ACCESS_TOKEN_TTL_MINUTES", "-1");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("ACCESS_TOKEN_TTL_MINUTES", _))
        ));

        env::set_var("ACCESS_TOKEN_TTL_MINUTES", "15");
        env::set_var("DATABASE_BACKEND", "postgres");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("DATABASE_BACKEND", _))
        ));
    }
}
