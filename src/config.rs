// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Every recognized key is listed in [`Config::RECOGNIZED_KEYS`]. Values are
//! parsed and validated once at startup; a malformed value is an error rather
//! than a silent fallback to the default.

use sha2::{Digest, Sha256};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_DATABASE_URL: &str = "sqlite://running_log.db?mode=rwc";
const DEFAULT_PLAN_PATH: &str = "config/plan.yaml";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/strava/callback";
pub const STRAVA_API_URL: &str = "https://www.strava.com/api/v3";
pub const STRAVA_OAUTH_URL: &str = "https://www.strava.com/oauth";

/// Minimum length of the session signing key in bytes.
const MIN_SIGNING_KEY_LEN: usize = 32;

/// Longest Strava lookback window in days.
pub const MAX_SYNC_DAYS: u32 = 3650;

/// Strava OAuth application credentials.
#[derive(Debug, Clone)]
pub struct StravaCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// sqlx connection string for the run store
    pub database_url: String,
    /// Path to the YAML training plan
    pub plan_path: PathBuf,
    /// SHA-256 digest of the login password (the plaintext is not kept)
    pub password_digest: [u8; 32],
    /// Signing key for session JWTs and OAuth state (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// Frontend URL for CORS and post-OAuth redirects
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    /// Strava OAuth app credentials; `None` disables the integration
    pub strava: Option<StravaCredentials>,
    /// Callback URL registered with Strava
    pub strava_redirect_uri: String,
    /// Lookback window for activity sync
    pub strava_sync_days: u32,
    /// Timeout for each Strava request
    pub strava_timeout_secs: u64,
    /// Strava REST API base URL
    pub strava_api_url: String,
    /// Strava OAuth base URL (authorize, token, deauthorize)
    pub strava_oauth_url: String,
}

impl Config {
    /// Every environment variable the application reads.
    pub const RECOGNIZED_KEYS: &'static [&'static str] = &[
        "DATABASE_URL",
        "PLAN_PATH",
        "RUNNING_LOG_PASSWORD",
        "SESSION_SIGNING_KEY",
        "FRONTEND_URL",
        "PORT",
        "STRAVA_CLIENT_ID",
        "STRAVA_CLIENT_SECRET",
        "STRAVA_REDIRECT_URI",
        "STRAVA_SYNC_DAYS",
        "STRAVA_TIMEOUT_SECS",
        "STRAVA_API_URL",
        "STRAVA_OAUTH_URL",
    ];

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let password =
            get("RUNNING_LOG_PASSWORD").ok_or(ConfigError::Missing("RUNNING_LOG_PASSWORD"))?;
        let signing_key = get("SESSION_SIGNING_KEY")
            .ok_or(ConfigError::Missing("SESSION_SIGNING_KEY"))?
            .into_bytes();
        if signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid {
                key: "SESSION_SIGNING_KEY",
                reason: format!("must be at least {} bytes", MIN_SIGNING_KEY_LEN),
            });
        }

        let strava = match (get("STRAVA_CLIENT_ID"), get("STRAVA_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(StravaCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("STRAVA_CLIENT_SECRET")),
            (None, Some(_)) => return Err(ConfigError::Missing("STRAVA_CLIENT_ID")),
        };

        let strava_sync_days: u32 = parse_or(get("STRAVA_SYNC_DAYS"), "STRAVA_SYNC_DAYS", 30)?;
        if !(1..=MAX_SYNC_DAYS).contains(&strava_sync_days) {
            return Err(ConfigError::Invalid {
                key: "STRAVA_SYNC_DAYS",
                reason: format!("must be between 1 and {}", MAX_SYNC_DAYS),
            });
        }

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            plan_path: get("PLAN_PATH")
                .unwrap_or_else(|| DEFAULT_PLAN_PATH.to_string())
                .into(),
            password_digest: digest_password(&password),
            session_signing_key: signing_key,
            frontend_url: get("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            port: parse_or(get("PORT"), "PORT", 8080)?,
            strava,
            strava_redirect_uri: get("STRAVA_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            strava_sync_days,
            strava_timeout_secs: parse_or(get("STRAVA_TIMEOUT_SECS"), "STRAVA_TIMEOUT_SECS", 15)?,
            strava_api_url: get("STRAVA_API_URL").unwrap_or_else(|| STRAVA_API_URL.to_string()),
            strava_oauth_url: get("STRAVA_OAUTH_URL")
                .unwrap_or_else(|| STRAVA_OAUTH_URL.to_string()),
        })
    }

    /// Fixed configuration for tests. The password is `test-password`.
    pub fn test_default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            plan_path: DEFAULT_PLAN_PATH.into(),
            password_digest: digest_password("test-password"),
            session_signing_key: b"test_session_key_32_bytes_minimum!!".to_vec(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            port: 8080,
            strava: Some(StravaCredentials {
                client_id: "test_client_id".to_string(),
                client_secret: "test_secret".to_string(),
            }),
            strava_redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            strava_sync_days: 30,
            strava_timeout_secs: 5,
            strava_api_url: STRAVA_API_URL.to_string(),
            strava_oauth_url: STRAVA_OAUTH_URL.to_string(),
        }
    }
}

/// SHA-256 digest of a login password.
pub fn digest_password(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            key,
            reason: format!("cannot parse {:?}", value),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
