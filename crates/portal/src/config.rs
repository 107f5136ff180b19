//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required for backend commands
//! - `PORTAL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `PORTAL_STATE_DIR` - Local state directory (default: `.ms-support`)
//! - `PORTAL_BLOB_DIR` - Attachment root (default: `<state dir>/attachments`)
//! - `PORTAL_OTP_DELAY_MS` - Simulated passcode send delay (default: 1000)
//! - `PORTAL_MAX_ATTACHMENT_BYTES` - Attachment size limit (default: 10 MiB)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::services::DEFAULT_MAX_ATTACHMENT_BYTES;

const DEFAULT_STATE_DIR: &str = ".ms-support";
const DEFAULT_OTP_DELAY_MS: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal configuration.
#[derive(Clone)]
pub struct PortalConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Holds `device.json` and `tabs/<tab>.json`
    pub state_dir: PathBuf,
    /// Root of the filesystem blob store
    pub blob_dir: PathBuf,
    /// How long "sending" a passcode takes
    pub otp_delay: Duration,
    /// Largest accepted attachment
    pub max_attachment_bytes: u64,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("state_dir", &self.state_dir)
            .field("blob_dir", &self.blob_dir)
            .field("otp_delay", &self.otp_delay)
            .field("max_attachment_bytes", &self.max_attachment_bytes)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("PORTAL_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from);
        let state_dir = PathBuf::from(
            lookup("PORTAL_STATE_DIR").unwrap_or_else(|| DEFAULT_STATE_DIR.to_owned()),
        );
        let blob_dir = lookup("PORTAL_BLOB_DIR")
            .map_or_else(|| state_dir.join("attachments"), PathBuf::from);
        let otp_delay = Duration::from_millis(parse_or_default(
            &lookup,
            "PORTAL_OTP_DELAY_MS",
            DEFAULT_OTP_DELAY_MS,
        )?);
        let max_attachment_bytes = parse_or_default(
            &lookup,
            "PORTAL_MAX_ATTACHMENT_BYTES",
            DEFAULT_MAX_ATTACHMENT_BYTES,
        )?;

        Ok(Self {
            database_url,
            state_dir,
            blob_dir,
            otp_delay,
            max_attachment_bytes,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// The database URL, for commands that need the backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if neither variable is set.
    pub fn require_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("PORTAL_DATABASE_URL".to_owned()))
    }

    /// Device-scoped storage file.
    #[must_use]
    pub fn device_file(&self) -> PathBuf {
        self.state_dir.join("device.json")
    }

    /// Tab-scoped storage file for `tab`.
    #[must_use]
    pub fn tab_file(&self, tab: &str) -> PathBuf {
        self.state_dir.join("tabs").join(format!("{tab}.json"))
    }

    /// Root of the filesystem blob store.
    #[must_use]
    pub fn blob_root(&self) -> &Path {
        &self.blob_dir
    }
}

fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
