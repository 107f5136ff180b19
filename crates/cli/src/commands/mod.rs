//! Command implementations.

pub mod auth;
pub mod migrate;
pub mod orders;
pub mod profile;
pub mod questions;
pub mod support;

use std::path::PathBuf;

use thiserror::Error;

use scooter_support_portal::PortalError;
use scooter_support_portal::config::{ConfigError, PortalConfig};
use scooter_support_portal::db::create_pool;
use scooter_support_portal::state::Portal;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration is missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A file named on the command line could not be read.
    #[error("Could not read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An argument did not make sense.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The portal rejected or failed the operation.
    #[error(transparent)]
    Portal(#[from] PortalError),
}

impl CliError {
    /// Log the error, capturing unexpected failures to Sentry.
    pub fn report(&self) {
        match self {
            Self::Portal(e) => e.report(),
            Self::ReadFile { .. } | Self::InvalidArgument(_) | Self::Config(_) => {
                tracing::warn!(error = %self, "Command rejected");
            }
            Self::Database(_) | Self::Migration(_) => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Command failed"
                );
            }
        }
    }
}

/// Connect to the database and build the state for `tab`.
///
/// # Errors
///
/// Returns an error if the database URL is missing or the connection fails.
pub async fn connect(config: PortalConfig, tab: &str) -> Result<Portal, CliError> {
    tracing::debug!("Connecting to database...");
    let pool = create_pool(config.require_database_url()?).await?;
    Ok(Portal::new(config, pool, tab))
}

/// Parse a UUID-backed id given on the command line.
fn parse_id<T>(raw: &str) -> Result<T, CliError>
where
    T: std::str::FromStr,
{
    raw.trim()
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("not an id: {raw}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use scooter_support_core::QuestionId;

    use super::*;

    #[test]
    fn test_parse_id() {
        let id = QuestionId::random();
        let parsed: QuestionId = parse_id(&format!(" {id} ")).unwrap();
        assert_eq!(parsed, id);

        assert!(matches!(
            parse_id::<QuestionId>("seven"),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_portal_errors_pass_through() {
        let err = CliError::from(PortalError::Unauthenticated);
        assert_eq!(err.to_string(), "not logged in");
    }
}
