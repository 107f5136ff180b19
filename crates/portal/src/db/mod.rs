//! `PostgreSQL` implementations of the collaborator traits.
//!
//! ## Tables
//!
//! - `profiles` - Customer identities (`UNIQUE (mobile_number)`)
//! - `auth_sessions` - Anonymous sessions issued to tabs
//! - `support_tickets` - Tickets with optional attachment path
//! - `orders` - Scooter orders; numbers come from `generate_order_number()`
//! - `questions` - Predefined support questions
//!
//! # Migrations
//!
//! Migrations are stored in `crates/portal/migrations/` and run via:
//! ```bash
//! ms-support migrate
//! ```

pub mod orders;
pub mod profiles;
pub mod questions;
pub mod sessions;
pub mod tickets;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::{OrderNumberSequence, OrderRepository};
pub use profiles::ProfileRepository;
pub use questions::QuestionRepository;
pub use sessions::SessionRepository;
pub use tickets::TicketRepository;

/// Errors that can occur during collaborator operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique phone number).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A non-database collaborator (blob store, session storage) failed.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Map a unique violation to `Conflict`, anything else to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
