//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ms-support migrate
//! ```
//!
//! # Environment Variables
//!
//! - `PORTAL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Portal migrations live in `crates/portal/migrations/`.

use scooter_support_portal::config::PortalConfig;
use scooter_support_portal::db::create_pool;

use super::CliError;

/// Run the portal database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails.
pub async fn run(config: &PortalConfig) -> Result<(), CliError> {
    tracing::info!("Connecting to portal database...");
    let pool = create_pool(config.require_database_url()?).await?;

    tracing::info!("Running portal migrations...");
    sqlx::migrate!("../portal/migrations").run(&pool).await?;

    tracing::info!("Portal migrations complete!");
    Ok(())
}
