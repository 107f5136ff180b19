//! Anonymous session issuance.
//!
//! Sessions are rows in `auth_sessions`. The id of the current session
//! lives in device-scoped key/value storage, the way a browser auth client
//! keeps its token in local storage, so every tab on the device shares it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use scooter_support_core::SessionId;

use super::RepositoryError;
use crate::backend::{AuthBackend, AuthSession};
use crate::storage::{KeyValueStorage, StorageError};

/// Storage key holding the current session id.
pub const SESSION_KEY: &str = "auth.session";

fn unavailable(e: StorageError) -> RepositoryError {
    RepositoryError::Unavailable(format!("session storage: {e}"))
}

/// `PostgreSQL`-backed [`AuthBackend`].
pub struct SessionRepository<'a> {
    pool: &'a PgPool,
    storage: &'a dyn KeyValueStorage,
}

impl<'a> SessionRepository<'a> {
    /// Create a session repository whose current session is kept in `storage`.
    #[must_use]
    pub const fn new(pool: &'a PgPool, storage: &'a dyn KeyValueStorage) -> Self {
        Self { pool, storage }
    }

    fn stored_id(&self) -> Result<Option<SessionId>, RepositoryError> {
        let Some(raw) = self.storage.get(SESSION_KEY).map_err(unavailable)? else {
            return Ok(None);
        };
        match raw.parse::<SessionId>() {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable session id");
                self.storage.remove(SESSION_KEY).map_err(unavailable)?;
                Ok(None)
            }
        }
    }
}

impl AuthBackend for SessionRepository<'_> {
    async fn create_anonymous_session(&self) -> Result<AuthSession, RepositoryError> {
        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO auth_sessions (id) VALUES ($1) RETURNING id, created_at",
        )
        .bind(Uuid::new_v4())
        .fetch_one(self.pool)
        .await?;

        let session = AuthSession {
            id: SessionId::new(id),
            created_at,
        };
        self.storage
            .set(SESSION_KEY, &session.id.to_string())
            .map_err(unavailable)?;

        tracing::debug!(session_id = %session.id, "Anonymous session created");
        Ok(session)
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, RepositoryError> {
        let Some(id) = self.stored_id()? else {
            return Ok(None);
        };

        let created_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT created_at FROM auth_sessions WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        match created_at {
            Some(created_at) => Ok(Some(AuthSession { id, created_at })),
            None => {
                self.storage.remove(SESSION_KEY).map_err(unavailable)?;
                Ok(None)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), RepositoryError> {
        let Some(id) = self.stored_id()? else {
            return Ok(());
        };

        sqlx::query("UPDATE auth_sessions SET revoked_at = now() WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool)
            .await?;
        self.storage.remove(SESSION_KEY).map_err(unavailable)?;

        tracing::debug!(session_id = %id, "Session revoked");
        Ok(())
    }
}
