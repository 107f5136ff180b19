//! Support ticket repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use scooter_support_core::{IdentityId, TicketId};

use super::RepositoryError;
use crate::backend::TicketStore;
use crate::models::{NewTicket, SupportTicket};

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    customer_id: Uuid,
    title: String,
    description: String,
    category: String,
    priority: String,
    status: String,
    attachment_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<TicketRow> for SupportTicket {
    type Error = RepositoryError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let corrupt = |e: scooter_support_core::ParseEnumError| {
            RepositoryError::DataCorruption(e.to_string())
        };

        Ok(Self {
            id: TicketId::new(row.id),
            customer_id: IdentityId::new(row.customer_id),
            title: row.title,
            description: row.description,
            category: row.category.parse().map_err(corrupt)?,
            priority: row.priority.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            attachment_path: row.attachment_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
            resolved_at: row.resolved_at,
        })
    }
}

const COLUMNS: &str = "id, customer_id, title, description, category, priority, status, \
                       attachment_path, created_at, updated_at, resolved_at";

/// Repository for support tickets.
pub struct TicketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TicketRepository<'a> {
    /// Create a new ticket repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl TicketStore for TicketRepository<'_> {
    async fn insert(&self, ticket: NewTicket) -> Result<SupportTicket, RepositoryError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "INSERT INTO support_tickets
                 (customer_id, title, description, category, priority, status, attachment_path)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        ))
        .bind(ticket.customer_id.as_uuid())
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.category.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(ticket.attachment_path.as_deref())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    async fn list_by_identity(
        &self,
        identity: IdentityId,
    ) -> Result<Vec<SupportTicket>, RepositoryError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {COLUMNS} FROM support_tickets
             WHERE customer_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(identity.as_uuid())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
