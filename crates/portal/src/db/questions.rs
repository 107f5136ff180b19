//! Question repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use scooter_support_core::{IdentityId, QuestionId};

use super::RepositoryError;
use crate::backend::QuestionStore;
use crate::models::{Question, QuestionInput};

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: Uuid,
    category_id: String,
    category_title: String,
    category_description: String,
    category_icon: String,
    question_text: String,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: QuestionId::new(row.id),
            category_id: row.category_id,
            category_title: row.category_title,
            category_description: row.category_description,
            category_icon: row.category_icon,
            question_text: row.question_text,
            created_by: row.created_by.map(IdentityId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str = "id, category_id, category_title, category_description, category_icon, \
                       question_text, created_by, created_at, updated_at";

/// Repository for predefined questions.
pub struct QuestionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> QuestionRepository<'a> {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl QuestionStore for QuestionRepository<'_> {
    async fn list(&self) -> Result<Vec<Question>, RepositoryError> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {COLUMNS} FROM questions ORDER BY category_id, created_at"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(
        &self,
        input: QuestionInput,
        created_by: Option<IdentityId>,
    ) -> Result<Question, RepositoryError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "INSERT INTO questions
                 (category_id, category_title, category_description, category_icon,
                  question_text, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        ))
        .bind(&input.category_id)
        .bind(&input.category_title)
        .bind(&input.category_description)
        .bind(&input.category_icon)
        .bind(&input.question_text)
        .bind(created_by.map(|id| id.as_uuid()))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(
        &self,
        id: QuestionId,
        input: QuestionInput,
    ) -> Result<Question, RepositoryError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "UPDATE questions
             SET category_id = $2, category_title = $3, category_description = $4,
                 category_icon = $5, question_text = $6, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&input.category_id)
        .bind(&input.category_title)
        .bind(&input.category_description)
        .bind(&input.category_icon)
        .bind(&input.question_text)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: QuestionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
