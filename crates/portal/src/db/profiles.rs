//! Profile repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use scooter_support_core::{IdentityId, PhoneNumber, UserRole};

use super::{RepositoryError, conflict_on_unique};
use crate::backend::ProfileStore;
use crate::models::{CustomerIdentity, NewProfile, ProfileUpdate};

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    mobile_number: Option<String>,
    display_name: Option<String>,
    role: UserRole,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for CustomerIdentity {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let mobile_number = row
            .mobile_number
            .map(|m| PhoneNumber::parse(&m))
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
            })?;

        Ok(Self {
            id: IdentityId::new(row.id),
            mobile_number,
            display_name: row.display_name,
            role: row.role,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str =
    "id, mobile_number, display_name, role, is_active, created_at, updated_at";

/// Repository for customer profiles.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl ProfileStore for ProfileRepository<'_> {
    async fn find_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<CustomerIdentity>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {COLUMNS} FROM profiles WHERE mobile_number = $1"
        ))
        .bind(phone.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_identity(
        &self,
        identity: IdentityId,
    ) -> Result<Option<CustomerIdentity>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(identity.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn insert(&self, profile: NewProfile) -> Result<CustomerIdentity, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "INSERT INTO profiles (id, mobile_number, display_name)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        ))
        .bind(profile.id.as_uuid())
        .bind(profile.mobile_number.as_str())
        .bind(&profile.display_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "profile"))?;

        row.try_into()
    }

    async fn upsert_by_identity_id(
        &self,
        identity: IdentityId,
        update: ProfileUpdate,
    ) -> Result<CustomerIdentity, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "INSERT INTO profiles (id, mobile_number, display_name)
             VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE
             SET mobile_number = EXCLUDED.mobile_number,
                 display_name = EXCLUDED.display_name,
                 updated_at = now()
             RETURNING {COLUMNS}"
        ))
        .bind(identity.as_uuid())
        .bind(update.mobile_number.as_ref().map(PhoneNumber::as_str))
        .bind(update.display_name.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "mobile number"))?;

        row.try_into()
    }
}
