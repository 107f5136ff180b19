//! Collaborator interfaces.
//!
//! The identity resolver and the submission services only talk to the
//! outside world through these traits. [`crate::db`] and [`crate::blob`]
//! implement them against `PostgreSQL` and the filesystem; [`crate::memory`]
//! implements them in memory for tests.
//!
//! Every method may fail with a transport-level [`RepositoryError`]; the
//! services convert those into [`crate::PortalError`] at their boundary.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scooter_support_core::{IdentityId, PhoneNumber, QuestionId, SessionId};

use crate::db::RepositoryError;
use crate::models::{
    CustomerIdentity, NewOrder, NewProfile, NewTicket, Order, ProfileUpdate, Question,
    QuestionInput, SupportTicket,
};

/// A backend-issued anonymous session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    /// The identity a brand-new customer gets from this session.
    #[must_use]
    pub const fn derive_identity(&self) -> IdentityId {
        self.id.derive_identity()
    }
}

/// Issues and tracks anonymous sessions.
pub trait AuthBackend: Send + Sync {
    /// Create a new anonymous session and make it current.
    fn create_anonymous_session(
        &self,
    ) -> impl Future<Output = Result<AuthSession, RepositoryError>> + Send;

    /// The current session, if one is live.
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<AuthSession>, RepositoryError>> + Send;

    /// End the current session. A no-op when none is live.
    fn sign_out(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Customer profiles keyed by identity, searchable by phone.
pub trait ProfileStore: Send + Sync {
    /// The profile bound to this phone, if any.
    fn find_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> impl Future<Output = Result<Option<CustomerIdentity>, RepositoryError>> + Send;

    /// The profile for this identity, if any.
    fn find_by_identity(
        &self,
        identity: IdentityId,
    ) -> impl Future<Output = Result<Option<CustomerIdentity>, RepositoryError>> + Send;

    /// Insert a new profile.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the phone is already bound.
    fn insert(
        &self,
        profile: NewProfile,
    ) -> impl Future<Output = Result<CustomerIdentity, RepositoryError>> + Send;

    /// Create or update the profile for an identity.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the new phone is already
    /// bound to another identity.
    fn upsert_by_identity_id(
        &self,
        identity: IdentityId,
        update: ProfileUpdate,
    ) -> impl Future<Output = Result<CustomerIdentity, RepositoryError>> + Send;
}

/// Support tickets.
pub trait TicketStore: Send + Sync {
    /// Insert a ticket and return the stored record.
    fn insert(
        &self,
        ticket: NewTicket,
    ) -> impl Future<Output = Result<SupportTicket, RepositoryError>> + Send;

    /// Tickets owned by an identity, newest first.
    fn list_by_identity(
        &self,
        identity: IdentityId,
    ) -> impl Future<Output = Result<Vec<SupportTicket>, RepositoryError>> + Send;
}

/// Scooter orders.
pub trait OrderStore: Send + Sync {
    /// Insert an order and return the stored record.
    fn insert(&self, order: NewOrder)
    -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Orders owned by an identity, newest first.
    fn list_by_identity(
        &self,
        identity: IdentityId,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;
}

/// Source of unique order numbers.
pub trait OrderNumberGenerator: Send + Sync {
    /// A fresh order number. Never returns the same value twice.
    fn next(&self) -> impl Future<Output = Result<String, RepositoryError>> + Send;
}

/// Attachment storage.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `path` and return the stored path.
    fn upload(
        &self,
        path: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<String, RepositoryError>> + Send;
}

/// Predefined support questions.
pub trait QuestionStore: Send + Sync {
    /// All questions, by category id then creation time.
    fn list(&self) -> impl Future<Output = Result<Vec<Question>, RepositoryError>> + Send;

    /// Add a question.
    fn insert(
        &self,
        input: QuestionInput,
        created_by: Option<IdentityId>,
    ) -> impl Future<Output = Result<Question, RepositoryError>> + Send;

    /// Replace a question's fields. [`RepositoryError::NotFound`] if absent.
    fn update(
        &self,
        id: QuestionId,
        input: QuestionInput,
    ) -> impl Future<Output = Result<Question, RepositoryError>> + Send;

    /// Remove a question. [`RepositoryError::NotFound`] if absent.
    fn delete(&self, id: QuestionId) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
