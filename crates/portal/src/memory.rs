//! In-memory collaborators.
//!
//! [`MemoryBackend`] implements every collaborator trait over plain
//! collections. It counts calls per operation, can be told to fail an
//! operation, and can simulate a competing device winning the race to bind
//! a phone number.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;

use scooter_support_core::{
    IdentityId, OrderId, PhoneNumber, QuestionId, SessionId, TicketId, UserRole,
};

use crate::backend::{
    AuthBackend, AuthSession, BlobStore, OrderNumberGenerator, OrderStore, ProfileStore,
    QuestionStore, TicketStore,
};
use crate::db::RepositoryError;
use crate::models::{
    CustomerIdentity, NewOrder, NewProfile, NewTicket, Order, ProfileUpdate, Question,
    QuestionInput, SupportTicket,
};

/// A collaborator operation, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Op {
    CreateSession,
    CurrentSession,
    SignOut,
    FindByPhone,
    FindByIdentity,
    InsertProfile,
    UpsertProfile,
    InsertTicket,
    ListTickets,
    InsertOrder,
    ListOrders,
    NextOrderNumber,
    Upload,
    ListQuestions,
    InsertQuestion,
    UpdateQuestion,
    DeleteQuestion,
}

#[derive(Debug, Default)]
struct State {
    current: Option<AuthSession>,
    sessions: Vec<AuthSession>,
    profiles: Vec<CustomerIdentity>,
    tickets: Vec<SupportTicket>,
    orders: Vec<Order>,
    questions: Vec<Question>,
    blobs: BTreeMap<String, Vec<u8>>,
    order_seq: u64,
    calls: BTreeMap<Op, usize>,
    failing: HashSet<Op>,
    competing_profile: Option<NewProfile>,
}

/// Every collaborator, in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
    latency: Duration,
}

impl MemoryBackend {
    /// An empty backend with no live session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every call first waits `latency`, like a network
    /// round trip would.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call and fail it if the operation is marked failing.
    fn enter(&self, op: Op) -> Result<MutexGuard<'_, State>, RepositoryError> {
        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;
        if state.failing.contains(&op) {
            return Err(RepositoryError::Unavailable(format!("{op:?} failed")));
        }
        Ok(state)
    }

    /// How many times `op` was called.
    #[must_use]
    pub fn calls(&self, op: Op) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or_default()
    }

    /// Calls across all operations.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Make every future call of `op` fail with `Unavailable`.
    pub fn fail(&self, op: Op) {
        self.lock().failing.insert(op);
    }

    /// Undo [`Self::fail`].
    pub fn recover(&self, op: Op) {
        self.lock().failing.remove(&op);
    }

    /// Just before the next profile insert, bind `phone` to `identity` as if
    /// another device got there first.
    pub fn race_next_profile_insert(&self, identity: IdentityId, phone: PhoneNumber) {
        self.lock().competing_profile = Some(NewProfile::for_phone(identity, phone));
    }

    /// Insert a profile directly, bypassing counters.
    pub fn seed_profile(&self, profile: NewProfile) -> CustomerIdentity {
        let mut state = self.lock();
        let row = profile_row(profile);
        state.profiles.push(row.clone());
        row
    }

    /// Snapshot of stored profiles.
    #[must_use]
    pub fn profiles(&self) -> Vec<CustomerIdentity> {
        self.lock().profiles.clone()
    }

    /// Snapshot of stored tickets.
    #[must_use]
    pub fn tickets(&self) -> Vec<SupportTicket> {
        self.lock().tickets.clone()
    }

    /// Snapshot of stored orders.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    /// Stored blob paths.
    #[must_use]
    pub fn blob_paths(&self) -> Vec<String> {
        self.lock().blobs.keys().cloned().collect()
    }

    /// Every session ever issued.
    #[must_use]
    pub fn sessions(&self) -> Vec<AuthSession> {
        self.lock().sessions.clone()
    }
}

fn profile_row(profile: NewProfile) -> CustomerIdentity {
    let now = Utc::now();
    CustomerIdentity {
        id: profile.id,
        mobile_number: Some(profile.mobile_number),
        display_name: Some(profile.display_name),
        role: UserRole::Customer,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn phone_taken(state: &State, phone: &PhoneNumber, except: Option<IdentityId>) -> bool {
    state
        .profiles
        .iter()
        .any(|p| p.mobile_number.as_ref() == Some(phone) && Some(p.id) != except)
}

impl AuthBackend for MemoryBackend {
    async fn create_anonymous_session(&self) -> Result<AuthSession, RepositoryError> {
        self.round_trip().await;
        let mut state = self.enter(Op::CreateSession)?;
        let session = AuthSession {
            id: SessionId::random(),
            created_at: Utc::now(),
        };
        state.sessions.push(session);
        state.current = Some(session);
        Ok(session)
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, RepositoryError> {
        self.round_trip().await;
        Ok(self.enter(Op::CurrentSession)?.current)
    }

    async fn sign_out(&self) -> Result<(), RepositoryError> {
        self.round_trip().await;
        self.enter(Op::SignOut)?.current = None;
        Ok(())
    }
}

impl ProfileStore for MemoryBackend {
    async fn find_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<CustomerIdentity>, RepositoryError> {
        self.round_trip().await;
        let state = self.enter(Op::FindByPhone)?;
        Ok(state
            .profiles
            .iter()
            .find(|p| p.mobile_number.as_ref() == Some(phone))
            .cloned())
    }

    async fn find_by_identity(
        &self,
        identity: IdentityId,
    ) -> Result<Option<CustomerIdentity>, RepositoryError> {
        self.round_trip().await;
        let state = self.enter(Op::FindByIdentity)?;
        Ok(state.profiles.iter().find(|p| p.id == identity).cloned())
    }

    async fn insert(&self, profile: NewProfile) -> Result<CustomerIdentity, RepositoryError> {
        self.round_trip().await;
        let mut state = self.enter(Op::InsertProfile)?;
        if let Some(competitor) = state.competing_profile.take() {
            state.profiles.push(profile_row(competitor));
        }
        if phone_taken(&state, &profile.mobile_number, None)
            || state.profiles.iter().any(|p| p.id == profile.id)
        {
            return Err(RepositoryError::Conflict("profile already exists".to_owned()));
        }
        let row = profile_row(profile);
        state.profiles.push(row.clone());
        Ok(row)
    }

    async fn upsert_by_identity_id(
        &self,
        identity: IdentityId,
        update: ProfileUpdate,
    ) -> Result<CustomerIdentity, RepositoryError> {
        self.round_trip().await;
        let mut state = self.enter(Op::UpsertProfile)?;
        if let Some(phone) = &update.mobile_number
            && phone_taken(&state, phone, Some(identity))
        {
            return Err(RepositoryError::Conflict(
                "mobile number already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        if let Some(existing) = state.profiles.iter_mut().find(|p| p.id == identity) {
            existing.display_name = update.display_name;
            existing.mobile_number = update.mobile_number;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let row = CustomerIdentity {
            id: identity,
            mobile_number: update.mobile_number,
            display_name: update.display_name,
            role: UserRole::Customer,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.profiles.push(row.clone());
        Ok(row)
    }
}

impl TicketStore for MemoryBackend {
    async fn insert(&self, ticket: NewTicket) -> Result<SupportTicket, RepositoryError> {
        self.round_trip().await;
        let mut state = self.enter(Op::InsertTicket)?;
        let now = Utc::now();
        let row = SupportTicket {
            id: TicketId::random(),
            customer_id: ticket.customer_id,
            title: ticket.title,
            description: ticket.description,
            category: ticket.category,
            priority: ticket.priority,
            status: ticket.status,
            attachment_path: ticket.attachment_path,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        };
        state.tickets.push(row.clone());
        Ok(row)
    }

    async fn list_by_identity(
        &self,
        identity: IdentityId,
    ) -> Result<Vec<SupportTicket>, RepositoryError> {
        self.round_trip().await;
        let state = self.enter(Op::ListTickets)?;
        // Insertion order is creation order; newest first.
        Ok(state
            .tickets
            .iter()
            .rev()
            .filter(|t| t.customer_id == identity)
            .cloned()
            .collect())
    }
}

impl OrderStore for MemoryBackend {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        self.round_trip().await;
        let mut state = self.enter(Op::InsertOrder)?;
        if state
            .orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(RepositoryError::Conflict(
                "order number already exists".to_owned(),
            ));
        }
        let now = Utc::now();
        let row = Order {
            id: OrderId::random(),
            customer_id: order.customer_id,
            order_number: order.order_number,
            scooter_model: order.scooter_model,
            quantity: order.quantity,
            unit_price: order.unit_price,
            total_amount: order.total_amount,
            delivery_address: order.delivery_address,
            delivery_city: order.delivery_city,
            delivery_postal_code: order.delivery_postal_code,
            delivery_phone: order.delivery_phone,
            notes: order.notes,
            status: order.status,
            tracking_number: None,
            estimated_delivery_date: None,
            created_at: now,
            updated_at: now,
        };
        state.orders.push(row.clone());
        Ok(row)
    }

    async fn list_by_identity(&self, identity: IdentityId) -> Result<Vec<Order>, RepositoryError> {
        self.round_trip().await;
        let state = self.enter(Op::ListOrders)?;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.customer_id == identity)
            .cloned()
            .collect())
    }
}

impl OrderNumberGenerator for MemoryBackend {
    async fn next(&self) -> Result<String, RepositoryError> {
        self.round_trip().await;
        let mut state = self.enter(Op::NextOrderNumber)?;
        state.order_seq += 1;
        Ok(format!(
            "MS-{}-{:06}",
            Utc::now().format("%Y%m%d"),
            state.order_seq
        ))
    }
}

impl BlobStore for MemoryBackend {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, RepositoryError> {
        self.round_trip().await;
        let mut state = self.enter(Op::Upload)?;
        if state.blobs.contains_key(path) {
            return Err(RepositoryError::Conflict(format!(
                "blob {path} already exists"
            )));
        }
        state.blobs.insert(path.to_owned(), bytes.to_vec());
        Ok(path.to_owned())
    }
}

impl QuestionStore for MemoryBackend {
    async fn list(&self) -> Result<Vec<Question>, RepositoryError> {
        self.round_trip().await;
        let state = self.enter(Op::ListQuestions)?;
        let mut questions = state.questions.clone();
        // Stable sort keeps insertion order within a category.
        questions.sort_by(|a, b| a.category_id.cmp(&b.category_id));
        Ok(questions)
    }

    async fn insert(
        &self,
        input: QuestionInput,
        created_by: Option<IdentityId>,
    ) -> Result<Question, RepositoryError> {
        self.round_trip().await;
        let mut state = self.enter(Op::InsertQuestion)?;
        let now = Utc::now();
        let row = Question {
            id: QuestionId::random(),
            category_id: input.category_id,
            category_title: input.category_title,
            category_description: input.category_description,
            category_icon: input.category_icon,
            question_text: input.question_text,
            created_by,
            created_at: now,
            updated_at: now,
        };
        state.questions.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        id: QuestionId,
        input: QuestionInput,
    ) -> Result<Question, RepositoryError> {
        self.round_trip().await;
        let mut state = self.enter(Op::UpdateQuestion)?;
        let row = state
            .questions
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or(RepositoryError::NotFound)?;
        row.category_id = input.category_id;
        row.category_title = input.category_title;
        row.category_description = input.category_description;
        row.category_icon = input.category_icon;
        row.question_text = input.question_text;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: QuestionId) -> Result<(), RepositoryError> {
        self.round_trip().await;
        let mut state = self.enter(Op::DeleteQuestion)?;
        let before = state.questions.len();
        state.questions.retain(|q| q.id != id);
        if state.questions.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn phone() -> PhoneNumber {
        PhoneNumber::parse("9876543210").unwrap()
    }

    #[tokio::test]
    async fn test_calls_are_counted() {
        let backend = MemoryBackend::new();
        backend.find_by_phone(&phone()).await.unwrap();
        backend.find_by_phone(&phone()).await.unwrap();

        assert_eq!(backend.calls(Op::FindByPhone), 2);
        assert_eq!(backend.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = MemoryBackend::new();
        backend.fail(Op::NextOrderNumber);
        assert!(matches!(
            backend.next().await,
            Err(RepositoryError::Unavailable(_))
        ));

        backend.recover(Op::NextOrderNumber);
        assert!(backend.next().await.unwrap().starts_with("MS-"));
    }

    #[tokio::test]
    async fn test_duplicate_phone_conflicts() {
        let backend = MemoryBackend::new();
        ProfileStore::insert(&backend, NewProfile::for_phone(IdentityId::random(), phone()))
            .await
            .unwrap();

        let err = ProfileStore::insert(&backend, NewProfile::for_phone(IdentityId::random(), phone()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_order_numbers_are_unique() {
        let backend = MemoryBackend::new();
        let a = backend.next().await.unwrap();
        let b = backend.next().await.unwrap();
        assert_ne!(a, b);
        assert!(a.ends_with("-000001"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_current_session() {
        let backend = MemoryBackend::new();
        let session = backend.create_anonymous_session().await.unwrap();
        assert_eq!(backend.current_session().await.unwrap(), Some(session));

        backend.sign_out().await.unwrap();
        assert_eq!(backend.current_session().await.unwrap(), None);
    }
}
