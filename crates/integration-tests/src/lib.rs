//! Scenario tests for the MS-Scooter support portal.
//!
//! Every scenario runs against [`MemoryBackend`], so no database or server
//! is needed:
//!
//! ```bash
//! cargo test -p scooter-support-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `identity_resolution` - Phone logins, ambient identity, tabs and devices
//! - `support_flow` - Question selection through submitted ticket, with attachments
//! - `order_placement` - Pricing, order numbers and order inquiries
//!
//! The helpers here model a browser: a [`Device`] owns the device-scoped
//! storage and opens tabs, each with its own tab-scoped storage.

use std::sync::Arc;

use scooter_support_core::PhoneNumber;
use scooter_support_portal::identity::{IdentityContext, IdentityResolver, ResolvedIdentity};
use scooter_support_portal::memory::MemoryBackend;
use scooter_support_portal::models::{OrderForm, TicketForm};
use scooter_support_portal::storage::{KeyValueStorage, MemoryStorage};

/// Phone used by most scenarios.
pub const PHONE: &str = "9876543210";

/// One device; tabs opened on it share its durable storage.
pub struct Device {
    storage: Arc<dyn KeyValueStorage>,
}

impl Device {
    /// A device with empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    /// Open a tab with a fresh tab-scoped cache.
    #[must_use]
    pub fn open_tab(&self) -> IdentityContext {
        IdentityContext::new(Arc::new(MemoryStorage::new()), Arc::clone(&self.storage))
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a phone number known to be valid.
///
/// # Panics
///
/// Panics if `raw` is not a valid phone number.
#[must_use]
#[allow(clippy::expect_used)]
pub fn phone(raw: &str) -> PhoneNumber {
    PhoneNumber::parse(raw).expect("test phone number should be valid")
}

/// Log `raw` in on the tab `context`.
///
/// # Panics
///
/// Panics if resolution fails.
#[allow(clippy::expect_used)]
pub async fn login(
    backend: &MemoryBackend,
    context: &IdentityContext,
    raw: &str,
) -> ResolvedIdentity {
    IdentityResolver::new(backend, backend, context)
        .resolve_from_phone(&phone(raw))
        .await
        .expect("login should succeed")
}

/// The battery ticket used across scenarios.
#[must_use]
pub fn battery_ticket() -> TicketForm {
    TicketForm {
        title: "Battery not charging".to_owned(),
        description: "It stopped charging after 2 days".to_owned(),
        category: "battery".to_owned(),
        priority: "medium".to_owned(),
    }
}

/// A complete order form for `model` and `quantity`.
#[must_use]
pub fn order_form(model: &str, quantity: u32) -> OrderForm {
    OrderForm {
        model: model.to_owned(),
        quantity,
        delivery_address: "42 Harbour Road".to_owned(),
        delivery_city: "Springfield".to_owned(),
        delivery_postal_code: "12345".to_owned(),
        delivery_phone: PHONE.to_owned(),
        notes: String::new(),
    }
}
