//! Scooter order types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use scooter_support_core::{IdentityId, OrderId, OrderStatus, ScooterModel};

use crate::error::{PortalError, Result, ValidationErrors};

/// Smallest quantity per order.
pub const MIN_QUANTITY: u32 = 1;
/// Largest quantity per order.
pub const MAX_QUANTITY: u32 = 10;

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: IdentityId,
    /// Server-generated, unique, e.g. `MS-20260101-000042`.
    pub order_number: String,
    pub scooter_model: ScooterModel,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_postal_code: String,
    pub delivery_phone: String,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Text used to open a support request about this order.
    #[must_use]
    pub fn inquiry_text(&self) -> String {
        format!(
            "Order Number: {}\nScooter Model: {}\nOrder Status: {}",
            self.order_number,
            self.scooter_model.label().to_uppercase(),
            self.status
        )
    }
}

/// The order form as entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderForm {
    /// Catalog key such as `ms_sport`.
    pub model: String,
    pub quantity: u32,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_postal_code: String,
    pub delivery_phone: String,
    pub notes: String,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            model: String::new(),
            quantity: MIN_QUANTITY,
            delivery_address: String::new(),
            delivery_city: String::new(),
            delivery_postal_code: String::new(),
            delivery_phone: String::new(),
            notes: String::new(),
        }
    }
}

impl OrderForm {
    /// Check every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::Validation` with one message per failing field.
    pub fn validate(&self) -> Result<ValidOrder> {
        let mut errors = ValidationErrors::new();

        let model = self.model.parse::<ScooterModel>().ok();
        if model.is_none() {
            errors.add("model", "Please select a scooter model");
        }
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&self.quantity) {
            errors.add(
                "quantity",
                format!("Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"),
            );
        }

        let required = [
            ("delivery_address", &self.delivery_address, "Delivery address is required"),
            ("delivery_city", &self.delivery_city, "City is required"),
            ("delivery_postal_code", &self.delivery_postal_code, "Postal code is required"),
            ("delivery_phone", &self.delivery_phone, "Contact phone is required"),
        ];
        for (field, value, message) in required {
            if value.trim().is_empty() {
                errors.add(field, message);
            }
        }

        match model {
            Some(model) if errors.is_empty() => Ok(ValidOrder {
                model,
                quantity: self.quantity,
                delivery_address: self.delivery_address.trim().to_owned(),
                delivery_city: self.delivery_city.trim().to_owned(),
                delivery_postal_code: self.delivery_postal_code.trim().to_owned(),
                delivery_phone: self.delivery_phone.trim().to_owned(),
                notes: Some(self.notes.trim())
                    .filter(|n| !n.is_empty())
                    .map(str::to_owned),
            }),
            _ => Err(PortalError::Validation(errors)),
        }
    }
}

/// An order form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidOrder {
    pub model: ScooterModel,
    pub quantity: u32,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_postal_code: String,
    pub delivery_phone: String,
    pub notes: Option<String>,
}

impl ValidOrder {
    /// `unit price * quantity`, exact.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.model.unit_price().times(self.quantity).amount
    }
}

/// Row handed to the order store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: IdentityId,
    pub order_number: String,
    pub scooter_model: ScooterModel,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_postal_code: String,
    pub delivery_phone: String,
    pub notes: Option<String>,
    pub status: OrderStatus,
}

impl NewOrder {
    /// A `pending` order priced from the catalog.
    #[must_use]
    pub fn pending(customer_id: IdentityId, order_number: String, order: ValidOrder) -> Self {
        Self {
            customer_id,
            order_number,
            scooter_model: order.model,
            quantity: order.quantity,
            unit_price: order.model.unit_price().amount,
            total_amount: order.total(),
            delivery_address: order.delivery_address,
            delivery_city: order.delivery_city,
            delivery_postal_code: order.delivery_postal_code,
            delivery_phone: order.delivery_phone,
            notes: order.notes,
            status: OrderStatus::Pending,
        }
    }
}
