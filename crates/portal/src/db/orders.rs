//! Order repository and order number sequence.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use scooter_support_core::{IdentityId, OrderId, OrderStatus, ScooterModel};

use super::{RepositoryError, conflict_on_unique};
use crate::backend::{OrderNumberGenerator, OrderStore};
use crate::models::{NewOrder, Order};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: Uuid,
    order_number: String,
    scooter_model: ScooterModel,
    quantity: i32,
    unit_price: Decimal,
    total_amount: Decimal,
    delivery_address: String,
    delivery_city: String,
    delivery_postal_code: String,
    delivery_phone: String,
    notes: Option<String>,
    status: OrderStatus,
    tracking_number: Option<String>,
    estimated_delivery_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative quantity {}", row.quantity))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            customer_id: IdentityId::new(row.customer_id),
            order_number: row.order_number,
            scooter_model: row.scooter_model,
            quantity,
            unit_price: row.unit_price,
            total_amount: row.total_amount,
            delivery_address: row.delivery_address,
            delivery_city: row.delivery_city,
            delivery_postal_code: row.delivery_postal_code,
            delivery_phone: row.delivery_phone,
            notes: row.notes,
            status: row.status,
            tracking_number: row.tracking_number,
            estimated_delivery_date: row.estimated_delivery_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str = "id, customer_id, order_number, scooter_model, quantity, unit_price, \
                       total_amount, delivery_address, delivery_city, delivery_postal_code, \
                       delivery_phone, notes, status, tracking_number, estimated_delivery_date, \
                       created_at, updated_at";

/// Repository for scooter orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for OrderRepository<'_> {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let quantity = i32::try_from(order.quantity)
            .map_err(|_| RepositoryError::DataCorruption("quantity out of range".to_owned()))?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders
                 (customer_id, order_number, scooter_model, quantity, unit_price, total_amount,
                  delivery_address, delivery_city, delivery_postal_code, delivery_phone,
                  notes, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        ))
        .bind(order.customer_id.as_uuid())
        .bind(&order.order_number)
        .bind(order.scooter_model)
        .bind(quantity)
        .bind(order.unit_price)
        .bind(order.total_amount)
        .bind(&order.delivery_address)
        .bind(&order.delivery_city)
        .bind(&order.delivery_postal_code)
        .bind(&order.delivery_phone)
        .bind(order.notes.as_deref())
        .bind(order.status)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "order number"))?;

        row.try_into()
    }

    async fn list_by_identity(&self, identity: IdentityId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {COLUMNS} FROM orders
             WHERE customer_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(identity.as_uuid())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// Order numbers from the `generate_order_number()` database function.
pub struct OrderNumberSequence<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderNumberSequence<'a> {
    /// Create a new sequence handle.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl OrderNumberGenerator for OrderNumberSequence<'_> {
    async fn next(&self) -> Result<String, RepositoryError> {
        let number: String = sqlx::query_scalar("SELECT generate_order_number()")
            .fetch_one(self.pool)
            .await?;
        Ok(number)
    }
}
