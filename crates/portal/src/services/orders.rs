//! Order placement.

use tracing::instrument;

use crate::backend::{AuthBackend, OrderNumberGenerator, OrderStore, ProfileStore};
use crate::error::{Result, add_breadcrumb};
use crate::identity::IdentityResolver;
use crate::models::{NewOrder, Order, OrderForm};

/// Validates, prices and records orders for the ambient identity.
pub struct OrderSubmission<'a, A, P, O, N> {
    resolver: &'a IdentityResolver<'a, A, P>,
    orders: &'a O,
    numbers: &'a N,
}

impl<'a, A, P, O, N> OrderSubmission<'a, A, P, O, N>
where
    A: AuthBackend,
    P: ProfileStore,
    O: OrderStore,
    N: OrderNumberGenerator,
{
    /// Create an order submission service.
    #[must_use]
    pub const fn new(
        resolver: &'a IdentityResolver<'a, A, P>,
        orders: &'a O,
        numbers: &'a N,
    ) -> Self {
        Self {
            resolver,
            orders,
            numbers,
        }
    }

    /// Place an order.
    ///
    /// The unit price comes from the catalog and the total is computed here,
    /// never taken from the form. One order number is drawn per attempt.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `Unauthenticated` or `BackendUnavailable`, from
    /// the step that failed.
    #[instrument(skip_all, fields(model = %form.model, quantity = form.quantity))]
    pub async fn submit(&self, form: &OrderForm) -> Result<Order> {
        let valid = form.validate()?;
        let identity = self.resolver.require_ambient().await?;

        let order_number = self.numbers.next().await?;
        let order = self
            .orders
            .insert(NewOrder::pending(identity, order_number, valid))
            .await?;

        tracing::info!(
            order_number = %order.order_number,
            total = %order.total_amount,
            identity = %identity,
            "Order placed"
        );
        add_breadcrumb("orders", "Order placed", Some(&[("order_number", order.order_number.as_str())]));
        Ok(order)
    }

    /// Orders of the ambient identity, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when nobody is logged in, or
    /// `BackendUnavailable` if the store fails.
    #[instrument(skip_all)]
    pub async fn list_mine(&self) -> Result<Vec<Order>> {
        let identity = self.resolver.require_ambient().await?;
        Ok(self.orders.list_by_identity(identity).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use scooter_support_core::{OrderStatus, PhoneNumber};

    use super::*;
    use crate::error::PortalError;
    use crate::identity::IdentityContext;
    use crate::memory::{MemoryBackend, Op};

    fn form(model: &str, quantity: u32) -> OrderForm {
        OrderForm {
            model: model.to_string(),
            quantity,
            delivery_address: "12 Harbour Road".to_string(),
            delivery_city: "Kochi".to_string(),
            delivery_postal_code: "682001".to_string(),
            delivery_phone: "9876543210".to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_place_order() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);
        resolver
            .resolve_from_phone(&PhoneNumber::parse("9876543210").unwrap())
            .await
            .unwrap();
        let service = OrderSubmission::new(&resolver, &backend, &backend);

        let order = service.submit(&form("ms_classic", 2)).await.unwrap();

        assert_eq!(order.total_amount, Decimal::from_str("2599.98").unwrap());
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.order_number.starts_with("MS-"));

        let second = service.submit(&form("ms_sport", 3)).await.unwrap();
        assert_eq!(second.total_amount, Decimal::from_str("4799.97").unwrap());
        assert_ne!(order.order_number, second.order_number);
        assert_eq!(service.list_mine().await.unwrap()[0], second);
    }

    #[tokio::test]
    async fn test_invalid_quantity_draws_no_number() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);
        let service = OrderSubmission::new(&resolver, &backend, &backend);

        assert!(matches!(
            service.submit(&form("ms_classic", 11)).await,
            Err(PortalError::Validation(_))
        ));
        assert_eq!(backend.calls(Op::NextOrderNumber), 0);
    }

    #[tokio::test]
    async fn test_number_failure_inserts_nothing() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);
        resolver
            .resolve_from_phone(&PhoneNumber::parse("9876543210").unwrap())
            .await
            .unwrap();
        backend.fail(Op::NextOrderNumber);
        let service = OrderSubmission::new(&resolver, &backend, &backend);

        assert!(matches!(
            service.submit(&form("ms_premium", 1)).await,
            Err(PortalError::BackendUnavailable(_))
        ));
        assert!(backend.orders().is_empty());
    }
}
