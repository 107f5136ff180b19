//! Order placement, listing and order inquiries.

use scooter_support_core::TicketCategory;
use scooter_support_portal::PortalError;
use scooter_support_portal::identity::IdentityResolver;
use scooter_support_portal::models::{Order, OrderForm};
use scooter_support_portal::services::OrderSubmission;
use scooter_support_portal::state::Portal;

use super::CliError;
use super::support::{self, Overrides, Selection};

/// Place an order for the logged-in customer.
///
/// # Errors
///
/// Returns `Validation`, `Unauthenticated` or `BackendUnavailable`.
pub async fn place(portal: &Portal, form: &OrderForm) -> Result<(), CliError> {
    let sessions = portal.sessions();
    let profiles = portal.profiles();
    let orders = portal.orders();
    let numbers = portal.order_numbers();
    let resolver = IdentityResolver::new(&sessions, &profiles, portal.context());

    let order = OrderSubmission::new(&resolver, &orders, &numbers)
        .submit(form)
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Order placed");
        println!("  Order number: {}", order.order_number);
        println!(
            "  Model:        {} x {}",
            order.scooter_model.label(),
            order.quantity
        );
        println!("  Total:        ${}", order.total_amount);
        println!("  Status:       {}", order.status);
    }
    Ok(())
}

/// List the logged-in customer's orders.
///
/// # Errors
///
/// Returns `Unauthenticated` or `BackendUnavailable`.
pub async fn list(portal: &Portal) -> Result<(), CliError> {
    let mine = my_orders(portal).await?;

    #[allow(clippy::print_stdout)]
    {
        if mine.is_empty() {
            println!("No orders yet");
        }
        for order in &mine {
            println!(
                "{}  {:<10} {:<12} x{:<2} ${}",
                order.order_number,
                order.status,
                order.scooter_model.label(),
                order.quantity,
                order.total_amount
            );
        }
    }
    Ok(())
}

/// Open a general support request pre-filled with an order's details.
///
/// # Errors
///
/// Returns `NotFound` if the customer has no such order, or whatever the
/// submission returns.
pub async fn inquiry(
    portal: &Portal,
    order_number: &str,
    priority: Option<String>,
) -> Result<(), CliError> {
    let order = my_orders(portal)
        .await?
        .into_iter()
        .find(|o| o.order_number == order_number.trim())
        .ok_or_else(|| PortalError::NotFound(format!("order {order_number}")))?;

    let selection = Selection::Predefined {
        text: order.inquiry_text(),
        category: TicketCategory::General.as_str().to_owned(),
    };
    let overrides = Overrides {
        priority,
        ..Overrides::default()
    };
    let ticket = support::submit(portal, selection, overrides).await?;
    support::print_submitted(&ticket);
    Ok(())
}

async fn my_orders(portal: &Portal) -> Result<Vec<Order>, CliError> {
    let sessions = portal.sessions();
    let profiles = portal.profiles();
    let orders = portal.orders();
    let numbers = portal.order_numbers();
    let resolver = IdentityResolver::new(&sessions, &profiles, portal.context());

    Ok(OrderSubmission::new(&resolver, &orders, &numbers)
        .list_mine()
        .await?)
}
