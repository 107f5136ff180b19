//! Integration tests for order placement and order inquiries.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use scooter_support_core::{OrderStatus, ScooterModel, TicketCategory};
use scooter_support_integration_tests::{Device, PHONE, login, order_form};
use scooter_support_portal::PortalError;
use scooter_support_portal::identity::IdentityResolver;
use scooter_support_portal::memory::{MemoryBackend, Op};
use scooter_support_portal::services::{
    AttachmentUploader, DEFAULT_MAX_ATTACHMENT_BYTES, OrderSubmission, SupportWorkflow,
    TicketSubmission,
};

#[tokio::test]
async fn test_classic_order_scenario() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();
    let resolved = login(&backend, &tab, PHONE).await;
    let resolver = IdentityResolver::new(&backend, &backend, &tab);
    let orders = OrderSubmission::new(&resolver, &backend, &backend);

    let order = orders.submit(&order_form("ms_classic", 2)).await.unwrap();

    assert_eq!(order.scooter_model, ScooterModel::MsClassic);
    assert_eq!(order.unit_price, Decimal::new(129_999, 2));
    assert_eq!(order.total_amount, Decimal::new(259_998, 2));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.customer_id, resolved.id);
    assert!(order.order_number.starts_with("MS-"));
    assert_eq!(order.order_number.len(), "MS-20260101-000001".len());
    assert_eq!(backend.calls(Op::NextOrderNumber), 1);
}

#[tokio::test]
async fn test_sport_total_is_exact() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();
    login(&backend, &tab, PHONE).await;
    let resolver = IdentityResolver::new(&backend, &backend, &tab);
    let orders = OrderSubmission::new(&resolver, &backend, &backend);

    let order = orders.submit(&order_form("ms_sport", 3)).await.unwrap();

    assert_eq!(order.total_amount, Decimal::new(479_997, 2));
    assert_eq!(order.total_amount.to_string(), "4799.97");
}

#[tokio::test]
async fn test_each_order_gets_a_unique_number() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();
    login(&backend, &tab, PHONE).await;
    let resolver = IdentityResolver::new(&backend, &backend, &tab);
    let orders = OrderSubmission::new(&resolver, &backend, &backend);

    let first = orders.submit(&order_form("ms_premium", 1)).await.unwrap();
    let second = orders.submit(&order_form("ms_electric", 1)).await.unwrap();

    assert_ne!(first.order_number, second.order_number);
    let listed = orders.list_mine().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].order_number, second.order_number);
}

#[tokio::test]
async fn test_invalid_order_draws_no_number() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();
    login(&backend, &tab, PHONE).await;
    let resolver = IdentityResolver::new(&backend, &backend, &tab);
    let orders = OrderSubmission::new(&resolver, &backend, &backend);

    let mut form = order_form("ms_turbo", 11);
    form.delivery_city = "  ".to_owned();
    let err = orders.submit(&form).await.unwrap_err();

    let PortalError::Validation(errors) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(errors.get("model"), Some("Please select a scooter model"));
    assert_eq!(errors.get("quantity"), Some("Quantity must be between 1 and 10"));
    assert_eq!(errors.get("delivery_city"), Some("City is required"));
    assert_eq!(backend.calls(Op::NextOrderNumber), 0);
    assert_eq!(backend.calls(Op::InsertOrder), 0);
}

#[tokio::test]
async fn test_logged_out_order_is_unauthenticated() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();
    let resolver = IdentityResolver::new(&backend, &backend, &tab);
    let orders = OrderSubmission::new(&resolver, &backend, &backend);

    let err = orders.submit(&order_form("ms_sport", 1)).await.unwrap_err();

    assert!(matches!(err, PortalError::Unauthenticated));
    assert_eq!(backend.calls(Op::NextOrderNumber), 0);
    assert!(backend.orders().is_empty());
}

#[tokio::test]
async fn test_order_inquiry_opens_general_ticket() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();
    login(&backend, &tab, PHONE).await;
    let resolver = IdentityResolver::new(&backend, &backend, &tab);
    let order = OrderSubmission::new(&resolver, &backend, &backend)
        .submit(&order_form("ms_sport", 1))
        .await
        .unwrap();

    let text = order.inquiry_text();
    assert_eq!(
        text,
        format!(
            "Order Number: {}\nScooter Model: MS SPORT\nOrder Status: pending",
            order.order_number
        )
    );

    let tickets = TicketSubmission::new(
        &resolver,
        &backend,
        AttachmentUploader::new(&backend, DEFAULT_MAX_ATTACHMENT_BYTES),
    );
    let workflow = SupportWorkflow::new(&tickets);
    workflow
        .select_predefined_question(&text, TicketCategory::General.as_str())
        .unwrap();
    let scooter_support_portal::services::WorkflowState::FillingForm { form, .. } =
        workflow.state()
    else {
        panic!("expected the form");
    };
    let ticket = workflow.submit(form, None).await.unwrap();

    assert_eq!(ticket.category, TicketCategory::General);
    assert!(ticket.description.contains(&order.order_number));
}
