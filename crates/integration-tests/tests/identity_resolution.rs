//! Integration tests for phone logins and the ambient identity.
//!
//! Tabs and devices are modelled with [`Device`]: tabs on one device share
//! the phone mapping, while each tab keeps its own session cache.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use scooter_support_integration_tests::{Device, PHONE, login, phone};
use scooter_support_portal::PortalError;
use scooter_support_portal::identity::{IdentityContext, IdentityResolver, LoginFlow, LoginState};
use scooter_support_portal::memory::{MemoryBackend, Op};
use scooter_support_portal::services::ProfileService;
use scooter_support_portal::storage::{FileStorage, KeyValueStorage};

// =============================================================================
// First and repeat logins
// =============================================================================

#[tokio::test]
async fn test_new_phone_creates_exactly_one_profile() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();

    let resolved = login(&backend, &tab, PHONE).await;

    assert!(resolved.is_new);
    let profiles = backend.profiles();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, resolved.id);
    assert_eq!(profiles[0].mobile_number, Some(phone("9876543210")));
    assert_eq!(profiles[0].display_name.as_deref(), Some("User 3210"));
}

#[tokio::test]
async fn test_known_phone_in_new_session_reuses_identity() {
    let backend = MemoryBackend::new();
    let first_tab = Device::new().open_tab();
    let first = login(&backend, &first_tab, PHONE).await;

    IdentityResolver::new(&backend, &backend, &first_tab)
        .sign_out()
        .await
        .unwrap();

    // Another device, so no local cache can help.
    let other_tab = Device::new().open_tab();
    let again = login(&backend, &other_tab, PHONE).await;

    assert_eq!(again.id, first.id);
    assert!(!again.is_new);
    assert_eq!(backend.profiles().len(), 1);
    assert_eq!(backend.sessions().len(), 2);
    assert_eq!(backend.calls(Op::InsertProfile), 1);
}

#[tokio::test]
async fn test_known_phone_is_remapped_onto_existing_identity() {
    let backend = MemoryBackend::new();
    let first = login(&backend, &Device::new().open_tab(), PHONE).await;

    let tab = Device::new().open_tab();
    login(&backend, &tab, PHONE).await;

    // The new session's own identity differs, but the caches point at the
    // original one.
    let latest_session = backend.sessions().last().copied().unwrap();
    assert_ne!(latest_session.derive_identity(), first.id);
    assert_eq!(tab.session().get().unwrap(), Some(first.id));
    assert_eq!(tab.mapping().lookup(&phone(PHONE)).unwrap(), Some(first.id));
}

// =============================================================================
// Ambient identity
// =============================================================================

#[tokio::test]
async fn test_ambient_after_login_needs_no_backend_calls() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();
    let resolved = login(&backend, &tab, PHONE).await;
    let calls_after_login = backend.total_calls();

    let resolver = IdentityResolver::new(&backend, &backend, &tab);
    assert_eq!(resolver.resolve_ambient().await.unwrap(), Some(resolved.id));
    assert_eq!(resolver.resolve_ambient().await.unwrap(), Some(resolved.id));

    assert_eq!(backend.total_calls(), calls_after_login);
}

#[tokio::test]
async fn test_new_tab_promotes_device_mapping() {
    let backend = MemoryBackend::new();
    let device = Device::new();
    let resolved = login(&backend, &device.open_tab(), PHONE).await;

    let second_tab = device.open_tab();
    assert_eq!(second_tab.session().get().unwrap(), None);

    let resolver = IdentityResolver::new(&backend, &backend, &second_tab);
    assert_eq!(resolver.resolve_ambient().await.unwrap(), Some(resolved.id));
    assert_eq!(second_tab.session().get().unwrap(), Some(resolved.id));
    assert_eq!(backend.calls(Op::FindByPhone), 1);
    assert_eq!(backend.calls(Op::FindByIdentity), 0);

    // Promoted, so the next call stays local.
    let calls = backend.total_calls();
    resolver.resolve_ambient().await.unwrap();
    assert_eq!(backend.total_calls(), calls);
}

#[tokio::test]
async fn test_nobody_logged_in() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();
    let resolver = IdentityResolver::new(&backend, &backend, &tab);

    assert_eq!(resolver.resolve_ambient().await.unwrap(), None);
    assert!(matches!(
        resolver.require_ambient().await,
        Err(PortalError::Unauthenticated)
    ));
    assert_eq!(backend.calls(Op::CurrentSession), 2);
}

#[tokio::test]
async fn test_sign_out_keeps_device_mapping_but_ends_ambient_identity() {
    let backend = MemoryBackend::new();
    let device = Device::new();
    let tab = device.open_tab();
    let resolved = login(&backend, &tab, PHONE).await;

    let resolver = IdentityResolver::new(&backend, &backend, &tab);
    resolver.sign_out().await.unwrap();

    assert_eq!(resolver.resolve_ambient().await.unwrap(), None);
    let new_tab = device.open_tab();
    assert_eq!(
        IdentityResolver::new(&backend, &backend, &new_tab)
            .resolve_ambient()
            .await
            .unwrap(),
        None
    );
    assert_eq!(tab.mapping().lookup(&phone(PHONE)).unwrap(), Some(resolved.id));
}

#[tokio::test]
async fn test_second_phone_on_device_keeps_first_mapping() {
    let backend = MemoryBackend::new();
    let device = Device::new();
    let first = login(&backend, &device.open_tab(), PHONE).await;
    let second = login(&backend, &device.open_tab(), "5551234567").await;
    assert_ne!(first.id, second.id);

    let tab = device.open_tab();
    assert_eq!(tab.mapping().len().unwrap(), 2);
    assert_eq!(tab.mapping().lookup(&phone(PHONE)).unwrap(), Some(first.id));
    assert_eq!(tab.mapping().last().unwrap(), Some(second.id));
    assert_eq!(
        IdentityResolver::new(&backend, &backend, &tab)
            .resolve_ambient()
            .await
            .unwrap(),
        Some(second.id)
    );
}

#[tokio::test]
async fn test_file_backed_tabs_share_device_file() {
    let dir = tempfile::tempdir().unwrap();
    let device: Arc<dyn KeyValueStorage> =
        Arc::new(FileStorage::new(dir.path().join("device.json")));
    let tab = |name: &str| -> Arc<dyn KeyValueStorage> {
        Arc::new(FileStorage::new(
            dir.path().join("tabs").join(format!("{name}.json")),
        ))
    };

    let backend = MemoryBackend::new();
    let work = IdentityContext::new(tab("work"), Arc::clone(&device));
    let resolved = login(&backend, &work, PHONE).await;

    let home = IdentityContext::new(tab("home"), Arc::clone(&device));
    assert_eq!(
        IdentityResolver::new(&backend, &backend, &home)
            .resolve_ambient()
            .await
            .unwrap(),
        Some(resolved.id)
    );
    assert!(dir.path().join("tabs/home.json").exists());
}

// =============================================================================
// Races and failures
// =============================================================================

#[tokio::test]
async fn test_concurrent_first_login_adopts_winner() {
    let backend = MemoryBackend::new();
    let other_device = Device::new().open_tab();
    let winner = scooter_support_core::IdentityId::random();
    backend.race_next_profile_insert(winner, phone(PHONE));

    let resolved = login(&backend, &other_device, PHONE).await;

    assert_eq!(resolved.id, winner);
    assert!(!resolved.is_new);
    assert_eq!(backend.profiles().len(), 1);
    assert_eq!(other_device.session().get().unwrap(), Some(winner));
}

#[tokio::test]
async fn test_profile_store_outage_fails_identity_creation_and_retry_succeeds() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();
    let resolver = IdentityResolver::new(&backend, &backend, &tab);

    backend.fail(Op::InsertProfile);
    let err = resolver.resolve_from_phone(&phone(PHONE)).await.unwrap_err();
    assert!(matches!(err, PortalError::IdentityCreation(_)));
    assert!(err.is_retryable());
    assert!(backend.profiles().is_empty());
    assert_eq!(tab.session().get().unwrap(), None);

    backend.recover(Op::InsertProfile);
    let resolved = resolver.resolve_from_phone(&phone(PHONE)).await.unwrap();
    assert!(resolved.is_new);
    assert_eq!(backend.profiles().len(), 1);
}

// =============================================================================
// Login flow and profile
// =============================================================================

#[tokio::test]
async fn test_login_flow_end_to_end() {
    let backend = MemoryBackend::new();
    let tab = Device::new().open_tab();
    let resolver = IdentityResolver::new(&backend, &backend, &tab);
    let mut flow = LoginFlow::new(resolver, Duration::ZERO);

    assert!(matches!(
        flow.request_otp("12345").await,
        Err(PortalError::InvalidPhone(_))
    ));
    flow.request_otp(PHONE).await.unwrap();
    assert!(matches!(flow.state(), LoginState::EnteringOtp { .. }));

    assert!(matches!(flow.verify("12ab56").await, Err(PortalError::InvalidOtp)));
    assert_eq!(backend.total_calls(), 0);

    let resolved = flow.verify("123456").await.unwrap();
    assert!(resolved.is_new);
    assert_eq!(flow.state(), &LoginState::EnteringPhone);
    assert_eq!(tab.session().get().unwrap(), Some(resolved.id));
}

#[tokio::test]
async fn test_profile_edit_rejects_phone_of_another_identity() {
    let backend = MemoryBackend::new();
    let alice = login(&backend, &Device::new().open_tab(), PHONE).await;
    let bob = login(&backend, &Device::new().open_tab(), "5551234567").await;

    let profiles = ProfileService::new(&backend);
    assert!(matches!(
        profiles.save(bob.id, Some("Bob"), Some(PHONE)).await,
        Err(PortalError::DuplicatePhone)
    ));

    let saved = profiles
        .save(alice.id, Some("  Alice  "), Some(PHONE))
        .await
        .unwrap();
    assert_eq!(saved.display_name.as_deref(), Some("Alice"));
    assert_eq!(saved.mobile_number, Some(phone(PHONE)));
}
