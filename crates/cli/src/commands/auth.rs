//! Login, logout and the ambient identity.

use scooter_support_portal::PortalError;
use scooter_support_portal::identity::{IdentityResolver, LoginFlow};
use scooter_support_portal::services::ProfileService;
use scooter_support_portal::state::Portal;

use super::CliError;

/// Request a passcode for `phone`, then verify `otp`.
///
/// # Errors
///
/// Returns `InvalidPhone`, `InvalidOtp`, `IdentityCreation` or
/// `BackendUnavailable`.
pub async fn login(portal: &Portal, phone: &str, otp: &str) -> Result<(), CliError> {
    let sessions = portal.sessions();
    let profiles = portal.profiles();
    let resolver = IdentityResolver::new(&sessions, &profiles, portal.context());
    let mut flow = LoginFlow::new(resolver, portal.config().otp_delay);

    flow.request_otp(phone).await?;
    tracing::info!("Passcode sent");
    let resolved = flow.verify(otp).await?;

    #[allow(clippy::print_stdout)]
    {
        if resolved.is_new {
            println!("Welcome! Created account {}", resolved.id);
        } else {
            println!("Welcome back! Logged in as {}", resolved.id);
        }
    }
    Ok(())
}

/// Sign out this device's session and clear this tab's cache.
///
/// # Errors
///
/// Returns `BackendUnavailable` if the session cannot be revoked.
pub async fn logout(portal: &Portal) -> Result<(), CliError> {
    let sessions = portal.sessions();
    let profiles = portal.profiles();
    IdentityResolver::new(&sessions, &profiles, portal.context())
        .sign_out()
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Signed out");
    }
    Ok(())
}

/// Print the identity this tab acts as, with its profile when there is one.
///
/// # Errors
///
/// Returns `BackendUnavailable` if a backend call fails.
pub async fn whoami(portal: &Portal) -> Result<(), CliError> {
    let sessions = portal.sessions();
    let profiles = portal.profiles();
    let resolver = IdentityResolver::new(&sessions, &profiles, portal.context());

    let Some(identity) = resolver.resolve_ambient().await? else {
        #[allow(clippy::print_stdout)]
        {
            println!("Not logged in");
        }
        return Ok(());
    };

    let profile = match ProfileService::new(&profiles).load(identity).await {
        Ok(profile) => Some(profile),
        Err(PortalError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    #[allow(clippy::print_stdout)]
    {
        println!("Identity: {identity}");
        if let Some(profile) = profile {
            println!(
                "Name:     {}",
                profile.display_name.as_deref().unwrap_or("-")
            );
            println!(
                "Phone:    {}",
                profile
                    .mobile_number
                    .as_ref()
                    .map_or_else(|| "-".to_owned(), |p| p.redacted())
            );
            println!("Role:     {}", profile.role);
        }
    }
    Ok(())
}
