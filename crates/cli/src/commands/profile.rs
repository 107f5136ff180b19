//! Profile viewing and editing.

use scooter_support_portal::identity::IdentityResolver;
use scooter_support_portal::models::CustomerIdentity;
use scooter_support_portal::services::ProfileService;
use scooter_support_portal::state::Portal;

use super::CliError;

/// Show the logged-in customer's profile.
///
/// # Errors
///
/// Returns `Unauthenticated`, `NotFound` or `BackendUnavailable`.
pub async fn show(portal: &Portal) -> Result<(), CliError> {
    let sessions = portal.sessions();
    let profiles = portal.profiles();
    let identity = IdentityResolver::new(&sessions, &profiles, portal.context())
        .require_ambient()
        .await?;

    let profile = ProfileService::new(&profiles).load(identity).await?;
    print_profile(&profile);
    Ok(())
}

/// Save display name and phone for the logged-in customer.
///
/// # Errors
///
/// Returns `Unauthenticated`, `InvalidPhone`, `DuplicatePhone` or
/// `BackendUnavailable`.
pub async fn update(
    portal: &Portal,
    name: Option<&str>,
    phone: Option<&str>,
) -> Result<(), CliError> {
    let sessions = portal.sessions();
    let profiles = portal.profiles();
    let identity = IdentityResolver::new(&sessions, &profiles, portal.context())
        .require_ambient()
        .await?;

    let profile = ProfileService::new(&profiles)
        .save(identity, name, phone)
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Profile saved");
    }
    print_profile(&profile);
    Ok(())
}

fn print_profile(profile: &CustomerIdentity) {
    #[allow(clippy::print_stdout)]
    {
        println!("Identity: {}", profile.id);
        println!(
            "Name:     {}",
            profile.display_name.as_deref().unwrap_or("-")
        );
        println!(
            "Phone:    {}",
            profile
                .mobile_number
                .as_ref()
                .map_or("-", |p| p.as_str())
        );
        println!("Role:     {}", profile.role);
        println!("Since:    {}", profile.created_at.format("%Y-%m-%d"));
    }
}
