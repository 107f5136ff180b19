//! Profile viewing and editing.

use tracing::instrument;

use scooter_support_core::{IdentityId, PhoneNumber};

use crate::backend::ProfileStore;
use crate::db::RepositoryError;
use crate::error::{PortalError, Result};
use crate::models::{CustomerIdentity, ProfileUpdate};

/// Reads and edits a customer's own profile.
pub struct ProfileService<'a, P> {
    profiles: &'a P,
}

impl<'a, P: ProfileStore> ProfileService<'a, P> {
    /// Create a profile service.
    #[must_use]
    pub const fn new(profiles: &'a P) -> Self {
        Self { profiles }
    }

    /// The profile for `identity`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no profile, or `BackendUnavailable`.
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn load(&self, identity: IdentityId) -> Result<CustomerIdentity> {
        self.profiles
            .find_by_identity(identity)
            .await?
            .ok_or_else(|| PortalError::NotFound("profile".to_owned()))
    }

    /// Save display name and phone. Blank values are stored as empty.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPhone` for a malformed number, `DuplicatePhone` if
    /// another identity owns the number, or `BackendUnavailable`.
    #[instrument(skip(self, display_name, phone), fields(identity = %identity))]
    pub async fn save(
        &self,
        identity: IdentityId,
        display_name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<CustomerIdentity> {
        let display_name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned);
        let mobile_number = phone
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PhoneNumber::parse)
            .transpose()?;

        if let Some(phone) = &mobile_number
            && let Some(owner) = self.profiles.find_by_phone(phone).await?
            && owner.id != identity
        {
            return Err(PortalError::DuplicatePhone);
        }

        let update = ProfileUpdate {
            display_name,
            mobile_number,
        };
        match self.profiles.upsert_by_identity_id(identity, update).await {
            Ok(profile) => {
                tracing::info!("Profile saved");
                Ok(profile)
            }
            Err(RepositoryError::Conflict(_)) => Err(PortalError::DuplicatePhone),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use crate::models::NewProfile;

    fn phone(s: &str) -> PhoneNumber {
        PhoneNumber::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_profile() {
        let backend = MemoryBackend::new();
        let service = ProfileService::new(&backend);
        assert!(matches!(
            service.load(IdentityId::random()).await,
            Err(PortalError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_updates_name_and_phone() {
        let backend = MemoryBackend::new();
        let me = backend.seed_profile(NewProfile::for_phone(IdentityId::random(), phone("9876543210")));
        let service = ProfileService::new(&backend);

        let saved = service
            .save(me.id, Some("  Asha  "), Some("9123456789"))
            .await
            .unwrap();

        assert_eq!(saved.display_name.as_deref(), Some("Asha"));
        assert_eq!(saved.mobile_number, Some(phone("9123456789")));
        assert_eq!(service.load(me.id).await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_keeping_own_phone_is_fine() {
        let backend = MemoryBackend::new();
        let me = backend.seed_profile(NewProfile::for_phone(IdentityId::random(), phone("9876543210")));
        let service = ProfileService::new(&backend);

        assert!(service.save(me.id, Some(""), Some("9876543210")).await.is_ok());
        assert_eq!(service.load(me.id).await.unwrap().display_name, None);
    }

    #[tokio::test]
    async fn test_phone_owned_by_someone_else() {
        let backend = MemoryBackend::new();
        backend.seed_profile(NewProfile::for_phone(IdentityId::random(), phone("9876543210")));
        let me = backend.seed_profile(NewProfile::for_phone(IdentityId::random(), phone("9123456789")));
        let service = ProfileService::new(&backend);

        assert!(matches!(
            service.save(me.id, None, Some("9876543210")).await,
            Err(PortalError::DuplicatePhone)
        ));
    }

    #[tokio::test]
    async fn test_malformed_phone() {
        let backend = MemoryBackend::new();
        let service = ProfileService::new(&backend);
        assert!(matches!(
            service.save(IdentityId::random(), None, Some("12-34")).await,
            Err(PortalError::InvalidPhone(_))
        ));
    }
}
