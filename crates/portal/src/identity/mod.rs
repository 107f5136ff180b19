//! Identity resolution.
//!
//! A customer logs in with a phone number, but the backend only hands out
//! anonymous sessions. [`IdentityResolver`] reconciles the two: the first
//! login for a phone mints an identity from the new session and binds a
//! profile to it; later logins for the same phone, on any device, reuse that
//! identity. The result is cached per tab ([`SessionCache`]) and per device
//! ([`PersistentMapping`]) so later operations resolve without backend calls.

mod context;
mod login;

pub use context::{IdentityContext, PersistentMapping, SessionCache};
pub use login::{LoginFlow, LoginState};

use serde::Serialize;
use tracing::instrument;

use scooter_support_core::{IdentityId, PhoneNumber};

use crate::backend::{AuthBackend, ProfileStore};
use crate::db::RepositoryError;
use crate::error::{PortalError, Result, clear_sentry_user};
use crate::models::NewProfile;

/// Outcome of a phone login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    /// The stable identity for the phone.
    pub id: IdentityId,
    /// Whether this login created the profile.
    pub is_new: bool,
}

/// Maps phone logins and ambient sessions to a stable identity.
pub struct IdentityResolver<'a, A, P> {
    auth: &'a A,
    profiles: &'a P,
    context: &'a IdentityContext,
}

impl<'a, A, P> IdentityResolver<'a, A, P>
where
    A: AuthBackend,
    P: ProfileStore,
{
    /// Create a resolver for one tab.
    #[must_use]
    pub const fn new(auth: &'a A, profiles: &'a P, context: &'a IdentityContext) -> Self {
        Self {
            auth,
            profiles,
            context,
        }
    }

    /// The caches this resolver reads and writes.
    #[must_use]
    pub const fn context(&self) -> &IdentityContext {
        self.context
    }

    /// Resolve a phone login to an identity, creating one on first sight.
    ///
    /// A new anonymous session is established either way. For a known phone
    /// the session is remapped onto the existing identity through the caches.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::IdentityCreation` if any backend step fails, or
    /// `PortalError::LocalStorage` if the caches cannot be written.
    #[instrument(skip_all, fields(phone = %phone.redacted()))]
    pub async fn resolve_from_phone(&self, phone: &PhoneNumber) -> Result<ResolvedIdentity> {
        let existing = self
            .profiles
            .find_by_phone(phone)
            .await
            .map_err(creation_failed)?;

        let session = self
            .auth
            .create_anonymous_session()
            .await
            .map_err(creation_failed)?;

        let resolved = match existing {
            Some(profile) => {
                tracing::info!(identity = %profile.id, session_id = %session.id, "Known phone, reusing identity");
                ResolvedIdentity {
                    id: profile.id,
                    is_new: false,
                }
            }
            None => self.create_profile(phone, session.derive_identity()).await?,
        };

        // Device mapping first: a tab must never look logged in without it.
        self.context.mapping().record(phone, resolved.id)?;
        self.context.session().set(resolved.id)?;
        Ok(resolved)
    }

    async fn create_profile(
        &self,
        phone: &PhoneNumber,
        identity: IdentityId,
    ) -> Result<ResolvedIdentity> {
        match self
            .profiles
            .insert(NewProfile::for_phone(identity, phone.clone()))
            .await
        {
            Ok(profile) => {
                tracing::info!(identity = %profile.id, "Created profile for new phone");
                Ok(ResolvedIdentity {
                    id: profile.id,
                    is_new: true,
                })
            }
            Err(RepositoryError::Conflict(_)) => {
                // Another device bound the phone between lookup and insert.
                let winner = self
                    .profiles
                    .find_by_phone(phone)
                    .await
                    .map_err(creation_failed)?
                    .ok_or_else(|| {
                        PortalError::IdentityCreation(
                            "phone conflict but no profile found".to_owned(),
                        )
                    })?;
                tracing::warn!(identity = %winner.id, "Lost race to bind phone, adopting winner");
                Ok(ResolvedIdentity {
                    id: winner.id,
                    is_new: false,
                })
            }
            Err(e) => Err(creation_failed(e)),
        }
    }

    /// The identity for this tab without a login, if there is one.
    ///
    /// Checks the tab cache first. On a miss, and only while the backend
    /// reports a live session, falls back to the device mapping (promoting a
    /// hit into the tab cache) and then to the session's own identity. Never
    /// touches the profile store.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::BackendUnavailable` if the session check fails, or
    /// `PortalError::LocalStorage` if the caches cannot be read or written.
    #[instrument(skip_all)]
    pub async fn resolve_ambient(&self) -> Result<Option<IdentityId>> {
        if let Some(id) = self.context.session().get()? {
            return Ok(Some(id));
        }

        let Some(session) = self.auth.current_session().await? else {
            return Ok(None);
        };

        if let Some(id) = self.context.mapping().last()? {
            self.context.session().set(id)?;
            tracing::debug!(identity = %id, "Promoted device mapping into tab cache");
            return Ok(Some(id));
        }

        Ok(Some(session.derive_identity()))
    }

    /// [`Self::resolve_ambient`], failing when nobody is logged in.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::Unauthenticated` when no identity resolves, or
    /// whatever `resolve_ambient` returns.
    pub async fn require_ambient(&self) -> Result<IdentityId> {
        self.resolve_ambient()
            .await?
            .ok_or(PortalError::Unauthenticated)
    }

    /// End the backend session and forget this tab's identity.
    ///
    /// The device mapping is kept.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::BackendUnavailable` if the backend sign-out fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await?;
        self.context.session().clear()?;
        clear_sentry_user();
        tracing::info!("Signed out");
        Ok(())
    }
}

fn creation_failed(e: RepositoryError) -> PortalError {
    PortalError::IdentityCreation(e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::{MemoryBackend, Op};
    use crate::storage::{KeyValueStorage, MemoryStorage, StorageError};

    fn phone() -> PhoneNumber {
        PhoneNumber::parse("9876543210").unwrap()
    }

    #[tokio::test]
    async fn test_new_phone_creates_one_profile() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);

        let resolved = resolver.resolve_from_phone(&phone()).await.unwrap();

        assert!(resolved.is_new);
        let profiles = backend.profiles();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, resolved.id);
        assert_eq!(profiles[0].display_name.as_deref(), Some("User 3210"));
        assert_eq!(resolved.id, backend.sessions()[0].derive_identity());
    }

    #[tokio::test]
    async fn test_known_phone_reuses_identity() {
        let backend = MemoryBackend::new();
        let first = IdentityContext::in_memory();
        let id = IdentityResolver::new(&backend, &backend, &first)
            .resolve_from_phone(&phone())
            .await
            .unwrap()
            .id;

        let other_device = IdentityContext::in_memory();
        let again = IdentityResolver::new(&backend, &backend, &other_device)
            .resolve_from_phone(&phone())
            .await
            .unwrap();

        assert_eq!(again, ResolvedIdentity { id, is_new: false });
        assert_eq!(backend.profiles().len(), 1);
        assert_eq!(backend.sessions().len(), 2);
        assert_eq!(other_device.session().get().unwrap(), Some(id));
    }

    #[tokio::test]
    async fn test_ambient_after_login_makes_no_backend_calls() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);
        let id = resolver.resolve_from_phone(&phone()).await.unwrap().id;

        let before = backend.total_calls();
        assert_eq!(resolver.resolve_ambient().await.unwrap(), Some(id));
        assert_eq!(backend.total_calls(), before);
    }

    #[tokio::test]
    async fn test_ambient_without_login_is_none() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);

        assert_eq!(resolver.resolve_ambient().await.unwrap(), None);
        assert!(matches!(
            resolver.require_ambient().await,
            Err(PortalError::Unauthenticated)
        ));
        assert_eq!(backend.calls(Op::FindByPhone), 0);
    }

    #[tokio::test]
    async fn test_new_tab_promotes_device_mapping() {
        let backend = MemoryBackend::new();
        let first = IdentityContext::in_memory();
        let id = IdentityResolver::new(&backend, &backend, &first)
            .resolve_from_phone(&phone())
            .await
            .unwrap()
            .id;

        let second = first.new_tab(std::sync::Arc::new(crate::storage::MemoryStorage::new()));
        let resolver = IdentityResolver::new(&backend, &backend, &second);

        assert_eq!(resolver.resolve_ambient().await.unwrap(), Some(id));
        assert_eq!(second.session().get().unwrap(), Some(id));
        assert_eq!(backend.calls(Op::FindByPhone), 1);
    }

    #[tokio::test]
    async fn test_ambient_falls_back_to_session_identity() {
        let backend = MemoryBackend::new();
        let session = backend.create_anonymous_session().await.unwrap();
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);

        assert_eq!(
            resolver.resolve_ambient().await.unwrap(),
            Some(session.derive_identity())
        );
    }

    #[tokio::test]
    async fn test_lost_race_adopts_winner() {
        let backend = MemoryBackend::new();
        let winner = IdentityId::random();
        backend.race_next_profile_insert(winner, phone());
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);

        let resolved = resolver.resolve_from_phone(&phone()).await.unwrap();

        assert_eq!(resolved, ResolvedIdentity { id: winner, is_new: false });
        assert_eq!(backend.profiles().len(), 1);
        assert_eq!(ctx.mapping().lookup(&phone()).unwrap(), Some(winner));
    }

    #[tokio::test]
    async fn test_backend_failure_is_identity_creation_error() {
        let backend = MemoryBackend::new();
        backend.fail(Op::CreateSession);
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);

        let err = resolver.resolve_from_phone(&phone()).await.unwrap_err();

        assert!(matches!(err, PortalError::IdentityCreation(_)));
        assert_eq!(ctx.session().get().unwrap(), None);
        assert!(backend.profiles().is_empty());
    }

    /// Device storage that can be read but never written.
    struct ReadOnlyDevice;

    impl KeyValueStorage for ReadOnlyDevice {
        fn get(&self, _key: &str) -> std::result::Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied).into())
        }

        fn remove(&self, _key: &str) -> std::result::Result<(), StorageError> {
            Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied).into())
        }
    }

    #[tokio::test]
    async fn test_unwritable_device_leaves_tab_logged_out() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(ReadOnlyDevice),
        );
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);

        let err = resolver.resolve_from_phone(&phone()).await.unwrap_err();

        assert!(matches!(err, PortalError::LocalStorage(_)));
        assert_eq!(ctx.session().get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_out_keeps_device_mapping() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);
        let id = resolver.resolve_from_phone(&phone()).await.unwrap().id;

        resolver.sign_out().await.unwrap();

        assert_eq!(resolver.resolve_ambient().await.unwrap(), None);
        assert_eq!(ctx.mapping().lookup(&phone()).unwrap(), Some(id));
    }
}
