//! Everything one tab needs, wired together.

use std::sync::Arc;

use sqlx::PgPool;

use crate::blob::FsBlobStore;
use crate::config::PortalConfig;
use crate::db::{
    OrderNumberSequence, OrderRepository, ProfileRepository, QuestionRepository,
    SessionRepository, TicketRepository,
};
use crate::identity::IdentityContext;
use crate::storage::{FileStorage, KeyValueStorage};

/// Shared state for one tab against the `PostgreSQL` backend.
///
/// This struct is cheaply cloneable via `Arc` and hands out the
/// repositories the services are generic over.
#[derive(Clone)]
pub struct Portal {
    inner: Arc<PortalInner>,
}

struct PortalInner {
    config: PortalConfig,
    pool: PgPool,
    device: Arc<dyn KeyValueStorage>,
    context: IdentityContext,
    blobs: FsBlobStore,
}

impl Portal {
    /// Create the state for `tab`, with file-backed tab and device storage
    /// under the configured state directory.
    #[must_use]
    pub fn new(config: PortalConfig, pool: PgPool, tab: &str) -> Self {
        let device: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(config.device_file()));
        let tab_storage: Arc<dyn KeyValueStorage> =
            Arc::new(FileStorage::new(config.tab_file(tab)));
        let context = IdentityContext::new(tab_storage, Arc::clone(&device));
        let blobs = FsBlobStore::new(config.blob_root());

        Self {
            inner: Arc::new(PortalInner {
                config,
                pool,
                device,
                context,
                blobs,
            }),
        }
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// This tab's identity caches.
    #[must_use]
    pub fn context(&self) -> &IdentityContext {
        &self.inner.context
    }

    /// Attachment storage.
    #[must_use]
    pub fn blobs(&self) -> &FsBlobStore {
        &self.inner.blobs
    }

    /// Session issuance. The current session is kept in device storage,
    /// so every tab on the device shares it.
    #[must_use]
    pub fn sessions(&self) -> SessionRepository<'_> {
        SessionRepository::new(&self.inner.pool, self.inner.device.as_ref())
    }

    /// Profile store.
    #[must_use]
    pub fn profiles(&self) -> ProfileRepository<'_> {
        ProfileRepository::new(&self.inner.pool)
    }

    /// Ticket store.
    #[must_use]
    pub fn tickets(&self) -> TicketRepository<'_> {
        TicketRepository::new(&self.inner.pool)
    }

    /// Order store.
    #[must_use]
    pub fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(&self.inner.pool)
    }

    /// Order number source.
    #[must_use]
    pub fn order_numbers(&self) -> OrderNumberSequence<'_> {
        OrderNumberSequence::new(&self.inner.pool)
    }

    /// Question store.
    #[must_use]
    pub fn questions(&self) -> QuestionRepository<'_> {
        QuestionRepository::new(&self.inner.pool)
    }
}
