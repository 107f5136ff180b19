//! Ticket submission.

use tracing::instrument;

use crate::backend::{AuthBackend, BlobStore, ProfileStore, TicketStore};
use crate::error::{Result, add_breadcrumb};
use crate::identity::IdentityResolver;
use crate::models::{Attachment, NewTicket, SupportTicket, TicketForm};

use super::AttachmentUploader;

/// Validates, uploads and records support tickets for the ambient identity.
pub struct TicketSubmission<'a, A, P, T, B> {
    resolver: &'a IdentityResolver<'a, A, P>,
    tickets: &'a T,
    uploader: AttachmentUploader<'a, B>,
}

impl<'a, A, P, T, B> TicketSubmission<'a, A, P, T, B>
where
    A: AuthBackend,
    P: ProfileStore,
    T: TicketStore,
    B: BlobStore,
{
    /// Create a ticket submission service.
    #[must_use]
    pub const fn new(
        resolver: &'a IdentityResolver<'a, A, P>,
        tickets: &'a T,
        uploader: AttachmentUploader<'a, B>,
    ) -> Self {
        Self {
            resolver,
            tickets,
            uploader,
        }
    }

    /// Submit a ticket with at most one attachment.
    ///
    /// Steps run in order and the first failure aborts: validation, the local
    /// size check, identity, upload, insert. An upload that succeeded before
    /// a failed insert is left in the blob store.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `FileTooLarge`, `Unauthenticated`, `Upload` or
    /// `BackendUnavailable`, from the step that failed.
    #[instrument(skip_all, fields(has_attachment = attachment.is_some()))]
    pub async fn submit(
        &self,
        form: &TicketForm,
        attachment: Option<&Attachment>,
    ) -> Result<SupportTicket> {
        let valid = form.validate()?;
        if let Some(file) = attachment {
            self.uploader.check(file)?;
        }

        let identity = self.resolver.require_ambient().await?;

        let attachment_path = match attachment {
            Some(file) => Some(self.uploader.upload(identity, file).await?),
            None => None,
        };

        let ticket = self
            .tickets
            .insert(NewTicket::open(identity, valid, attachment_path))
            .await?;

        tracing::info!(ticket_id = %ticket.id, identity = %identity, "Ticket submitted");
        add_breadcrumb("support", "Ticket submitted", Some(&[("category", ticket.category.as_str())]));
        Ok(ticket)
    }

    /// Tickets of the ambient identity, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when nobody is logged in, or
    /// `BackendUnavailable` if the store fails.
    #[instrument(skip_all)]
    pub async fn list_mine(&self) -> Result<Vec<SupportTicket>> {
        let identity = self.resolver.require_ambient().await?;
        Ok(self.tickets.list_by_identity(identity).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use scooter_support_core::{PhoneNumber, TicketStatus};

    use super::*;
    use crate::error::PortalError;
    use crate::identity::IdentityContext;
    use crate::memory::{MemoryBackend, Op};
    use crate::services::DEFAULT_MAX_ATTACHMENT_BYTES;

    fn form() -> TicketForm {
        TicketForm {
            title: "Battery not charging".to_string(),
            description: "It stopped charging after 2 days".to_string(),
            category: "battery".to_string(),
            priority: "medium".to_string(),
        }
    }

    async fn logged_in(backend: &MemoryBackend, ctx: &IdentityContext) {
        IdentityResolver::new(backend, backend, ctx)
            .resolve_from_phone(&PhoneNumber::parse("9876543210").unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_creates_open_ticket() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        logged_in(&backend, &ctx).await;
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);
        let service = TicketSubmission::new(
            &resolver,
            &backend,
            AttachmentUploader::new(&backend, DEFAULT_MAX_ATTACHMENT_BYTES),
        );

        let ticket = service.submit(&form(), None).await.unwrap();

        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(Some(ticket.customer_id), ctx.session().get().unwrap());
        assert_eq!(ticket.attachment_path, None);
        assert_eq!(service.list_mine().await.unwrap(), vec![ticket]);
    }

    #[tokio::test]
    async fn test_short_title_never_inserts() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        logged_in(&backend, &ctx).await;
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);
        let service = TicketSubmission::new(
            &resolver,
            &backend,
            AttachmentUploader::new(&backend, DEFAULT_MAX_ATTACHMENT_BYTES),
        );
        let form = TicketForm {
            title: "Help".to_string(),
            ..form()
        };

        assert!(matches!(
            service.submit(&form, None).await,
            Err(PortalError::Validation(_))
        ));
        assert_eq!(backend.calls(Op::InsertTicket), 0);
    }

    #[tokio::test]
    async fn test_failed_upload_creates_no_ticket() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        logged_in(&backend, &ctx).await;
        backend.fail(Op::Upload);
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);
        let service = TicketSubmission::new(
            &resolver,
            &backend,
            AttachmentUploader::new(&backend, DEFAULT_MAX_ATTACHMENT_BYTES),
        );
        let file = Attachment::new("photo.jpg", b"jpeg".to_vec());

        assert!(matches!(
            service.submit(&form(), Some(&file)).await,
            Err(PortalError::Upload(_))
        ));
        assert!(backend.tickets().is_empty());
    }

    #[tokio::test]
    async fn test_logged_out_is_unauthenticated() {
        let backend = MemoryBackend::new();
        let ctx = IdentityContext::in_memory();
        let resolver = IdentityResolver::new(&backend, &backend, &ctx);
        let service = TicketSubmission::new(
            &resolver,
            &backend,
            AttachmentUploader::new(&backend, DEFAULT_MAX_ATTACHMENT_BYTES),
        );

        assert!(matches!(
            service.submit(&form(), None).await,
            Err(PortalError::Unauthenticated)
        ));
        assert!(matches!(
            service.list_mine().await,
            Err(PortalError::Unauthenticated)
        ));
    }
}
