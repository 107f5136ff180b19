//! Ticket attachment upload.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tracing::instrument;

use scooter_support_core::IdentityId;

use crate::backend::BlobStore;
use crate::error::{PortalError, Result};
use crate::models::Attachment;

/// Largest accepted attachment: 10 MiB.
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Milliseconds since the epoch, strictly increasing within this process.
fn monotonic_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Blob path for an attachment: `{identity}/{millis}.{ext}`.
#[must_use]
pub fn attachment_path(identity: IdentityId, attachment: &Attachment) -> String {
    format!(
        "{identity}/{}.{}",
        monotonic_millis(),
        attachment.extension()
    )
}

/// Reject a file of `size` bytes when it exceeds `max_bytes`.
///
/// Callers that hold only the file's metadata can use this before reading it.
///
/// # Errors
///
/// Returns `PortalError::FileTooLarge` if the size exceeds the limit.
pub const fn check_size(size: u64, max_bytes: u64) -> Result<()> {
    if size > max_bytes {
        return Err(PortalError::FileTooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(())
}

/// Checks and uploads a single attachment.
pub struct AttachmentUploader<'a, B> {
    blobs: &'a B,
    max_bytes: u64,
}

impl<'a, B: BlobStore> AttachmentUploader<'a, B> {
    /// Uploader with the given size limit.
    #[must_use]
    pub const fn new(blobs: &'a B, max_bytes: u64) -> Self {
        Self { blobs, max_bytes }
    }

    /// Reject oversized files without touching the network.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::FileTooLarge` if the file exceeds the limit.
    pub fn check(&self, attachment: &Attachment) -> Result<()> {
        check_size(attachment.size(), self.max_bytes)
    }

    /// Upload under the identity's namespace and return the stored path.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::FileTooLarge` before any upload, or
    /// `PortalError::Upload` if the blob store fails.
    #[instrument(skip(self, attachment), fields(size = attachment.size()))]
    pub async fn upload(&self, identity: IdentityId, attachment: &Attachment) -> Result<String> {
        self.check(attachment)?;
        let path = attachment_path(identity, attachment);
        let stored = self
            .blobs
            .upload(&path, &attachment.bytes)
            .await
            .map_err(|e| PortalError::Upload(e.to_string()))?;
        tracing::info!(path = %stored, "Attachment uploaded");
        Ok(stored)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBackend, Op};

    #[tokio::test]
    async fn test_oversized_file_never_uploads() {
        let backend = MemoryBackend::new();
        let uploader = AttachmentUploader::new(&backend, DEFAULT_MAX_ATTACHMENT_BYTES);
        let file = Attachment::new("big.png", vec![0; 11 * 1024 * 1024]);

        let err = uploader.upload(IdentityId::random(), &file).await.unwrap_err();

        assert!(matches!(err, PortalError::FileTooLarge { .. }));
        assert_eq!(backend.calls(Op::Upload), 0);
    }

    #[test]
    fn test_check_size_boundary() {
        assert!(check_size(DEFAULT_MAX_ATTACHMENT_BYTES, DEFAULT_MAX_ATTACHMENT_BYTES).is_ok());
        assert!(matches!(
            check_size(DEFAULT_MAX_ATTACHMENT_BYTES + 1, DEFAULT_MAX_ATTACHMENT_BYTES),
            Err(PortalError::FileTooLarge { size, max })
                if size == max + 1
        ));
    }

    #[tokio::test]
    async fn test_exactly_ten_mib_is_accepted() {
        let backend = MemoryBackend::new();
        let uploader = AttachmentUploader::new(&backend, DEFAULT_MAX_ATTACHMENT_BYTES);
        let file = Attachment::new("ok.jpg", vec![0; 10 * 1024 * 1024]);

        assert!(uploader.upload(IdentityId::random(), &file).await.is_ok());
    }

    #[tokio::test]
    async fn test_paths_never_collide() {
        let backend = MemoryBackend::new();
        let uploader = AttachmentUploader::new(&backend, DEFAULT_MAX_ATTACHMENT_BYTES);
        let identity = IdentityId::random();
        let file = Attachment::new("photo.PNG", b"x".to_vec());

        let a = uploader.upload(identity, &file).await.unwrap();
        let b = uploader.upload(identity, &file).await.unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with(&format!("{identity}/")));
        assert!(a.ends_with(".PNG"));
    }

    #[tokio::test]
    async fn test_store_failure_is_upload_error() {
        let backend = MemoryBackend::new();
        backend.fail(Op::Upload);
        let uploader = AttachmentUploader::new(&backend, DEFAULT_MAX_ATTACHMENT_BYTES);
        let file = Attachment::new("a.pdf", b"x".to_vec());

        assert!(matches!(
            uploader.upload(IdentityId::random(), &file).await,
            Err(PortalError::Upload(_))
        ));
    }
}
