//! Filesystem blob store for ticket attachments.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::backend::BlobStore;
use crate::db::RepositoryError;

/// Bucket holding support attachments.
pub const ATTACHMENT_BUCKET: &str = "support-attachments";

/// Blobs stored as files under `<root>/<bucket>/`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    bucket_dir: PathBuf,
}

impl FsBlobStore {
    /// Store attachments under `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            bucket_dir: root.as_ref().join(ATTACHMENT_BUCKET),
        }
    }

    /// Where a stored path lives on disk.
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.bucket_dir.join(path)
    }
}

fn is_relative_and_contained(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

impl BlobStore for FsBlobStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, RepositoryError> {
        if !is_relative_and_contained(path) {
            return Err(RepositoryError::Unavailable(format!(
                "invalid blob path: {path}"
            )));
        }

        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    RepositoryError::Conflict(format!("blob {path} already exists"))
                } else {
                    RepositoryError::Unavailable(e.to_string())
                }
            })?;
        file.write_all(bytes)
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;

        tracing::debug!(path, size = bytes.len(), "Blob stored");
        Ok(path.to_owned())
    }
}
