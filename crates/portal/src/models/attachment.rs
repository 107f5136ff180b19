//! Files attached to a support request.

/// A file picked by the user, held in memory until upload.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name, used only for its extension.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Fallback extension when the original name has none.
    pub const DEFAULT_EXTENSION: &'static str = "bin";

    /// Wrap a picked file.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Extension of the original name, case preserved, restricted to ASCII
    /// alphanumerics so it is always safe inside a storage path.
    #[must_use]
    pub fn extension(&self) -> String {
        let ext: String = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();

        if ext.is_empty() {
            Self::DEFAULT_EXTENSION.to_owned()
        } else {
            ext
        }
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("size", &self.bytes.len())
            .finish()
    }
}
