use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// An uploaded image file, kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: None,
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum RemovalError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("invalid upload content type: {0}")]
    InvalidContentType(String),
}

/// Trait for background-removal backends
/// Allows swapping the hosted API for a local model or a test double
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Remove the background from `upload`
    ///
    /// # Returns
    /// * PNG bytes with a transparent background
    async fn remove(&self, upload: Upload) -> Result<Bytes, RemovalError>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}
