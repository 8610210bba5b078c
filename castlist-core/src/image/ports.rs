use async_trait::async_trait;

use super::filter::ResampleFilter;
use crate::error::Result;

/// Acceptance rules applied to uploaded photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Accepted MIME types, e.g. `image/jpeg`.
    pub allowed_types: Vec<String>,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
            min_width: 1,
            min_height: 1,
            max_width: 4096,
            max_height: 4096,
        }
    }
}

/// Outcome of a validation call that reached the validator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub details: String,
}

impl ValidationReport {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            details: String::new(),
        }
    }

    pub fn rejected(details: impl Into<String>) -> Self {
        Self {
            valid: false,
            details: details.into(),
        }
    }
}

/// Image validator / resizer collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    async fn validate(
        &self,
        image: &[u8],
        policy: &ValidationPolicy,
    ) -> Result<ValidationReport>;

    /// Resize to exactly `width` x `height`. `None` means the collaborator
    /// answered without producing an image.
    async fn resize(
        &self,
        image: &[u8],
        width: u32,
        height: u32,
        filter: ResampleFilter,
    ) -> Result<Option<Vec<u8>>>;
}

/// An open streaming upload. Chunks are appended in the order they are sent.
#[async_trait]
pub trait UploadStream: Send {
    async fn send(&mut self, chunk: Vec<u8>) -> Result<()>;

    /// Close the stream and return the stored blob id.
    async fn finish(self: Box<Self>) -> Result<String>;
}

/// Binary photo storage addressed by category and opaque id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageBlobStore: Send + Sync {
    async fn start_upload(&self, category: &str) -> Result<Box<dyn UploadStream>>;

    async fn replace(
        &self,
        category: &str,
        id: &str,
        image: Vec<u8>,
        create_if_not_exist: bool,
    ) -> Result<String>;

    async fn delete(&self, category: &str, id: &str) -> Result<()>;
}
