use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::filter::ResampleFilter;
use super::ports::{ImageBlobStore, ImageProcessor, ValidationPolicy};
use crate::error::{CatalogError, Result};

/// Settings of the photo pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePipelineConfig {
    pub photo_width: u32,
    pub photo_height: u32,
    pub filter: ResampleFilter,
    pub policy: ValidationPolicy,
    /// Number of chunks a photo is split into before streaming.
    pub upload_parallelism: usize,
    /// Blob store category holding person photos.
    pub category: String,
    /// Public URL prefix photos are served from.
    pub base_photo_url: String,
}

impl Default for ImagePipelineConfig {
    fn default() -> Self {
        Self {
            photo_width: 300,
            photo_height: 400,
            filter: ResampleFilter::default(),
            policy: ValidationPolicy::default(),
            upload_parallelism: num_cpus::get(),
            category: "persons".to_string(),
            base_photo_url: String::new(),
        }
    }
}

/// Validate -> resize -> store. Every stage short-circuits on failure and
/// nothing is rolled back.
#[derive(Clone)]
pub struct ImagePipeline {
    processor: Arc<dyn ImageProcessor>,
    store: Arc<dyn ImageBlobStore>,
    config: ImagePipelineConfig,
}

impl fmt::Debug for ImagePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePipeline")
            .field("processor", &type_name_of_val(self.processor.as_ref()))
            .field("store", &type_name_of_val(self.store.as_ref()))
            .field("config", &self.config)
            .finish()
    }
}

impl ImagePipeline {
    pub fn new(
        processor: Arc<dyn ImageProcessor>,
        store: Arc<dyn ImageBlobStore>,
        config: ImagePipelineConfig,
    ) -> Self {
        Self {
            processor,
            store,
            config,
        }
    }

    /// Reject photos that break the configured policy.
    pub async fn validate(&self, image: &[u8]) -> Result<()> {
        let report = self.processor.validate(image, &self.config.policy).await?;
        if report.valid {
            Ok(())
        } else {
            Err(CatalogError::InvalidImage {
                details: report.details,
            })
        }
    }

    pub async fn resize(&self, image: &[u8]) -> Result<Vec<u8>> {
        let resized = self
            .processor
            .resize(
                image,
                self.config.photo_width,
                self.config.photo_height,
                self.config.filter,
            )
            .await?;

        match resized {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(CatalogError::Internal("can't resize image".to_string())),
        }
    }

    /// Store a new photo and return its blob id.
    ///
    /// The resized bytes go over a single stream in `upload_parallelism`
    /// sequential chunks. Chunks already sent when a later one fails are
    /// abandoned on the store side.
    pub async fn upload(&self, image: &[u8]) -> Result<String> {
        let resized = self.checked_resize(image).await?;

        let mut stream = self.store.start_upload(&self.config.category).await?;
        let chunk_size = chunk_size(resized.len(), self.config.upload_parallelism);
        for chunk in resized.chunks(chunk_size) {
            debug!(len = chunk.len(), "sending photo chunk");
            stream.send(chunk.to_vec()).await?;
        }

        let id = stream.finish().await?;
        info!(photo_id = %id, "Uploaded photo");
        Ok(id)
    }

    /// Overwrite the photo stored under `id` in one call.
    pub async fn replace(
        &self,
        image: &[u8],
        id: &str,
        create_if_not_exist: bool,
    ) -> Result<String> {
        let resized = self.checked_resize(image).await?;
        self.store
            .replace(&self.config.category, id, resized, create_if_not_exist)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        debug!(photo_id = id, "Deleting photo");
        self.store.delete(&self.config.category, id).await
    }

    /// Public URL of a stored photo; empty when there is no photo.
    pub fn photo_url(&self, id: &str) -> String {
        if id.is_empty() {
            return String::new();
        }
        format!(
            "{}/{}/{}",
            self.config.base_photo_url.trim_end_matches('/'),
            self.config.category,
            id
        )
    }

    async fn checked_resize(&self, image: &[u8]) -> Result<Vec<u8>> {
        self.validate(image).await?;
        let resized = self.resize(image).await?;
        debug!(
            original = image.len(),
            resized = resized.len(),
            "Resized photo"
        );
        Ok(resized)
    }
}

/// `ceil(len / parts)`, never zero.
fn chunk_size(len: usize, parts: usize) -> usize {
    len.div_ceil(parts.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::ErrorKind;
    use crate::image::ports::{
        MockImageBlobStore, MockImageProcessor, UploadStream, ValidationReport,
    };

    #[derive(Default)]
    struct RecordingStream {
        chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    #[async_trait]
    impl UploadStream for RecordingStream {
        async fn send(&mut self, chunk: Vec<u8>) -> Result<()> {
            self.chunks.lock().expect("lock").push(chunk);
            Ok(())
        }

        async fn finish(self: Box<Self>) -> Result<String> {
            Ok("blob-1".to_string())
        }
    }

    fn config(parallelism: usize) -> ImagePipelineConfig {
        ImagePipelineConfig {
            upload_parallelism: parallelism,
            base_photo_url: "http://photos.local/".to_string(),
            ..Default::default()
        }
    }

    fn pipeline(
        processor: MockImageProcessor,
        store: MockImageBlobStore,
        parallelism: usize,
    ) -> ImagePipeline {
        ImagePipeline::new(Arc::new(processor), Arc::new(store), config(parallelism))
    }

    #[tokio::test]
    async fn rejected_photo_never_reaches_resize_or_store() {
        let mut processor = MockImageProcessor::new();
        processor.expect_validate().times(1).returning(|_, _| {
            Ok(ValidationReport::rejected("image width 50 is less than 100"))
        });
        processor.expect_resize().never();
        let mut store = MockImageBlobStore::new();
        store.expect_start_upload().never();

        let err = pipeline(processor, store, 4)
            .upload(b"tiny")
            .await
            .expect_err("should reject");
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
        assert_eq!(err.user_message(), Some("image width 50 is less than 100"));
    }

    #[tokio::test]
    async fn empty_resize_result_is_internal() {
        let mut processor = MockImageProcessor::new();
        processor
            .expect_validate()
            .returning(|_, _| Ok(ValidationReport::accepted()));
        processor.expect_resize().returning(|_, _, _, _| Ok(None));
        let mut store = MockImageBlobStore::new();
        store.expect_start_upload().never();

        let err = pipeline(processor, store, 4)
            .upload(b"photo")
            .await
            .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("can't resize image"));
    }

    #[tokio::test]
    async fn upload_streams_ceil_sized_chunks_in_order() {
        let mut processor = MockImageProcessor::new();
        processor
            .expect_validate()
            .returning(|_, _| Ok(ValidationReport::accepted()));
        processor
            .expect_resize()
            .withf(|_, w, h, f| {
                *w == 300 && *h == 400 && *f == ResampleFilter::NearestNeighbor
            })
            .returning(|_, _, _, _| Ok(Some((0u8..10).collect())));

        let chunks = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&chunks);
        let mut store = MockImageBlobStore::new();
        store
            .expect_start_upload()
            .withf(|category| category == "persons")
            .times(1)
            .returning(move |_| {
                Ok(Box::new(RecordingStream {
                    chunks: Arc::clone(&recorded),
                }) as Box<dyn UploadStream>)
            });

        let id = pipeline(processor, store, 4)
            .upload(b"original")
            .await
            .expect("upload");
        assert_eq!(id, "blob-1");

        let chunks = chunks.lock().expect("lock").clone();
        assert_eq!(
            chunks,
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8], vec![9]]
        );
    }

    #[tokio::test]
    async fn replace_passes_flag_and_category() {
        let mut processor = MockImageProcessor::new();
        processor
            .expect_validate()
            .returning(|_, _| Ok(ValidationReport::accepted()));
        processor
            .expect_resize()
            .returning(|_, _, _, _| Ok(Some(vec![1, 2, 3])));
        let mut store = MockImageBlobStore::new();
        store
            .expect_replace()
            .withf(|category, id, image, create| {
                category == "persons" && id == "blob-7" && image == &[1, 2, 3] && *create
            })
            .returning(|_, id, _, _| Ok(id.to_string()));

        let id = pipeline(processor, store, 2)
            .replace(b"photo", "blob-7", true)
            .await
            .expect("replace");
        assert_eq!(id, "blob-7");
    }

    #[tokio::test]
    async fn delete_is_a_passthrough() {
        let mut store = MockImageBlobStore::new();
        store
            .expect_delete()
            .withf(|category, id| category == "persons" && id == "blob-3")
            .times(1)
            .returning(|_, _| Ok(()));

        pipeline(MockImageProcessor::new(), store, 1)
            .delete("blob-3")
            .await
            .expect("delete");
    }

    #[test]
    fn photo_url_joins_base_category_and_id() {
        let pipeline =
            pipeline(MockImageProcessor::new(), MockImageBlobStore::new(), 1);
        assert_eq!(
            pipeline.photo_url("abc"),
            "http://photos.local/persons/abc"
        );
        assert_eq!(pipeline.photo_url(""), "");
    }

    #[test]
    fn chunk_size_rounds_up_and_never_hits_zero() {
        assert_eq!(chunk_size(10, 4), 3);
        assert_eq!(chunk_size(8, 4), 2);
        assert_eq!(chunk_size(3, 8), 1);
        assert_eq!(chunk_size(5, 0), 5);
    }
}
