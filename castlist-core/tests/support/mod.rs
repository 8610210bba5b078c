//! Shared fakes for core integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use castlist_core::error::{CatalogError, Result};
use castlist_core::events::PersonEvents;
use castlist_core::image::{
    ImagePipeline, ImagePipelineConfig, ImageProcessor, MemoryBlobStore,
    ResampleFilter, ValidationPolicy, ValidationReport,
};
use castlist_core::database::InMemoryPersonsRepository;
use castlist_core::{PersonPayload, PersonsService};
use castlist_model::PersonID;
use chrono::NaiveDate;
use tokio::sync::Mutex;

/// Bytes the fake processor treats as a photo below the minimum width.
pub const NARROW_PHOTO: &[u8] = b"narrow-photo";

/// Processor fake: rejects [`NARROW_PHOTO`], otherwise "resizes" by
/// prefixing the input.
#[derive(Debug, Default)]
pub struct FakeProcessor {
    pub validations: AtomicUsize,
    pub resizes: AtomicUsize,
}

#[async_trait]
impl ImageProcessor for FakeProcessor {
    async fn validate(
        &self,
        image: &[u8],
        policy: &ValidationPolicy,
    ) -> Result<ValidationReport> {
        self.validations.fetch_add(1, Ordering::SeqCst);
        if image == NARROW_PHOTO {
            return Ok(ValidationReport::rejected(format!(
                "image width 10 is less than {}",
                policy.min_width
            )));
        }
        Ok(ValidationReport::accepted())
    }

    async fn resize(
        &self,
        image: &[u8],
        _width: u32,
        _height: u32,
        _filter: ResampleFilter,
    ) -> Result<Option<Vec<u8>>> {
        self.resizes.fetch_add(1, Ordering::SeqCst);
        let mut out = b"resized:".to_vec();
        out.extend_from_slice(image);
        Ok(Some(out))
    }
}

/// Event sink that records ids, optionally failing every call.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    pub deleted: Mutex<Vec<PersonID>>,
    pub fail: bool,
}

#[async_trait]
impl PersonEvents for RecordingEvents {
    async fn person_deleted(&self, id: PersonID) -> Result<()> {
        self.deleted.lock().await.push(id);
        if self.fail {
            return Err(CatalogError::Internal("broker unavailable".into()));
        }
        Ok(())
    }
}

impl RecordingEvents {
    /// Wait until `count` events were attempted or the timeout passes.
    pub async fn wait_for(&self, count: usize) -> Vec<PersonID> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let seen = self.deleted.lock().await.clone();
            if seen.len() >= count || tokio::time::Instant::now() >= deadline {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

pub struct Harness {
    pub service: PersonsService,
    pub repo: Arc<InMemoryPersonsRepository>,
    pub blobs: MemoryBlobStore,
    pub processor: Arc<FakeProcessor>,
    pub events: Arc<RecordingEvents>,
}

pub fn harness() -> Harness {
    harness_with_events(RecordingEvents::default())
}

pub fn harness_with_events(events: RecordingEvents) -> Harness {
    let repo = Arc::new(InMemoryPersonsRepository::new());
    let blobs = MemoryBlobStore::new();
    let processor = Arc::new(FakeProcessor::default());
    let events = Arc::new(events);

    let pipeline = ImagePipeline::new(
        processor.clone(),
        Arc::new(blobs.clone()),
        ImagePipelineConfig {
            upload_parallelism: 3,
            base_photo_url: "http://photos.local".to_string(),
            policy: ValidationPolicy {
                min_width: 100,
                ..Default::default()
            },
            ..Default::default()
        },
    );
    let service = PersonsService::new(repo.clone(), pipeline, events.clone());

    Harness {
        service,
        repo,
        blobs,
        processor,
        events,
    }
}

pub fn ivanov() -> PersonPayload {
    PersonPayload {
        fullname_ru: Some("Иванов".to_string()),
        birthday: NaiveDate::from_ymd_opt(1990, 1, 1),
        sex: Some("M".to_string()),
        ..Default::default()
    }
}

pub fn named(name: &str) -> PersonPayload {
    PersonPayload {
        fullname_ru: Some(name.to_string()),
        ..Default::default()
    }
}
