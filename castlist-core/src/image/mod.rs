//! Photo ingestion: validation, resizing and blob storage.

pub mod filter;
pub mod pipeline;
pub mod ports;
pub mod processor;
pub mod storage;

pub use filter::ResampleFilter;
pub use pipeline::{ImagePipeline, ImagePipelineConfig};
pub use ports::{
    ImageBlobStore, ImageProcessor, UploadStream, ValidationPolicy,
    ValidationReport,
};
pub use processor::LocalImageProcessor;
pub use storage::{HttpBlobStore, MemoryBlobStore};
