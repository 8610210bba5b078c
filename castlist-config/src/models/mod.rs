pub mod sources;

use std::path::PathBuf;
use std::time::Duration;

use castlist_core::image::{ImagePipelineConfig, ResampleFilter, ValidationPolicy};
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub images: ImagesConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Pipeline settings assembled from the image and storage sections.
    pub fn image_pipeline(&self) -> ImagePipelineConfig {
        ImagePipelineConfig {
            photo_width: self.images.photo_width,
            photo_height: self.images.photo_height,
            filter: self.images.resize_filter,
            policy: self.images.validation_policy(),
            upload_parallelism: self.images.upload_parallelism,
            category: self.storage.category.clone(),
            base_photo_url: self.storage.base_photo_url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// Stream deletion events are appended to.
    pub stream: String,
}

#[derive(Debug, Clone)]
pub struct ImagesConfig {
    pub photo_width: u32,
    pub photo_height: u32,
    pub resize_filter: ResampleFilter,
    pub allowed_types: Vec<String>,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub upload_parallelism: usize,
}

impl ImagesConfig {
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            allowed_types: self.allowed_types.clone(),
            min_width: self.min_width,
            min_height: self.min_height,
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Blob store API. `None` only makes sense in dev mode.
    pub api_url: Option<Url>,
    pub base_photo_url: String,
    pub category: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub filter: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
