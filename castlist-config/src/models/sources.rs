use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::util::{parse_bool, parse_csv};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    pub redis: Option<FileRedisConfig>,
    #[serde(default)]
    pub images: FileImagesConfig,
    #[serde(default)]
    pub storage: FileStorageConfig,
    #[serde(default)]
    pub log: FileLogConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileRedisConfig {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileImagesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_image_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_image_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_parallelism: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub db_max_connections: Option<u32>,
    pub db_min_connections: Option<u32>,
    pub redis_url: Option<String>,
    pub person_events_stream: Option<String>,
    pub photo_width: Option<u32>,
    pub photo_height: Option<u32>,
    pub resize_type: Option<String>,
    pub allowed_image_types: Option<Vec<String>>,
    pub min_image_width: Option<u32>,
    pub min_image_height: Option<u32>,
    pub max_image_width: Option<u32>,
    pub max_image_height: Option<u32>,
    pub upload_parallelism: Option<usize>,
    pub image_storage_url: Option<String>,
    pub base_photo_url: Option<String>,
    pub photo_category: Option<String>,
    pub storage_timeout_secs: Option<u64>,
    pub log_filter: Option<String>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unparseable numbers are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let num = |name: &str| var(name).and_then(|s| s.trim().parse().ok());

        Self {
            config_path: var("CASTLIST_CONFIG").map(PathBuf::from),
            server_host: var("SERVER_HOST"),
            server_port: var("SERVER_PORT").and_then(|s| s.trim().parse().ok()),
            database_url: var("DATABASE_URL"),
            db_max_connections: num("DB_MAX_CONNECTIONS"),
            db_min_connections: num("DB_MIN_CONNECTIONS"),
            redis_url: var("REDIS_URL"),
            person_events_stream: var("PERSON_EVENTS_STREAM"),
            photo_width: num("PHOTO_WIDTH"),
            photo_height: num("PHOTO_HEIGHT"),
            resize_type: var("RESIZE_TYPE"),
            allowed_image_types: var("ALLOWED_IMAGE_TYPES").map(|raw| parse_csv(&raw)),
            min_image_width: num("MIN_IMAGE_WIDTH"),
            min_image_height: num("MIN_IMAGE_HEIGHT"),
            max_image_width: num("MAX_IMAGE_WIDTH"),
            max_image_height: num("MAX_IMAGE_HEIGHT"),
            upload_parallelism: var("UPLOAD_PARALLELISM")
                .and_then(|s| s.trim().parse().ok()),
            image_storage_url: var("IMAGE_STORAGE_URL"),
            base_photo_url: var("BASE_PHOTO_URL"),
            photo_category: var("PHOTO_CATEGORY"),
            storage_timeout_secs: var("IMAGE_STORAGE_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok()),
            log_filter: var("LOG_FILTER"),
            dev_mode: var("DEV_MODE").and_then(|raw| parse_bool(&raw)),
        }
    }
}
