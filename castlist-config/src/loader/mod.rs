pub mod error;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use castlist_core::events::PERSON_DELETED_STREAM;
use castlist_core::image::ResampleFilter;
use once_cell::sync::Lazy;
use tracing::debug;
use url::Url;

use crate::models::{
    Config, ConfigMetadata, DatabaseConfig, ImagesConfig, LogConfig,
    RedisConfig, ServerConfig, StorageConfig,
    sources::{EnvConfig, FileConfig},
};
use crate::validation::{self, ConfigWarnings};
use error::ConfigLoadError;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=warn";
pub const DEFAULT_PHOTO_CATEGORY: &str = "persons";

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("castlist.toml"),
        PathBuf::from("config/castlist.toml"),
    ]
});

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/webp".to_string(),
    ]
}

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env`, then compose the process environment with the config file.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let mut load = self.load_from_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose against an explicit environment snapshot; `.env` is not read.
    pub fn load_from_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No castlist.toml detected; falling back to environment variables",
                "Pass --config or set CASTLIST_CONFIG to use a configuration file",
            );
        }

        let config = compose_config(file_config.unwrap_or_default(), env, config_path)?;
        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(path) => path.clone(),
                None => return Ok((None, None)),
            },
        };

        debug!("Loading configuration from {}", path.display());
        let contents = fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file: FileConfig,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        server: file_server,
        database: file_database,
        redis: file_redis,
        images: file_images,
        storage: file_storage,
        log: file_log,
        dev_mode: file_dev_mode,
    } = file;

    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
    };

    let database = DatabaseConfig {
        url: env
            .database_url
            .or(file_database.url)
            .filter(|url| !url.trim().is_empty()),
        max_connections: env.db_max_connections.or(file_database.max_connections),
        min_connections: env.db_min_connections.or(file_database.min_connections),
    };

    let redis_stream = env
        .person_events_stream
        .clone()
        .or_else(|| file_redis.as_ref().and_then(|r| r.stream.clone()))
        .unwrap_or_else(|| PERSON_DELETED_STREAM.to_string());
    let redis = env
        .redis_url
        .or(file_redis.map(|r| r.url))
        .filter(|url| !url.trim().is_empty())
        .map(|url| RedisConfig {
            url,
            stream: redis_stream,
        });

    let resize_filter = match env.resize_type.or(file_images.resize_type) {
        Some(raw) => raw.parse::<ResampleFilter>().map_err(|err| {
            ConfigLoadError::InvalidValue {
                field: "RESIZE_TYPE",
                reason: err.to_string(),
            }
        })?,
        None => ResampleFilter::default(),
    };

    let images = ImagesConfig {
        photo_width: env.photo_width.or(file_images.photo_width).unwrap_or(300),
        photo_height: env.photo_height.or(file_images.photo_height).unwrap_or(400),
        resize_filter,
        allowed_types: env
            .allowed_image_types
            .or(file_images.allowed_types)
            .unwrap_or_else(default_allowed_types),
        min_width: env
            .min_image_width
            .or(file_images.min_image_width)
            .unwrap_or(100),
        min_height: env
            .min_image_height
            .or(file_images.min_image_height)
            .unwrap_or(100),
        max_width: env
            .max_image_width
            .or(file_images.max_image_width)
            .unwrap_or(4096),
        max_height: env
            .max_image_height
            .or(file_images.max_image_height)
            .unwrap_or(4096),
        upload_parallelism: env
            .upload_parallelism
            .or(file_images.upload_parallelism)
            .unwrap_or_else(num_cpus::get)
            .max(1),
    };

    let api_url = env
        .image_storage_url
        .or(file_storage.api_url)
        .map(|raw| {
            Url::parse(raw.trim()).map_err(|source| ConfigLoadError::InvalidUrl {
                field: "IMAGE_STORAGE_URL",
                source,
            })
        })
        .transpose()?;

    let storage = StorageConfig {
        api_url,
        base_photo_url: env
            .base_photo_url
            .or(file_storage.base_photo_url)
            .unwrap_or_default(),
        category: env
            .photo_category
            .or(file_storage.photo_category)
            .unwrap_or_else(|| DEFAULT_PHOTO_CATEGORY.to_string()),
        request_timeout: Duration::from_secs(
            env.storage_timeout_secs
                .or(file_storage.request_timeout_secs)
                .unwrap_or(30),
        ),
    };

    let log = LogConfig {
        filter: env
            .log_filter
            .or(file_log.filter)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
    };

    Ok(Config {
        server,
        database,
        redis,
        images,
        storage,
        log,
        dev_mode: env.dev_mode.or(file_dev_mode).unwrap_or(false),
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    })
}
