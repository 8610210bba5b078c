//! Configuration library for castlist.
//!
//! Values are resolved from, in order of precedence, environment variables
//! (optionally seeded from a `.env` file), a TOML config file, and built-in
//! defaults. Guard rails run after composition and either reject the result
//! or attach warnings for the operator.
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, error::ConfigLoadError};
pub use models::{
    Config, ConfigMetadata, DatabaseConfig, ImagesConfig, LogConfig,
    RedisConfig, ServerConfig, StorageConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
