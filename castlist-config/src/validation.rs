use thiserror::Error;

use super::models::Config;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("image bounds invalid: {reason}")]
    InvalidImageBounds { reason: String },
    #[error("photo size must be non-zero, got {width}x{height}")]
    InvalidPhotoSize { width: u32, height: u32 },
    #[error("ALLOWED_IMAGE_TYPES must list at least one MIME type")]
    NoAllowedImageTypes,
    #[error("{field} is required when DEV_MODE is false")]
    MissingBackend { field: &'static str },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();
    let images = &config.images;

    if images.photo_width == 0 || images.photo_height == 0 {
        return Err(ConfigGuardRailError::InvalidPhotoSize {
            width: images.photo_width,
            height: images.photo_height,
        });
    }
    if images.min_width > images.max_width {
        return Err(ConfigGuardRailError::InvalidImageBounds {
            reason: format!(
                "min width {} exceeds max width {}",
                images.min_width, images.max_width
            ),
        });
    }
    if images.min_height > images.max_height {
        return Err(ConfigGuardRailError::InvalidImageBounds {
            reason: format!(
                "min height {} exceeds max height {}",
                images.min_height, images.max_height
            ),
        });
    }
    if images.allowed_types.is_empty() {
        return Err(ConfigGuardRailError::NoAllowedImageTypes);
    }

    if !config.dev_mode {
        if config.database.url.is_none() {
            return Err(ConfigGuardRailError::MissingBackend {
                field: "DATABASE_URL",
            });
        }
        if config.storage.api_url.is_none() {
            return Err(ConfigGuardRailError::MissingBackend {
                field: "IMAGE_STORAGE_URL",
            });
        }
    }

    if config.redis.is_none() {
        warnings.push_with_hint(
            "REDIS_URL not configured; person_deleted events will only be logged",
            "Set REDIS_URL to publish deletion events to a Redis stream",
        );
    }

    if config.storage.base_photo_url.is_empty() {
        warnings.push_with_hint(
            "BASE_PHOTO_URL is empty; photo URLs will be relative",
            "Point BASE_PHOTO_URL at the public address of the image storage",
        );
    }

    if config.dev_mode {
        if config.database.url.is_none() {
            warnings.push("DATABASE_URL not configured; persons are kept in memory");
        }
        if config.storage.api_url.is_none() {
            warnings.push("IMAGE_STORAGE_URL not configured; photos are kept in memory");
        }
    }

    Ok(warnings)
}
