use std::io::Cursor;

use async_trait::async_trait;
use image::{ImageFormat, ImageReader};
use tracing::debug;

use super::filter::ResampleFilter;
use super::ports::{ImageProcessor, ValidationPolicy, ValidationReport};
use crate::error::{CatalogError, Result};

/// In-process validator/resizer built on the `image` crate.
///
/// Decoding and encoding run on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalImageProcessor;

impl LocalImageProcessor {
    pub fn new() -> Self {
        Self
    }
}

fn check(image: &[u8], policy: &ValidationPolicy) -> ValidationReport {
    let format = match image::guess_format(image) {
        Ok(format) => format,
        Err(_) => return ValidationReport::rejected("unrecognised image format"),
    };

    let mime = format.to_mime_type();
    if !policy
        .allowed_types
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(mime))
    {
        return ValidationReport::rejected(format!(
            "image type {} is not supported, supported types: {}",
            mime,
            policy.allowed_types.join(", ")
        ));
    }

    let dimensions = ImageReader::with_format(Cursor::new(image), format)
        .into_dimensions();
    let (width, height) = match dimensions {
        Ok(dims) => dims,
        Err(e) => {
            return ValidationReport::rejected(format!("can't read image: {}", e));
        }
    };

    let mut problems = Vec::new();
    if width < policy.min_width {
        problems.push(format!(
            "image width {} is less than {}",
            width, policy.min_width
        ));
    }
    if width > policy.max_width {
        problems.push(format!(
            "image width {} is greater than {}",
            width, policy.max_width
        ));
    }
    if height < policy.min_height {
        problems.push(format!(
            "image height {} is less than {}",
            height, policy.min_height
        ));
    }
    if height > policy.max_height {
        problems.push(format!(
            "image height {} is greater than {}",
            height, policy.max_height
        ));
    }

    if problems.is_empty() {
        ValidationReport::accepted()
    } else {
        ValidationReport::rejected(problems.join("; "))
    }
}

fn resize_exact(
    image: &[u8],
    width: u32,
    height: u32,
    filter: ResampleFilter,
) -> Result<Vec<u8>> {
    let format = image::guess_format(image).map_err(|e| {
        CatalogError::Internal(format!("Failed to detect image format: {}", e))
    })?;
    let decoded = image::load_from_memory_with_format(image, format)
        .map_err(|e| CatalogError::Internal(format!("Failed to decode image: {}", e)))?;

    let resized = decoded.resize_exact(width, height, filter.to_image_filter());

    // Formats without an encoder fall back to PNG.
    let target = if format.writing_enabled() {
        format
    } else {
        ImageFormat::Png
    };
    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, target).map_err(|e| {
        CatalogError::Internal(format!("Failed to encode image: {}", e))
    })?;
    Ok(out.into_inner())
}

#[async_trait]
impl ImageProcessor for LocalImageProcessor {
    async fn validate(
        &self,
        image: &[u8],
        policy: &ValidationPolicy,
    ) -> Result<ValidationReport> {
        let image = image.to_vec();
        let policy = policy.clone();
        tokio::task::spawn_blocking(move || check(&image, &policy))
            .await
            .map_err(|e| {
                CatalogError::Internal(format!("Image validation task failed: {}", e))
            })
    }

    async fn resize(
        &self,
        image: &[u8],
        width: u32,
        height: u32,
        filter: ResampleFilter,
    ) -> Result<Option<Vec<u8>>> {
        debug!(width, height, %filter, "resizing photo");
        let image = image.to_vec();
        let resized = tokio::task::spawn_blocking(move || {
            resize_exact(&image, width, height, filter)
        })
        .await
        .map_err(|e| {
            CatalogError::Internal(format!("Image resize task failed: {}", e))
        })??;
        Ok(Some(resized))
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, GenericImageView, RgbImage};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    fn policy() -> ValidationPolicy {
        ValidationPolicy {
            allowed_types: vec!["image/png".into()],
            min_width: 10,
            min_height: 10,
            max_width: 100,
            max_height: 100,
        }
    }

    #[tokio::test]
    async fn accepts_photo_inside_bounds() {
        let report = LocalImageProcessor
            .validate(&png(20, 30), &policy())
            .await
            .expect("validate");
        assert!(report.valid, "{}", report.details);
    }

    #[tokio::test]
    async fn rejects_narrow_photo_with_details() {
        let report = LocalImageProcessor
            .validate(&png(5, 30), &policy())
            .await
            .expect("validate");
        assert!(!report.valid);
        assert_eq!(report.details, "image width 5 is less than 10");
    }

    #[tokio::test]
    async fn rejects_unknown_bytes_and_disallowed_types() {
        let report = LocalImageProcessor
            .validate(b"not an image", &policy())
            .await
            .expect("validate");
        assert!(!report.valid);

        let mut jpeg_only = policy();
        jpeg_only.allowed_types = vec!["image/jpeg".into()];
        let report = LocalImageProcessor
            .validate(&png(20, 20), &jpeg_only)
            .await
            .expect("validate");
        assert!(report.details.contains("image/png"));
    }

    #[tokio::test]
    async fn resize_produces_requested_dimensions() {
        let resized = LocalImageProcessor
            .resize(&png(40, 40), 12, 16, ResampleFilter::Lanczos)
            .await
            .expect("resize")
            .expect("bytes");
        let decoded = image::load_from_memory(&resized).expect("decode");
        assert_eq!(decoded.dimensions(), (12, 16));
    }
}
