use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Resampling filter used when resizing photos.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Box,
    CatmullRom,
    Lanczos,
    Linear,
    MitchellNetravali,
    #[default]
    NearestNeighbor,
}

impl ResampleFilter {
    pub const ALL: [ResampleFilter; 6] = [
        ResampleFilter::Box,
        ResampleFilter::CatmullRom,
        ResampleFilter::Lanczos,
        ResampleFilter::Linear,
        ResampleFilter::MitchellNetravali,
        ResampleFilter::NearestNeighbor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResampleFilter::Box => "Box",
            ResampleFilter::CatmullRom => "CatmullRom",
            ResampleFilter::Lanczos => "Lanczos",
            ResampleFilter::Linear => "Linear",
            ResampleFilter::MitchellNetravali => "MitchellNetravali",
            ResampleFilter::NearestNeighbor => "NearestNeighbor",
        }
    }

    /// Closest filter offered by the `image` crate.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            ResampleFilter::Box | ResampleFilter::NearestNeighbor => {
                FilterType::Nearest
            }
            ResampleFilter::Linear => FilterType::Triangle,
            ResampleFilter::CatmullRom | ResampleFilter::MitchellNetravali => {
                FilterType::CatmullRom
            }
            ResampleFilter::Lanczos => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilter(pub String);

impl fmt::Display for UnknownFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown resample filter '{}'", self.0)
    }
}

impl std::error::Error for UnknownFilter {}

impl FromStr for ResampleFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['_', '-'], "");
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}
