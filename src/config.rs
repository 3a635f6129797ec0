use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Shi-Tomasi corner detection parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    pub max_corners: i32,
    pub quality_level: f64,
    pub min_distance: f64,
    pub block_size: i32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_corners: 100,
            quality_level: 0.3,
            min_distance: 7.0,
            block_size: 7,
        }
    }
}

/// Pyramidal Lucas-Kanade parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FlowConfig {
    pub win_size: i32,
    pub max_level: i32,
    pub max_iterations: i32,
    pub epsilon: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            win_size: 15,
            max_level: 2,
            max_iterations: 10,
            epsilon: 0.03,
        }
    }
}

/// Fraction of a half turn covered by one frame width/height.
///
/// One full frame width of displacement is `180 / horizontal_divisor`
/// degrees of pan. These approximate the camera field of view.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FieldOfView {
    pub horizontal_divisor: f64,
    pub vertical_divisor: f64,
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self {
            horizontal_divisor: 4.0,
            vertical_divisor: 5.0,
        }
    }
}

impl FieldOfView {
    #[inline]
    pub fn degrees_per_width(&self) -> f64 {
        180.0 / self.horizontal_divisor
    }

    #[inline]
    pub fn degrees_per_height(&self) -> f64 {
        180.0 / self.vertical_divisor
    }
}

/// Angular windows (degrees) inside which the camera counts as facing a
/// claimed direction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Tolerances {
    pub horizontal_deg: f64,
    pub vertical_deg: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            horizontal_deg: 30.0,
            vertical_deg: 30.0,
        }
    }
}

/// Minimum dwell times (exclusive) required for a pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub direction_ms: f64,
    pub second_direction_ms: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            direction_ms: 4000.0,
            second_direction_ms: 100.0,
        }
    }
}

/// Caps on the work done for a single video.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Limits {
    pub max_frames: Option<u64>,
    pub max_processing_ms: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VerifierConfig {
    pub features: FeatureConfig,
    pub flow: FlowConfig,
    pub field_of_view: FieldOfView,
    pub tolerances: Tolerances,
    pub thresholds: Thresholds,
    pub limits: Limits,
    pub overlay_path: Option<PathBuf>,
    pub ffprobe: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            flow: FlowConfig::default(),
            field_of_view: FieldOfView::default(),
            tolerances: Tolerances::default(),
            thresholds: Thresholds::default(),
            limits: Limits::default(),
            overlay_path: None,
            ffprobe: String::from("ffprobe"),
        }
    }
}

impl VerifierConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    /// OpenCV reads a non-positive corner count as "no limit", which would
    /// leave the track set unbounded.
    pub fn validate(&self) -> Result<(), Error> {
        if self.features.max_corners <= 0 {
            return Err(Error::Config(format!(
                "features.max_corners must be positive, got {}",
                self.features.max_corners
            )));
        }

        Ok(())
    }
}
