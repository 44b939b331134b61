//! Typed configuration for the stabilizer and the collaborators it calls.
//!
//! Every option a collaborator recognises is a named field here, so the
//! contract between the core and its feature matcher or flow model is
//! checked at compile time rather than through string-keyed maps.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Nearest-neighbour index used by a descriptor matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum MatcherIndex {
    /// Randomised k-d trees, for float descriptors (SIFT-like).
    KdTree {
        /// Number of parallel trees.
        trees: u32,
    },
    /// Locality-sensitive hashing, for binary descriptors (ORB-like).
    Lsh {
        table_number: u32,
        key_size: u32,
        multi_probe_level: u32,
    },
}

impl Default for MatcherIndex {
    fn default() -> Self {
        MatcherIndex::KdTree { trees: 5 }
    }
}

/// Configuration for feature-correspondence motion estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureMatchConfig {
    /// Search index built over the second frame's descriptors.
    pub index: MatcherIndex,

    /// Number of leaves the index visits per query. Higher is more
    /// accurate and slower.
    pub checks: u32,

    /// Lowe ratio test: a match is kept only when
    /// `best.distance < ratio_threshold * second.distance`.
    pub ratio_threshold: f64,

    /// Minimum surviving matches for a rigid fit.
    pub min_matches: usize,
}

impl Default for FeatureMatchConfig {
    fn default() -> Self {
        Self {
            index: MatcherIndex::default(),
            checks: 50,
            ratio_threshold: 0.7,
            min_matches: 3,
        }
    }
}

impl FeatureMatchConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.ratio_threshold > 0.0 && self.ratio_threshold <= 1.0) {
            return Err(ModelError::invalid_config(format!(
                "ratio_threshold must be in (0, 1], got {}",
                self.ratio_threshold
            )));
        }
        if self.checks == 0 {
            return Err(ModelError::invalid_config("checks must be > 0"));
        }
        if self.min_matches < 2 {
            return Err(ModelError::invalid_config(
                "min_matches must be >= 2 for a rigid fit",
            ));
        }
        match self.index {
            MatcherIndex::KdTree { trees: 0 } => {
                Err(ModelError::invalid_config("kd-tree index needs at least one tree"))
            }
            MatcherIndex::Lsh {
                table_number: 0, ..
            }
            | MatcherIndex::Lsh { key_size: 0, .. } => Err(ModelError::invalid_config(
                "lsh index needs non-zero table_number and key_size",
            )),
            _ => Ok(()),
        }
    }
}

/// Configuration for dense optical-flow motion estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowModelConfig {
    /// Width frames are resized to before inference.
    pub input_width: usize,

    /// Height frames are resized to before inference.
    pub input_height: usize,

    /// Per-channel mean subtracted after scaling pixels to `[0, 1]`.
    pub normalize_mean: f32,

    /// Per-channel standard deviation divided out after the mean.
    pub normalize_std: f32,

    /// Grid spacing, in model-input pixels, of the flow vectors sampled
    /// for the rigid fit.
    pub sample_stride: usize,

    /// Minimum finite flow vectors for a fit.
    pub min_valid_vectors: usize,
}

impl Default for FlowModelConfig {
    fn default() -> Self {
        Self {
            input_width: 960,
            input_height: 520,
            normalize_mean: 0.5,
            normalize_std: 0.5,
            sample_stride: 8,
            min_valid_vectors: 3,
        }
    }
}

impl FlowModelConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(ModelError::invalid_config("flow input size must be non-zero"));
        }
        if self.sample_stride == 0 {
            return Err(ModelError::invalid_config("sample_stride must be > 0"));
        }
        if !(self.normalize_std > 0.0) {
            return Err(ModelError::invalid_config("normalize_std must be > 0"));
        }
        Ok(())
    }

    /// Map a pixel value in `[0, 255]` to the model's input range.
    pub fn normalize(&self, value: u8) -> f32 {
        (value as f32 / 255.0 - self.normalize_mean) / self.normalize_std
    }
}

/// Trajectory smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Requested half-width of the moving-average window, in frames.
    /// Clamped into `[0, frame_count / 2]` at run time.
    pub radius: i64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { radius: 5 }
    }
}

/// How pixels are sampled from the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// What happens to canvas regions the corrected frame no longer covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BorderPolicy {
    /// Leave uncovered pixels at a constant value.
    Pad { fill: u8 },

    /// Zoom every frame by a fixed factor about its centre, cropping a
    /// constant margin.
    FixedCrop { scale: f64 },

    /// Zoom every frame by the smallest factor (up to `max_scale`) for
    /// which all corrected frames cover the whole canvas.
    DynamicCrop { max_scale: f64 },
}

impl Default for BorderPolicy {
    fn default() -> Self {
        BorderPolicy::FixedCrop { scale: 1.04 }
    }
}

impl BorderPolicy {
    pub fn validate(&self) -> Result<(), ModelError> {
        match *self {
            BorderPolicy::Pad { .. } => Ok(()),
            BorderPolicy::FixedCrop { scale } if !(scale >= 1.0 && scale.is_finite()) => Err(
                ModelError::invalid_config(format!("crop scale must be >= 1, got {scale}")),
            ),
            BorderPolicy::DynamicCrop { max_scale } if !(max_scale >= 1.0 && max_scale.is_finite()) => {
                Err(ModelError::invalid_config(format!(
                    "max_scale must be >= 1, got {max_scale}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Frame warping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    pub border: BorderPolicy,
    pub interpolation: Interpolation,
    /// Value written to pixels that sample outside the source frame.
    pub fill: u8,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            border: BorderPolicy::default(),
            interpolation: Interpolation::default(),
            fill: 0,
        }
    }
}

/// Everything a single stabilization run needs besides its inputs.
///
/// Each run owns its configuration, so runs with different settings can
/// execute side by side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub smoothing: SmoothingConfig,
    pub warp: WarpConfig,
}

impl PipelineConfig {
    pub fn with_radius(radius: i64) -> Self {
        Self {
            smoothing: SmoothingConfig { radius },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.warp.border.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_defaults_are_valid() {
        let config = FeatureMatchConfig::default();
        assert_eq!(config.index, MatcherIndex::KdTree { trees: 5 });
        assert_eq!(config.checks, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_feature_rejects_bad_ratio() {
        let config = FeatureMatchConfig {
            ratio_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_flow_normalize_maps_to_unit_range() {
        let config = FlowModelConfig::default();
        assert!((config.normalize(0) + 1.0).abs() < 1e-6);
        assert!((config.normalize(255) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_border_policy_json() {
        let policy: BorderPolicy =
            serde_json::from_str(r#"{"mode": "dynamic_crop", "max_scale": 1.5}"#).unwrap();
        assert_eq!(policy, BorderPolicy::DynamicCrop { max_scale: 1.5 });
        assert!(BorderPolicy::FixedCrop { scale: 0.9 }.validate().is_err());
    }

    #[test]
    fn test_pipeline_config_partial_json() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"smoothing": {"radius": 30}}"#).unwrap();
        assert_eq!(config.smoothing.radius, 30);
        assert_eq!(config.warp, WarpConfig::default());
    }
}
