//! Run reports: recovered errors and per-frame corrections.

use serde::{Deserialize, Serialize};

use crate::affine::AffineTransform;

/// A recovered, non-fatal problem observed during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// The estimator failed for a pair; zero motion was substituted.
    SyntheticMotion { pair: usize, reason: String },

    /// The requested smoothing radius was outside `[0, frame_count / 2]`.
    RadiusClamped {
        requested: i64,
        effective: usize,
        frame_count: usize,
    },

    /// Part of the canvas was not covered by the corrected frame and was
    /// filled by the border policy.
    OutOfCanvas { frame: usize, uncovered_fraction: f64 },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::SyntheticMotion { pair, reason } => {
                write!(f, "pair {pair}: estimation failed ({reason}), using zero motion")
            }
            PipelineWarning::RadiusClamped {
                requested,
                effective,
                frame_count,
            } => write!(
                f,
                "radius {requested} invalid for {frame_count} frames, clamped to {effective}"
            ),
            PipelineWarning::OutOfCanvas {
                frame,
                uncovered_fraction,
            } => write!(
                f,
                "frame {frame}: {:.1}% of canvas filled by border policy",
                uncovered_fraction * 100.0
            ),
        }
    }
}

/// Correction for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub frame: usize,
    pub raw: Vec<f64>,
    pub smoothed: Vec<f64>,
    /// `smoothed - raw`, per channel.
    pub delta: Vec<f64>,
    /// `delta` as a 2x3 matrix.
    pub matrix: AffineTransform,
}

/// Result of a trajectory analysis, serialisable for external warpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionReport {
    pub channels: Vec<String>,
    pub frame_count: usize,
    pub requested_radius: i64,
    pub radius: usize,
    pub synthetic_pairs: Vec<usize>,
    pub frames: Vec<CorrectionRecord>,
    pub warnings: Vec<PipelineWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_json_is_tagged() {
        let warning = PipelineWarning::RadiusClamped {
            requested: 100,
            effective: 5,
            frame_count: 10,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "radius_clamped");
        assert_eq!(json["effective"], 5);
        assert!(warning.to_string().contains("clamped to 5"));
    }
}
