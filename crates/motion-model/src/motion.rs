//! Inter-frame motion estimates.

use serde::{Deserialize, Serialize};

use crate::affine::AffineTransform;

/// A motion model whose parameters are independent, additive channels.
///
/// Trajectory building, smoothing and correction operate per channel and
/// never look at what a channel means; only [`MotionModel::to_affine`]
/// interprets them.
pub trait MotionModel: Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Number of channels.
    const CHANNELS: usize;

    /// Human-readable channel names, `CHANNELS` long.
    fn channel_names() -> &'static [&'static str];

    /// The zero-motion value.
    fn identity() -> Self;

    /// Value of channel `index`. Panics if `index >= CHANNELS`.
    fn channel(&self, index: usize) -> f64;

    /// Build a value from per-channel values.
    fn from_channel_fn(f: impl FnMut(usize) -> f64) -> Self;

    /// The affine transform this value describes.
    fn to_affine(&self) -> AffineTransform;

    /// Component-wise sum.
    fn add(&self, other: &Self) -> Self {
        Self::from_channel_fn(|c| self.channel(c) + other.channel(c))
    }
}

/// Rigid motion between two consecutive frames: translation plus rotation
/// in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionEstimate {
    pub dx: f64,
    pub dy: f64,
    pub dangle: f64,
}

impl MotionEstimate {
    pub const ZERO: MotionEstimate = MotionEstimate {
        dx: 0.0,
        dy: 0.0,
        dangle: 0.0,
    };

    pub fn new(dx: f64, dy: f64, dangle: f64) -> Self {
        Self { dx, dy, dangle }
    }

    /// Recover the rigid parameters of a 2x3 matrix (`dangle` from the
    /// rotation block, translation from the last column).
    pub fn from_affine(t: &AffineTransform) -> Self {
        Self {
            dx: t.m[2],
            dy: t.m[5],
            dangle: t.m[3].atan2(t.m[0]),
        }
    }
}

impl MotionModel for MotionEstimate {
    const CHANNELS: usize = 3;

    fn channel_names() -> &'static [&'static str] {
        &["x", "y", "angle"]
    }

    fn identity() -> Self {
        Self::ZERO
    }

    fn channel(&self, index: usize) -> f64 {
        match index {
            0 => self.dx,
            1 => self.dy,
            2 => self.dangle,
            _ => panic!("MotionEstimate has 3 channels, got index {index}"),
        }
    }

    fn from_channel_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        Self {
            dx: f(0),
            dy: f(1),
            dangle: f(2),
        }
    }

    fn to_affine(&self) -> AffineTransform {
        AffineTransform::from_rigid(self.dx, self.dy, self.dangle)
    }
}

/// Why a motion estimator could not produce an estimate for a pair.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimationFailure {
    #[error("too few correspondences: found {found}, need {required}")]
    TooFewCorrespondences { found: usize, required: usize },

    #[error("degenerate fit")]
    DegenerateFit,

    #[error("estimator backend failed: {message}")]
    Backend { message: String },
}

impl EstimationFailure {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend {
            message: msg.into(),
        }
    }
}

/// The estimate recorded for one adjacent frame pair.
///
/// When the estimator failed, `estimate` is the zero motion and `failure`
/// keeps the reason, so a synthetic zero stays distinguishable from a
/// measured one.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSample<M: MotionModel = MotionEstimate> {
    pub estimate: M,
    pub failure: Option<EstimationFailure>,
}

impl<M: MotionModel> MotionSample<M> {
    pub fn measured(estimate: M) -> Self {
        Self {
            estimate,
            failure: None,
        }
    }

    /// Zero motion standing in for a failed estimate.
    pub fn synthetic(failure: EstimationFailure) -> Self {
        Self {
            estimate: M::identity(),
            failure: Some(failure),
        }
    }

    pub fn from_result(result: Result<M, EstimationFailure>) -> Self {
        match result {
            Ok(estimate) => Self::measured(estimate),
            Err(failure) => Self::synthetic(failure),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.failure.is_some()
    }
}
