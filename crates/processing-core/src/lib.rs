//! Stabilo Processing Core
//!
//! Turns per-pair motion estimates into per-frame corrections:
//! - **Trajectory:** Accumulate motion estimates into absolute poses
//! - **Smoother:** Edge-padded moving average, independently per channel
//! - **Correction:** Residual `smoothed - raw` per frame, as deltas and matrices
//! - **Estimator:** Capability seam for external motion estimators
//! - **Pipeline:** Parallel estimation and the analysis pass over a video
//!
//! This crate is pure computation with no I/O. All inputs are data; all
//! outputs are data.

pub mod correction;
pub mod estimator;
pub mod pipeline;
pub mod smoother;
pub mod trajectory;

pub use correction::{compute_corrections, correction_transforms};
pub use estimator::MotionEstimator;
pub use pipeline::{StabilizationPipeline, TrajectoryAnalysis};
pub use smoother::{smooth_channel, TrajectorySmoother};
pub use trajectory::build_trajectory;
