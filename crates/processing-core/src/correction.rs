//! Correction computation: the residual that moves each raw pose onto the
//! smoothed path.

use stabilo_common::error::{StabiloError, StabiloResult};
use stabilo_motion_model::affine::AffineTransform;
use stabilo_motion_model::motion::MotionModel;
use stabilo_motion_model::trajectory::Trajectory;

/// Per-frame `smoothed - raw`, channel by channel.
///
/// Both trajectories must have the same shape. Adding the delta back onto
/// the raw pose reproduces the smoothed pose up to the rounding of that
/// single subtraction and addition.
pub fn compute_corrections(raw: &Trajectory, smoothed: &Trajectory) -> StabiloResult<Trajectory> {
    if raw.channel_count() != smoothed.channel_count() || raw.len() != smoothed.len() {
        return Err(StabiloError::input(format!(
            "trajectory shapes differ: raw {}x{}, smoothed {}x{}",
            raw.channel_count(),
            raw.len(),
            smoothed.channel_count(),
            smoothed.len()
        )));
    }

    let channels = raw
        .channels()
        .iter()
        .zip(smoothed.channels())
        .map(|(r, s)| s.iter().zip(r).map(|(s, r)| s - r).collect())
        .collect();

    Trajectory::from_channels(channels).map_err(|e| StabiloError::input(e.to_string()))
}

/// Interpret each delta through `M` and convert it to the affine matrix a
/// warper applies to the corresponding original frame.
pub fn correction_transforms<M: MotionModel>(
    deltas: &Trajectory,
) -> StabiloResult<Vec<AffineTransform>> {
    let poses = deltas.poses_as::<M>().ok_or_else(|| {
        StabiloError::input(format!(
            "corrections have {} channels, motion model expects {}",
            deltas.channel_count(),
            M::CHANNELS
        ))
    })?;
    Ok(poses.iter().map(M::to_affine).collect())
}
