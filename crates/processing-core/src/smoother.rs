//! Trajectory smoothing.
//!
//! Each channel is filtered independently with a uniform moving average of
//! width `2 * radius + 1`. The sequence is first extended by repeating its
//! first and last values `radius` times, so every output index sees a full
//! window and the output has exactly the input length:
//!
//! ```text
//! smoothed[i] = sum(raw[clamp(i + k, 0, n - 1)] for k in -r..=r) / (2r + 1)
//! ```

use rayon::prelude::*;

use stabilo_common::error::{StabiloError, StabiloResult};
use stabilo_motion_model::config::SmoothingConfig;
use stabilo_motion_model::report::PipelineWarning;
use stabilo_motion_model::trajectory::Trajectory;

/// Largest usable radius for a sequence of `len` samples.
pub fn max_radius(len: usize) -> usize {
    len / 2
}

/// A requested radius after validation against the sequence length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRadius {
    pub requested: i64,
    pub effective: usize,
    pub frame_count: usize,
}

impl ResolvedRadius {
    pub fn was_clamped(&self) -> bool {
        i64::try_from(self.effective).map_or(true, |e| e != self.requested)
    }

    /// The warning to surface when the request had to be clamped.
    pub fn warning(&self) -> Option<PipelineWarning> {
        self.was_clamped().then_some(PipelineWarning::RadiusClamped {
            requested: self.requested,
            effective: self.effective,
            frame_count: self.frame_count,
        })
    }
}

/// Clamp `requested` into `[0, len / 2]`.
pub fn resolve_radius(requested: i64, len: usize) -> ResolvedRadius {
    let max = max_radius(len);
    let effective = if requested <= 0 {
        0
    } else {
        usize::try_from(requested).map_or(max, |r| r.min(max))
    };
    ResolvedRadius {
        requested,
        effective,
        frame_count: len,
    }
}

/// Extend `curve` by `radius` copies of its first and last values.
pub fn edge_pad(curve: &[f64], radius: usize) -> Vec<f64> {
    let (Some(&first), Some(&last)) = (curve.first(), curve.last()) else {
        return Vec::new();
    };
    let mut padded = Vec::with_capacity(curve.len() + 2 * radius);
    padded.extend(std::iter::repeat(first).take(radius));
    padded.extend_from_slice(curve);
    padded.extend(std::iter::repeat(last).take(radius));
    padded
}

/// Moving average of one channel with edge replication.
///
/// Output length always equals input length; `radius == 0` returns the
/// input unchanged. The raw slice is only read.
pub fn smooth_channel(curve: &[f64], radius: usize) -> Vec<f64> {
    if radius == 0 || curve.is_empty() {
        return curve.to_vec();
    }
    let window = 2 * radius + 1;
    let padded = edge_pad(curve, radius);
    padded
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Smooth every channel of `trajectory` with an already-validated radius.
/// Channels are processed in parallel.
pub fn smooth_trajectory(trajectory: &Trajectory, radius: usize) -> StabiloResult<Trajectory> {
    let channels: Vec<Vec<f64>> = trajectory
        .channels()
        .par_iter()
        .map(|channel| smooth_channel(channel, radius))
        .collect();
    Trajectory::from_channels(channels).map_err(|e| StabiloError::smoothing(e.to_string()))
}

/// Output of [`TrajectorySmoother::smooth`].
#[derive(Debug, Clone, PartialEq)]
pub struct Smoothed {
    pub trajectory: Trajectory,
    pub radius: ResolvedRadius,
}

/// Trajectory smoother bound to one run's configuration.
#[derive(Debug, Clone, Copy)]
pub struct TrajectorySmoother {
    config: SmoothingConfig,
}

impl TrajectorySmoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self { config }
    }

    pub fn with_radius(radius: i64) -> Self {
        Self::new(SmoothingConfig { radius })
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Smooth `trajectory`, clamping the configured radius to the
    /// trajectory length first. A clamp is logged, never an error.
    pub fn smooth(&self, trajectory: &Trajectory) -> StabiloResult<Smoothed> {
        let radius = resolve_radius(self.config.radius, trajectory.len());
        if radius.was_clamped() {
            tracing::warn!(
                requested = radius.requested,
                effective = radius.effective,
                frames = radius.frame_count,
                "Smoothing radius out of range, clamped"
            );
        }
        tracing::debug!(
            radius = radius.effective,
            channels = trajectory.channel_count(),
            poses = trajectory.len(),
            "Smoothing trajectory"
        );

        Ok(Smoothed {
            trajectory: smooth_trajectory(trajectory, radius.effective)?,
            radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spike_with_radius_one() {
        let curve = [0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0];
        assert_eq!(
            edge_pad(&curve, 1),
            vec![0.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0]
        );
        let third = 10.0 / 3.0;
        assert_eq!(
            smooth_channel(&curve, 1),
            vec![0.0, 0.0, third, third, third, 0.0, 0.0]
        );
    }

    #[test]
    fn test_radius_zero_is_identity() {
        let curve = [3.0, -1.5, 8.25, 0.0];
        assert_eq!(smooth_channel(&curve, 0), curve.to_vec());
    }

    #[test]
    fn test_edges_replicate() {
        // Window for index 0 is [1, 1, 1, 2, 3].
        let smoothed = smooth_channel(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_eq!(smoothed[0], 8.0 / 5.0);
        assert_eq!(smoothed[4], 22.0 / 5.0);
        assert_eq!(smoothed[2], 3.0);
    }

    #[test]
    fn test_empty_curve() {
        assert!(smooth_channel(&[], 3).is_empty());
        assert!(edge_pad(&[], 3).is_empty());
    }

    #[test]
    fn test_resolve_radius_clamps() {
        let r = resolve_radius(100, 10);
        assert_eq!(r.effective, 5);
        assert!(r.was_clamped());
        assert_eq!(
            r.warning(),
            Some(PipelineWarning::RadiusClamped {
                requested: 100,
                effective: 5,
                frame_count: 10
            })
        );

        let negative = resolve_radius(-3, 10);
        assert_eq!(negative.effective, 0);
        assert!(negative.was_clamped());

        let fine = resolve_radius(5, 10);
        assert_eq!(fine.effective, 5);
        assert!(fine.warning().is_none());
    }

    #[test]
    fn test_smoother_does_not_touch_input() {
        let raw = Trajectory::from_channels(vec![
            vec![0.0, 3.0, 0.0, 3.0],
            vec![1.0, 1.0, 1.0, 1.0],
        ])
        .unwrap();
        let before = raw.clone();
        let out = TrajectorySmoother::with_radius(1).smooth(&raw).unwrap();
        assert_eq!(raw, before);
        assert_eq!(out.trajectory.len(), 4);
        assert_eq!(out.trajectory.channel(1), Some(&[1.0, 1.0, 1.0, 1.0][..]));
        assert_eq!(out.trajectory.channel(0), Some(&[1.0, 1.0, 2.0, 2.0][..]));
    }

    #[test]
    fn test_independent_configs() {
        let raw = Trajectory::from_channels(vec![vec![0.0, 9.0, 0.0, 9.0, 0.0, 9.0]]).unwrap();
        let a = TrajectorySmoother::with_radius(0).smooth(&raw).unwrap();
        let b = TrajectorySmoother::with_radius(2).smooth(&raw).unwrap();
        assert_eq!(a.trajectory, raw);
        assert_ne!(b.trajectory, raw);
    }
}
