//! Absolute pose sequences.
//!
//! A trajectory is stored channel-major: one `Vec<f64>` per motion channel,
//! all of the same length (the frame count). Trajectories are built once
//! and never mutated afterwards; smoothing produces a new value.

use serde::Serialize;

use crate::error::ModelError;
use crate::motion::MotionModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    channels: Vec<Vec<f64>>,
}

impl Trajectory {
    /// Wrap per-channel sequences. Requires at least one channel and equal
    /// channel lengths.
    pub fn from_channels(channels: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        let Some(first) = channels.first() else {
            return Err(ModelError::invalid_trajectory(
                "a trajectory needs at least one channel",
            ));
        };
        let len = first.len();
        if let Some((c, bad)) = channels.iter().enumerate().find(|(_, ch)| ch.len() != len) {
            return Err(ModelError::invalid_trajectory(format!(
                "channel {c} has {} poses, channel 0 has {len}",
                bad.len()
            )));
        }
        Ok(Self { channels })
    }

    /// Transpose a pose sequence into a trajectory.
    pub fn from_poses<M: MotionModel>(poses: &[M]) -> Self {
        let channels = (0..M::CHANNELS)
            .map(|c| poses.iter().map(|p| p.channel(c)).collect())
            .collect();
        Self { channels }
    }

    /// Number of poses.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    /// Pose `index` as a plain vector of channel values.
    pub fn pose(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.len() {
            return None;
        }
        Some(self.channels.iter().map(|ch| ch[index]).collect())
    }

    /// Pose `index` interpreted through a motion model. Returns `None` when
    /// out of range or when the channel count does not match the model.
    pub fn pose_as<M: MotionModel>(&self, index: usize) -> Option<M> {
        if index >= self.len() || self.channel_count() != M::CHANNELS {
            return None;
        }
        Some(M::from_channel_fn(|c| self.channels[c][index]))
    }

    /// All poses interpreted through a motion model.
    pub fn poses_as<M: MotionModel>(&self) -> Option<Vec<M>> {
        (0..self.len()).map(|i| self.pose_as(i)).collect()
    }
}
