//! Trajectory building: cumulative sum of motion estimates.

use stabilo_motion_model::motion::{MotionModel, MotionSample};
use stabilo_motion_model::trajectory::Trajectory;

/// Accumulate inter-frame deltas into absolute poses.
///
/// `pose[0]` is the identity and `pose[i] = pose[i - 1] + deltas[i - 1]`,
/// channel by channel, so the result has `deltas.len() + 1` poses.
pub fn build_trajectory<M: MotionModel>(deltas: &[M]) -> Trajectory {
    let mut poses = Vec::with_capacity(deltas.len() + 1);
    let mut pose = M::identity();
    poses.push(pose);
    for delta in deltas {
        pose = pose.add(delta);
        poses.push(pose);
    }
    Trajectory::from_poses(&poses)
}

/// Build a trajectory from recorded samples. Synthetic samples contribute
/// zero motion, so the trajectory holds still across that pair.
pub fn build_from_samples<M: MotionModel>(samples: &[MotionSample<M>]) -> Trajectory {
    let deltas: Vec<M> = samples.iter().map(|s| s.estimate).collect();
    build_trajectory(&deltas)
}
