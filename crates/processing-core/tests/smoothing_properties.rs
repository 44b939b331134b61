use proptest::prelude::*;

use stabilo_motion_model::motion::{MotionEstimate, MotionSample};
use stabilo_motion_model::trajectory::Trajectory;
use stabilo_processing_core::correction::compute_corrections;
use stabilo_processing_core::smoother::{max_radius, smooth_channel, smooth_trajectory};
use stabilo_processing_core::trajectory::{build_from_samples, build_trajectory};

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// A curve together with a radius that is valid for its length.
fn curve_and_radius() -> impl Strategy<Value = (Vec<f64>, usize)> {
    prop::collection::vec(-1000.0f64..1000.0, 1..64).prop_flat_map(|curve| {
        let max = max_radius(curve.len());
        (Just(curve), 0..=max)
    })
}

proptest! {
    #[test]
    fn smoothing_preserves_length((curve, radius) in curve_and_radius()) {
        prop_assert_eq!(smooth_channel(&curve, radius).len(), curve.len());
    }

    #[test]
    fn radius_zero_is_identity(curve in prop::collection::vec(-1e6f64..1e6, 0..64)) {
        prop_assert_eq!(smooth_channel(&curve, 0), curve);
    }

    #[test]
    fn offset_commutes_with_smoothing(
        (curve, radius) in curve_and_radius(),
        offset in -500.0f64..500.0,
    ) {
        let shifted: Vec<f64> = curve.iter().map(|v| v + offset).collect();
        let a = smooth_channel(&shifted, radius);
        let b = smooth_channel(&curve, radius);
        for (x, y) in a.iter().zip(&b) {
            prop_assert!((x - (y + offset)).abs() < 1e-9, "{} vs {}", x, y + offset);
        }
    }

    #[test]
    fn constant_curve_is_fixpoint(
        value in -1e3f64..1e3,
        len in 1usize..64,
        radius_seed in 0usize..64,
    ) {
        let curve = vec![value; len];
        let radius = radius_seed % (max_radius(len) + 1);
        for smoothed in smooth_channel(&curve, radius) {
            prop_assert!((smoothed - value).abs() < 1e-9);
        }
    }

    #[test]
    fn smoothing_never_increases_variance((curve, radius) in curve_and_radius()) {
        prop_assume!(radius >= 1);
        let smoothed = smooth_channel(&curve, radius);
        prop_assert!(variance(&smoothed) <= variance(&curve) + 1e-9);
    }

    #[test]
    fn trajectory_is_prefix_sum(
        deltas in prop::collection::vec((-50i32..50, -50i32..50, -5i32..5), 0..40),
    ) {
        let deltas: Vec<MotionEstimate> = deltas
            .into_iter()
            .map(|(x, y, a)| MotionEstimate::new(x as f64, y as f64, a as f64 * 0.01))
            .collect();
        let traj = build_trajectory(&deltas);
        prop_assert_eq!(traj.len(), deltas.len() + 1);
        prop_assert_eq!(traj.pose(0), Some(vec![0.0, 0.0, 0.0]));

        let mut expected = MotionEstimate::ZERO;
        for (i, delta) in deltas.iter().enumerate() {
            expected.dx += delta.dx;
            expected.dy += delta.dy;
            expected.dangle += delta.dangle;
            prop_assert_eq!(traj.pose_as::<MotionEstimate>(i + 1), Some(expected));
        }
    }

    #[test]
    fn correction_lands_on_smoothed_path(
        deltas in prop::collection::vec((-100i32..100, -100i32..100, -10i32..10), 1..40),
        radius in 0usize..10,
    ) {
        // Integer-valued poses keep every sum and difference exact.
        let samples: Vec<MotionSample> = deltas
            .into_iter()
            .map(|(x, y, a)| MotionSample::measured(MotionEstimate::new(x as f64, y as f64, a as f64)))
            .collect();
        let raw = build_from_samples(&samples);
        let radius = radius.min(max_radius(raw.len()));
        let smoothed = smooth_trajectory(&raw, radius).unwrap();
        let delta = compute_corrections(&raw, &smoothed).unwrap();

        for c in 0..raw.channel_count() {
            let (r, s, d) = (
                raw.channel(c).unwrap(),
                smoothed.channel(c).unwrap(),
                delta.channel(c).unwrap(),
            );
            for i in 0..raw.len() {
                prop_assert_eq!(s[i] - r[i], d[i]);
                let tolerance = f64::EPSILON * (r[i].abs() + s[i].abs() + 1.0) * 2.0;
                prop_assert!((r[i] + d[i] - s[i]).abs() <= tolerance);
            }
        }
    }
}

#[test]
fn channels_are_smoothed_independently() {
    let raw = Trajectory::from_channels(vec![
        vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0],
        vec![5.0; 7],
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
        vec![0.0; 7],
    ])
    .unwrap();
    let smoothed = smooth_trajectory(&raw, 1).unwrap();

    assert_eq!(smoothed.channel_count(), 4);
    for c in 0..4 {
        assert_eq!(
            smoothed.channel(c).unwrap(),
            smooth_channel(raw.channel(c).unwrap(), 1).as_slice()
        );
    }
}
