//! Border policies.
//!
//! A correction moves frame content, leaving part of the canvas without a
//! source. Policies either leave those regions at a fill value (`Pad`) or
//! zoom every frame about the canvas centre so less (or none) of the
//! uncovered area stays visible (`FixedCrop`, `DynamicCrop`). Zooming by
//! `s` then resampling at the original size is the same as cropping the
//! central `1/s` of the frame and resizing it back up.

use stabilo_motion_model::affine::AffineTransform;
use stabilo_motion_model::config::BorderPolicy;
use stabilo_motion_model::frame::FrameSize;

use crate::warp::inside;

const BISECTION_STEPS: usize = 48;

/// The zoom chosen for a whole video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderPlan {
    /// Uniform zoom applied about the canvas centre after each correction.
    pub scale: f64,
    /// Whether every corrected frame covers the whole canvas at `scale`.
    pub fully_covered: bool,
}

impl BorderPlan {
    /// Final transform for one frame: the correction, then the zoom.
    pub fn frame_transform(&self, correction: &AffineTransform, size: FrameSize) -> AffineTransform {
        let (cx, cy) = size.center();
        correction.then(&AffineTransform::scale_about(cx, cy, self.scale))
    }
}

/// Whether the canvas is fully covered by a frame warped by `correction`
/// and then zoomed by `scale`.
///
/// The preimage of the canvas is a parallelogram, so it lies within the
/// source exactly when its four corners do.
pub fn canvas_covered(correction: &AffineTransform, size: FrameSize, scale: f64) -> bool {
    let plan = BorderPlan {
        scale,
        fully_covered: false,
    };
    let inverse = plan.frame_transform(correction, size).invert();
    let (w, h) = ((size.width - 1) as f64, (size.height - 1) as f64);
    [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
        .iter()
        .all(|&(x, y)| {
            let (u, v) = inverse.apply(x, y);
            inside(u, v, size.width, size.height)
        })
}

fn all_covered(corrections: &[AffineTransform], size: FrameSize, scale: f64) -> bool {
    corrections
        .iter()
        .all(|t| canvas_covered(t, size, scale))
}

/// Choose the zoom for `policy` given every frame's correction.
pub fn plan_border(
    policy: &BorderPolicy,
    size: FrameSize,
    corrections: &[AffineTransform],
) -> BorderPlan {
    match *policy {
        BorderPolicy::Pad { .. } => BorderPlan {
            scale: 1.0,
            fully_covered: all_covered(corrections, size, 1.0),
        },
        BorderPolicy::FixedCrop { scale } => BorderPlan {
            scale,
            fully_covered: all_covered(corrections, size, scale),
        },
        BorderPolicy::DynamicCrop { max_scale } => {
            if all_covered(corrections, size, 1.0) {
                return BorderPlan {
                    scale: 1.0,
                    fully_covered: true,
                };
            }
            if !all_covered(corrections, size, max_scale) {
                tracing::warn!(
                    max_scale,
                    "Corrections exceed the maximum crop, borders will remain visible"
                );
                return BorderPlan {
                    scale: max_scale,
                    fully_covered: false,
                };
            }

            // Coverage only grows with the zoom, so bisect on it.
            let (mut lo, mut hi) = (1.0, max_scale);
            for _ in 0..BISECTION_STEPS {
                let mid = 0.5 * (lo + hi);
                if all_covered(corrections, size, mid) {
                    hi = mid;
                } else {
                    lo = mid;
                }
            }
            tracing::debug!(scale = hi, "Dynamic crop scale chosen");
            BorderPlan {
                scale: hi,
                fully_covered: true,
            }
        }
    }
}

/// Fill value written to uncovered pixels for `policy`.
pub fn fill_value(policy: &BorderPolicy, default_fill: u8) -> u8 {
    match *policy {
        BorderPolicy::Pad { fill } => fill,
        _ => default_fill,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hd() -> FrameSize {
        FrameSize {
            width: 101,
            height: 51,
            channels: 3,
        }
    }

    #[test]
    fn test_identity_needs_no_zoom() {
        let plan = plan_border(
            &BorderPolicy::DynamicCrop { max_scale: 2.0 },
            hd(),
            &[AffineTransform::IDENTITY; 4],
        );
        assert_eq!(plan.scale, 1.0);
        assert!(plan.fully_covered);
    }

    #[test]
    fn test_shift_needs_matching_zoom() {
        // Canvas x=0 maps back to 50 - 50/s - 10, which reaches 0 at s = 1.25.
        let shift = AffineTransform::from_rigid(10.0, 0.0, 0.0);
        let plan = plan_border(&BorderPolicy::DynamicCrop { max_scale: 2.0 }, hd(), &[shift]);
        assert!(plan.fully_covered);
        assert!((plan.scale - 1.25).abs() < 1e-6, "scale = {}", plan.scale);
        assert!(canvas_covered(&shift, hd(), plan.scale));
        assert!(!canvas_covered(&shift, hd(), plan.scale - 1e-3));
    }

    #[test]
    fn test_dynamic_crop_gives_up_at_max_scale() {
        let shift = AffineTransform::from_rigid(45.0, 0.0, 0.0);
        let plan = plan_border(&BorderPolicy::DynamicCrop { max_scale: 1.5 }, hd(), &[shift]);
        assert_eq!(plan.scale, 1.5);
        assert!(!plan.fully_covered);
    }

    #[test]
    fn test_fixed_crop_keeps_scale() {
        let policy = BorderPolicy::FixedCrop { scale: 1.04 };
        let plan = plan_border(&policy, hd(), &[AffineTransform::from_rigid(1.0, 0.5, 0.0)]);
        assert_eq!(plan.scale, 1.04);
        assert!(plan.fully_covered);
        assert_eq!(fill_value(&policy, 9), 9);
        assert_eq!(fill_value(&BorderPolicy::Pad { fill: 3 }, 9), 3);
    }
}
