use proptest::prelude::*;

use stabilo_motion_model::affine::AffineTransform;
use stabilo_motion_model::motion::{MotionEstimate, MotionModel};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    #[test]
    fn rigid_transforms_preserve_area(
        dx in -500.0f64..500.0,
        dy in -500.0f64..500.0,
        angle in -std::f64::consts::PI..std::f64::consts::PI,
    ) {
        let m = AffineTransform::from_rigid(dx, dy, angle);
        prop_assert!(close(m.determinant(), 1.0));
    }

    #[test]
    fn inverse_undoes_rigid_motion(
        dx in -500.0f64..500.0,
        dy in -500.0f64..500.0,
        angle in -3.0f64..3.0,
        x in -1000.0f64..1000.0,
        y in -1000.0f64..1000.0,
    ) {
        let m = AffineTransform::from_rigid(dx, dy, angle);
        let (u, v) = m.apply(x, y);
        let (bx, by) = m.invert().apply(u, v);
        prop_assert!((bx - x).abs() < 1e-6);
        prop_assert!((by - y).abs() < 1e-6);
    }

    #[test]
    fn estimate_matches_its_matrix(
        dx in -50.0f64..50.0,
        dy in -50.0f64..50.0,
        dangle in -1.5f64..1.5,
    ) {
        let estimate = MotionEstimate::new(dx, dy, dangle);
        let back = MotionEstimate::from_affine(&estimate.to_affine());
        prop_assert!(close(back.dx, dx));
        prop_assert!(close(back.dy, dy));
        prop_assert!(close(back.dangle, dangle));
    }
}
