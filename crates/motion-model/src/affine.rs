//! 2x3 affine transforms.
//!
//! Stored row-major as `[a, b, tx, c, d, ty]`, mapping
//! `(x, y) -> (a*x + b*y + tx, c*x + d*y + ty)`.

use serde::{Deserialize, Serialize};

/// A 2D affine transform in the layout accepted by common warp routines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AffineTransform {
    pub m: [f64; 6],
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    };

    pub fn new(m: [f64; 6]) -> Self {
        Self { m }
    }

    /// Rotation by `angle` radians about the origin followed by a
    /// translation of `(dx, dy)`.
    pub fn from_rigid(dx: f64, dy: f64, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            m: [cos, -sin, dx, sin, cos, dy],
        }
    }

    /// Uniform scale by `scale` about `(cx, cy)`.
    pub fn scale_about(cx: f64, cy: f64, scale: f64) -> Self {
        Self {
            m: [scale, 0.0, (1.0 - scale) * cx, 0.0, scale, (1.0 - scale) * cy],
        }
    }

    pub fn determinant(&self) -> f64 {
        self.m[0] * self.m[4] - self.m[1] * self.m[3]
    }

    /// Inverse transform. A singular matrix inverts to all zeros, matching
    /// the behaviour of OpenCV's `invertAffineTransform`.
    pub fn invert(&self) -> Self {
        let [a, b, c, d, e, f] = self.m;
        let det = self.determinant();
        let inv_det = if det != 0.0 { 1.0 / det } else { 0.0 };

        let na = e * inv_det;
        let nb = -b * inv_det;
        let nd = -d * inv_det;
        let ne = a * inv_det;
        let nc = -(na * c + nb * f);
        let nf = -(nd * c + ne * f);

        Self {
            m: [na, nb, nc, nd, ne, nf],
        }
    }

    /// `self` followed by `next`: the result maps `p` to `next(self(p))`.
    pub fn then(&self, next: &AffineTransform) -> Self {
        let [a1, b1, c1, d1, e1, f1] = self.m;
        let [a2, b2, c2, d2, e2, f2] = next.m;
        Self {
            m: [
                a2 * a1 + b2 * d1,
                a2 * b1 + b2 * e1,
                a2 * c1 + b2 * f1 + c2,
                d2 * a1 + e2 * d1,
                d2 * b1 + e2 * e1,
                d2 * c1 + e2 * f1 + f2,
            ],
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.m[0] * x + self.m[1] * y + self.m[2],
            self.m[3] * x + self.m[4] * y + self.m[5],
        )
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(a: (f64, f64), b: (f64, f64)) {
        assert!((a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_rigid_rotates_then_translates() {
        let t = AffineTransform::from_rigid(10.0, 0.0, FRAC_PI_2);
        assert_close(t.apply(1.0, 0.0), (10.0, 1.0));
    }

    #[test]
    fn test_invert_roundtrip() {
        let t = AffineTransform::from_rigid(3.5, -2.0, 0.3).then(&AffineTransform::scale_about(
            50.0, 40.0, 1.1,
        ));
        let p = t.invert().apply(t.apply(7.0, 9.0).0, t.apply(7.0, 9.0).1);
        assert_close(p, (7.0, 9.0));
    }

    #[test]
    fn test_singular_inverts_to_zero() {
        let t = AffineTransform::new([0.0; 6]);
        assert_eq!(t.invert().m, [0.0; 6]);
    }

    #[test]
    fn test_scale_about_keeps_center_fixed() {
        let t = AffineTransform::scale_about(32.0, 24.0, 1.04);
        assert_close(t.apply(32.0, 24.0), (32.0, 24.0));
    }
}
