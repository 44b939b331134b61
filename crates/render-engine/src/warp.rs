//! Affine warping of 8-bit frames.

use rayon::prelude::*;

use stabilo_motion_model::affine::AffineTransform;
use stabilo_motion_model::config::Interpolation;
use stabilo_motion_model::frame::Frame;

/// Slack allowed when deciding whether a sample point lies on the source
/// grid, so that exact integer transforms are not lost to rounding.
pub(crate) const EDGE_EPS: f64 = 1e-6;

pub(crate) fn inside(u: f64, v: f64, width: usize, height: usize) -> bool {
    u >= -EDGE_EPS
        && v >= -EDGE_EPS
        && u <= width as f64 - 1.0 + EDGE_EPS
        && v <= height as f64 - 1.0 + EDGE_EPS
}

/// A warped frame and how many of its pixels had no source.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpOutput {
    pub frame: Frame,
    pub uncovered: usize,
}

impl WarpOutput {
    /// Share of output pixels filled with the border value.
    pub fn uncovered_fraction(&self) -> f64 {
        let pixels = self.frame.width() * self.frame.height();
        self.uncovered as f64 / pixels as f64
    }
}

/// Warp `src` by `transform` onto a canvas of the same size.
///
/// Each destination pixel is mapped back through the inverse transform and
/// sampled from `src`; destinations whose preimage falls outside the source
/// keep the `fill` value. Rows are processed in parallel.
pub fn warp_affine(
    src: &Frame,
    transform: &AffineTransform,
    interpolation: Interpolation,
    fill: u8,
) -> WarpOutput {
    let size = src.size();
    let (width, height, channels) = (size.width, size.height, size.channels);
    let inverse = transform.invert();
    let stride = width * channels;
    let data = src.as_slice();

    let mut out = Frame::filled(size, fill);
    let uncovered: usize = out
        .as_mut_slice()
        .par_chunks_mut(stride)
        .enumerate()
        .map(|(y, row)| {
            let mut missing = 0usize;
            for x in 0..width {
                let (u, v) = inverse.apply(x as f64, y as f64);
                if !inside(u, v, width, height) {
                    missing += 1;
                    continue;
                }
                let dst = &mut row[x * channels..(x + 1) * channels];
                match interpolation {
                    Interpolation::Nearest => sample_nearest(data, width, height, channels, u, v, dst),
                    Interpolation::Bilinear => sample_bilinear(data, width, height, channels, u, v, dst),
                }
            }
            missing
        })
        .sum();

    WarpOutput {
        frame: out,
        uncovered,
    }
}

fn sample_nearest(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    u: f64,
    v: f64,
    dst: &mut [u8],
) {
    let x = (u.round().max(0.0) as usize).min(width - 1);
    let y = (v.round().max(0.0) as usize).min(height - 1);
    let base = (y * width + x) * channels;
    dst.copy_from_slice(&data[base..base + channels]);
}

fn sample_bilinear(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    u: f64,
    v: f64,
    dst: &mut [u8],
) {
    let u = u.clamp(0.0, (width - 1) as f64);
    let v = v.clamp(0.0, (height - 1) as f64);

    let x0 = u.floor() as usize;
    let y0 = v.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = u - x0 as f64;
    let fy = v - y0 as f64;

    let w00 = (1.0 - fx) * (1.0 - fy);
    let w01 = fx * (1.0 - fy);
    let w10 = (1.0 - fx) * fy;
    let w11 = fx * fy;

    let b00 = (y0 * width + x0) * channels;
    let b01 = (y0 * width + x1) * channels;
    let b10 = (y1 * width + x0) * channels;
    let b11 = (y1 * width + x1) * channels;

    for (k, out) in dst.iter_mut().enumerate() {
        let value = data[b00 + k] as f64 * w00
            + data[b01 + k] as f64 * w01
            + data[b10 + k] as f64 * w10
            + data[b11 + k] as f64 * w11;
        *out = value.round().clamp(0.0, 255.0) as u8;
    }
}
