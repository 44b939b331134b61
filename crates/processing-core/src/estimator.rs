//! Motion estimation seam.
//!
//! The stabilizer never detects features or runs a flow network itself.
//! It calls a [`MotionEstimator`], and this module provides adapters that
//! turn the output of external collaborators (a descriptor matcher or a
//! dense optical-flow model) into rigid motion with the same least-squares
//! fit. Nothing downstream knows which adapter produced an estimate.

use stabilo_motion_model::config::{FeatureMatchConfig, FlowModelConfig};
use stabilo_motion_model::error::ModelError;
use stabilo_motion_model::frame::Frame;
use stabilo_motion_model::motion::{EstimationFailure, MotionEstimate, MotionModel};

/// Estimates the camera motion between two consecutive frames.
///
/// Implementations must not depend on call order: the pipeline calls
/// `estimate` for different pairs concurrently.
pub trait MotionEstimator: Send + Sync {
    type Motion: MotionModel;

    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn estimate(&self, from: &Frame, to: &Frame) -> Result<Self::Motion, EstimationFailure>;
}

impl<E: MotionEstimator + ?Sized> MotionEstimator for &E {
    type Motion = E::Motion;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn estimate(&self, from: &Frame, to: &Frame) -> Result<Self::Motion, EstimationFailure> {
        (**self).estimate(from, to)
    }
}

impl<E: MotionEstimator + ?Sized> MotionEstimator for Box<E> {
    type Motion = E::Motion;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn estimate(&self, from: &Frame, to: &Frame) -> Result<Self::Motion, EstimationFailure> {
        (**self).estimate(from, to)
    }
}

/// A point in the first frame and where it appears in the second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

impl Correspondence {
    pub fn new(from: (f64, f64), to: (f64, f64)) -> Self {
        Self { from, to }
    }
}

/// Least-squares rigid fit (rotation + translation, no scale) mapping
/// `from` points onto `to` points.
///
/// Fails with [`EstimationFailure::TooFewCorrespondences`] below
/// `min_required` (never less than 2) and with
/// [`EstimationFailure::DegenerateFit`] when either point set has no
/// spread or the sums are not finite.
pub fn fit_rigid(
    pairs: &[Correspondence],
    min_required: usize,
) -> Result<MotionEstimate, EstimationFailure> {
    let required = min_required.max(2);
    if pairs.len() < required {
        return Err(EstimationFailure::TooFewCorrespondences {
            found: pairs.len(),
            required,
        });
    }

    let n = pairs.len() as f64;
    let (sum_px, sum_py, sum_qx, sum_qy) =
        pairs
            .iter()
            .fold((0.0, 0.0, 0.0, 0.0), |(px, py, qx, qy), c| {
                (px + c.from.0, py + c.from.1, qx + c.to.0, qy + c.to.1)
            });
    let (px, py, qx, qy) = (sum_px / n, sum_py / n, sum_qx / n, sum_qy / n);

    let mut dot = 0.0;
    let mut cross = 0.0;
    let mut spread_from = 0.0;
    let mut spread_to = 0.0;
    for c in pairs {
        let (ax, ay) = (c.from.0 - px, c.from.1 - py);
        let (bx, by) = (c.to.0 - qx, c.to.1 - qy);
        dot += ax * bx + ay * by;
        cross += ax * by - ay * bx;
        spread_from += ax * ax + ay * ay;
        spread_to += bx * bx + by * by;
    }

    let eps = 1e-12 * n;
    if !(spread_from > eps && spread_to > eps) || !dot.is_finite() || !cross.is_finite() {
        return Err(EstimationFailure::DegenerateFit);
    }

    let dangle = cross.atan2(dot);
    let (sin, cos) = dangle.sin_cos();
    Ok(MotionEstimate {
        dx: qx - (cos * px - sin * py),
        dy: qy - (sin * px + cos * py),
        dangle,
    })
}

// ---------------------------------------------------------------------------
// Feature correspondences
// ---------------------------------------------------------------------------

/// One query descriptor's two nearest neighbours in the other frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnnMatch {
    /// Keypoint location in the first frame.
    pub from: (f64, f64),
    /// Location of the nearest descriptor in the second frame.
    pub to: (f64, f64),
    /// Descriptor distance to the nearest neighbour.
    pub best_distance: f32,
    /// Descriptor distance to the second-nearest neighbour, if any.
    pub second_distance: Option<f32>,
}

/// External keypoint detector + descriptor matcher (SIFT/ORB with a
/// FLANN-style index, for example).
pub trait FeatureMatcher: Send + Sync {
    fn name(&self) -> &str;

    /// Detect keypoints in both frames and return, for every descriptor of
    /// `from`, its two nearest neighbours among the descriptors of `to`.
    fn knn_match(
        &self,
        from: &Frame,
        to: &Frame,
        config: &FeatureMatchConfig,
    ) -> Result<Vec<KnnMatch>, EstimationFailure>;
}

/// Keep the matches that pass Lowe's ratio test. A match without a second
/// neighbour cannot be tested and is dropped.
pub fn ratio_test(matches: &[KnnMatch], ratio_threshold: f64) -> Vec<Correspondence> {
    matches
        .iter()
        .filter(|m| {
            m.second_distance
                .is_some_and(|second| (m.best_distance as f64) < ratio_threshold * second as f64)
        })
        .map(|m| Correspondence::new(m.from, m.to))
        .collect()
}

/// Rigid motion from filtered feature correspondences.
pub struct CorrespondenceEstimator<F> {
    matcher: F,
    config: FeatureMatchConfig,
    name: String,
}

impl<F: FeatureMatcher> CorrespondenceEstimator<F> {
    pub fn new(matcher: F, config: FeatureMatchConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let name = format!("features/{}", matcher.name());
        Ok(Self {
            matcher,
            config,
            name,
        })
    }

    pub fn config(&self) -> &FeatureMatchConfig {
        &self.config
    }
}

impl<F: FeatureMatcher> MotionEstimator for CorrespondenceEstimator<F> {
    type Motion = MotionEstimate;

    fn name(&self) -> &str {
        &self.name
    }

    fn estimate(&self, from: &Frame, to: &Frame) -> Result<MotionEstimate, EstimationFailure> {
        let matches = self.matcher.knn_match(from, to, &self.config)?;
        let good = ratio_test(&matches, self.config.ratio_threshold);
        tracing::trace!(
            matches = matches.len(),
            kept = good.len(),
            "Ratio test applied"
        );
        fit_rigid(&good, self.config.min_matches)
    }
}

// ---------------------------------------------------------------------------
// Dense optical flow
// ---------------------------------------------------------------------------

/// Per-pixel displacement predicted by a flow model, in model-input pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowField {
    width: usize,
    height: usize,
    u: Vec<f32>,
    v: Vec<f32>,
}

impl FlowField {
    pub fn new(width: usize, height: usize, u: Vec<f32>, v: Vec<f32>) -> Result<Self, ModelError> {
        let expected = width * height;
        if expected == 0 || u.len() != expected || v.len() != expected {
            return Err(ModelError::invalid_frame(format!(
                "flow field {width}x{height} needs {expected} vectors per component, got {} and {}",
                u.len(),
                v.len()
            )));
        }
        Ok(Self {
            width,
            height,
            u,
            v,
        })
    }

    /// A field where every vector is `(u, v)`.
    pub fn uniform(width: usize, height: usize, u: f32, v: f32) -> Self {
        Self {
            width,
            height,
            u: vec![u; width * height],
            v: vec![v; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn at(&self, x: usize, y: usize) -> Option<(f32, f32)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y * self.width + x;
        Some((self.u[i], self.v[i]))
    }
}

/// A frame resized and normalized for a flow model, laid out channel-first.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowInput {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

/// Nearest-neighbour resize to the model input size, then
/// `(v / 255 - mean) / std` per value, CHW order.
pub fn prepare_flow_input(frame: &Frame, config: &FlowModelConfig) -> FlowInput {
    let (w, h, c) = (config.input_width, config.input_height, frame.channels());
    let sx = frame.width() as f64 / w as f64;
    let sy = frame.height() as f64 / h as f64;
    let src = frame.as_slice();

    let mut data = vec![0.0f32; w * h * c];
    for y in 0..h {
        let src_y = (((y as f64 + 0.5) * sy) as usize).min(frame.height() - 1);
        for x in 0..w {
            let src_x = (((x as f64 + 0.5) * sx) as usize).min(frame.width() - 1);
            let base = (src_y * frame.width() + src_x) * c;
            for ch in 0..c {
                data[ch * w * h + y * w + x] = config.normalize(src[base + ch]);
            }
        }
    }

    FlowInput {
        width: w,
        height: h,
        channels: c,
        data,
    }
}

/// External dense optical-flow model (RAFT or similar).
pub trait FlowModel: Send + Sync {
    fn name(&self) -> &str;

    /// Predict the flow from `from` to `to`. Implementations typically call
    /// [`prepare_flow_input`] on both frames first.
    fn predict(
        &self,
        from: &Frame,
        to: &Frame,
        config: &FlowModelConfig,
    ) -> Result<FlowField, EstimationFailure>;
}

/// Rigid motion fitted to a grid of flow vectors.
pub struct FlowFieldEstimator<F> {
    model: F,
    config: FlowModelConfig,
    name: String,
}

impl<F: FlowModel> FlowFieldEstimator<F> {
    pub fn new(model: F, config: FlowModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let name = format!("flow/{}", model.name());
        Ok(Self {
            model,
            config,
            name,
        })
    }

    pub fn config(&self) -> &FlowModelConfig {
        &self.config
    }
}

/// Sample `field` every `stride` vectors and express each sample in the
/// pixel coordinates of a `frame_width x frame_height` frame.
pub fn sample_flow(
    field: &FlowField,
    stride: usize,
    frame_width: usize,
    frame_height: usize,
) -> Vec<Correspondence> {
    let sx = frame_width as f64 / field.width() as f64;
    let sy = frame_height as f64 / field.height() as f64;
    let stride = stride.max(1);

    let mut pairs = Vec::new();
    for y in (0..field.height()).step_by(stride) {
        for x in (0..field.width()).step_by(stride) {
            let Some((u, v)) = field.at(x, y) else {
                continue;
            };
            if !u.is_finite() || !v.is_finite() {
                continue;
            }
            let from = ((x as f64 + 0.5) * sx, (y as f64 + 0.5) * sy);
            let to = (from.0 + u as f64 * sx, from.1 + v as f64 * sy);
            pairs.push(Correspondence::new(from, to));
        }
    }
    pairs
}

impl<F: FlowModel> MotionEstimator for FlowFieldEstimator<F> {
    type Motion = MotionEstimate;

    fn name(&self) -> &str {
        &self.name
    }

    fn estimate(&self, from: &Frame, to: &Frame) -> Result<MotionEstimate, EstimationFailure> {
        let field = self.model.predict(from, to, &self.config)?;
        let pairs = sample_flow(
            &field,
            self.config.sample_stride,
            from.width(),
            from.height(),
        );
        fit_rigid(&pairs, self.config.min_valid_vectors)
    }
}
