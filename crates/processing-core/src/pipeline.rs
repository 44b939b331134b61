//! The analysis pass: frames → motion estimates → raw trajectory →
//! smoothed trajectory → corrections.
//!
//! Estimation is the only stage that talks to a collaborator and the only
//! one run per frame pair in parallel. Everything after it is a pure
//! function of the collected estimates.

use std::sync::Arc;

use rayon::prelude::*;

use stabilo_common::error::{StabiloError, StabiloResult};
use stabilo_motion_model::affine::AffineTransform;
use stabilo_motion_model::config::{PipelineConfig, SmoothingConfig};
use stabilo_motion_model::frame::{Frame, FrameSize, FrameSource};
use stabilo_motion_model::motion::{MotionModel, MotionSample};
use stabilo_motion_model::report::{CorrectionRecord, CorrectionReport, PipelineWarning};
use stabilo_motion_model::trajectory::Trajectory;

use crate::correction::{compute_corrections, correction_transforms};
use crate::estimator::MotionEstimator;
use crate::smoother::{ResolvedRadius, TrajectorySmoother};
use crate::trajectory::build_from_samples;

/// Check that `source` is usable: at least two readable, non-empty frames,
/// all of the same size. Returns that size.
pub fn validate_source<S: FrameSource + ?Sized>(source: &S) -> StabiloResult<FrameSize> {
    let count = source.frame_count();
    if count < 2 {
        return Err(StabiloError::input(format!(
            "need at least 2 frames to stabilize, got {count}"
        )));
    }

    let size = read_frame(source, 0)?.size();
    if size.byte_len() == 0 {
        return Err(StabiloError::input(format!(
            "frames are empty ({}x{}x{})",
            size.width, size.height, size.channels
        )));
    }
    for index in 1..count {
        let frame = read_frame(source, index)?;
        if frame.size() != size {
            return Err(StabiloError::input(format!(
                "frame {index} is {}x{}x{}, frame 0 is {}x{}x{}",
                frame.width(),
                frame.height(),
                frame.channels(),
                size.width,
                size.height,
                size.channels
            )));
        }
    }
    Ok(size)
}

pub(crate) fn read_frame<S: FrameSource + ?Sized>(source: &S, index: usize) -> StabiloResult<&Frame> {
    source
        .frame(index)
        .ok_or_else(|| StabiloError::input(format!("frame {index} could not be read")))
}

/// Estimate motion for every adjacent pair, in parallel, and return the
/// samples in pair order.
///
/// A failed pair becomes a zero-motion sample carrying the failure; the
/// run continues. Only an unusable source is an error.
pub fn estimate_motions<E, S>(
    estimator: &E,
    source: &S,
) -> StabiloResult<Vec<MotionSample<E::Motion>>>
where
    E: MotionEstimator + ?Sized,
    S: FrameSource + ?Sized,
{
    validate_source(source)?;
    let pairs = source.frame_count() - 1;

    tracing::info!(
        estimator = estimator.name(),
        pairs,
        "Estimating inter-frame motion"
    );

    let samples: Vec<MotionSample<E::Motion>> = (0..pairs)
        .into_par_iter()
        .map(|pair| -> StabiloResult<MotionSample<E::Motion>> {
            let from = read_frame(source, pair)?;
            let to = read_frame(source, pair + 1)?;
            Ok(MotionSample::from_result(estimator.estimate(from, to)))
        })
        .collect::<StabiloResult<_>>()?;

    for (pair, sample) in samples.iter().enumerate() {
        if let Some(failure) = &sample.failure {
            tracing::warn!(pair, reason = %failure, "Motion estimation failed, using zero motion");
        }
    }

    Ok(samples)
}

/// Everything the analysis pass produced for one video.
#[derive(Debug, Clone)]
pub struct TrajectoryAnalysis<M: MotionModel> {
    pub samples: Vec<MotionSample<M>>,
    pub raw: Trajectory,
    pub smoothed: Trajectory,
    /// `smoothed - raw` per frame.
    pub corrections: Trajectory,
    pub radius: ResolvedRadius,
    pub warnings: Vec<PipelineWarning>,
}

impl<M: MotionModel> TrajectoryAnalysis<M> {
    pub fn frame_count(&self) -> usize {
        self.raw.len()
    }

    /// Correction for frame `index`, interpreted through the motion model.
    pub fn correction(&self, index: usize) -> Option<M> {
        self.corrections.pose_as(index)
    }

    /// Correction matrices, one per frame.
    pub fn correction_transforms(&self) -> StabiloResult<Vec<AffineTransform>> {
        correction_transforms::<M>(&self.corrections)
    }

    /// Indices of pairs whose estimate is a zero-motion stand-in.
    pub fn synthetic_pairs(&self) -> Vec<usize> {
        self.samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_synthetic())
            .map(|(i, _)| i)
            .collect()
    }

    /// Serialisable per-frame summary.
    pub fn to_report(&self) -> StabiloResult<CorrectionReport> {
        let matrices = self.correction_transforms()?;
        let frames = matrices
            .into_iter()
            .enumerate()
            .map(|(frame, matrix)| -> StabiloResult<CorrectionRecord> {
                let missing = || StabiloError::input(format!("frame {frame} missing from trajectory"));
                Ok(CorrectionRecord {
                    frame,
                    raw: self.raw.pose(frame).ok_or_else(missing)?,
                    smoothed: self.smoothed.pose(frame).ok_or_else(missing)?,
                    delta: self.corrections.pose(frame).ok_or_else(missing)?,
                    matrix,
                })
            })
            .collect::<StabiloResult<Vec<_>>>()?;

        Ok(CorrectionReport {
            channels: M::channel_names().iter().map(|s| s.to_string()).collect(),
            frame_count: self.frame_count(),
            requested_radius: self.radius.requested,
            radius: self.radius.effective,
            synthetic_pairs: self.synthetic_pairs(),
            frames,
            warnings: self.warnings.clone(),
        })
    }
}

/// Build, smooth and correct from already-estimated samples.
///
/// `samples[i]` is the motion from frame `i` to frame `i + 1`, so the run
/// covers `samples.len() + 1` frames.
pub fn analyze_samples<M: MotionModel>(
    samples: Vec<MotionSample<M>>,
    config: &SmoothingConfig,
) -> StabiloResult<TrajectoryAnalysis<M>> {
    if samples.is_empty() {
        return Err(StabiloError::input(
            "need at least 2 frames (1 motion estimate) to stabilize",
        ));
    }

    let mut warnings: Vec<PipelineWarning> = samples
        .iter()
        .enumerate()
        .filter_map(|(pair, s)| {
            s.failure.as_ref().map(|f| PipelineWarning::SyntheticMotion {
                pair,
                reason: f.to_string(),
            })
        })
        .collect();

    let raw = build_from_samples(&samples);
    let smoothed = TrajectorySmoother::new(*config).smooth(&raw)?;
    warnings.extend(smoothed.radius.warning());
    let corrections = compute_corrections(&raw, &smoothed.trajectory)?;

    tracing::info!(
        frames = raw.len(),
        radius = smoothed.radius.effective,
        synthetic = warnings
            .iter()
            .filter(|w| matches!(w, PipelineWarning::SyntheticMotion { .. }))
            .count(),
        "Trajectory analysis complete"
    );

    Ok(TrajectoryAnalysis {
        samples,
        raw,
        smoothed: smoothed.trajectory,
        corrections,
        radius: smoothed.radius,
        warnings,
    })
}

/// A configured stabilizer: one estimator, one set of parameters, and an
/// optional dedicated worker pool.
pub struct StabilizationPipeline<E> {
    estimator: E,
    config: PipelineConfig,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl<E: MotionEstimator> StabilizationPipeline<E> {
    pub fn new(estimator: E, config: PipelineConfig) -> StabiloResult<Self> {
        config
            .validate()
            .map_err(|e| StabiloError::config(e.to_string()))?;
        Ok(Self {
            estimator,
            config,
            pool: None,
        })
    }

    /// Run parallel stages on a dedicated pool of `threads` workers instead
    /// of the global rayon pool.
    pub fn with_worker_threads(mut self, threads: usize) -> StabiloResult<Self> {
        if threads == 0 {
            return Err(StabiloError::config("worker thread count must be > 0"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("stabilo-worker-{i}"))
            .build()
            .map_err(|e| StabiloError::config(format!("failed to build worker pool: {e}")))?;
        self.pool = Some(Arc::new(pool));
        Ok(self)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Run `f` on this pipeline's pool, or inline when none is configured.
    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }

    /// Estimate, build, smooth and correct.
    pub fn analyze<S: FrameSource + ?Sized>(
        &self,
        source: &S,
    ) -> StabiloResult<TrajectoryAnalysis<E::Motion>> {
        let samples = self.install(|| estimate_motions(&self.estimator, source))?;
        analyze_samples(samples, &self.config.smoothing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stabilo_motion_model::frame::FrameSize;
    use stabilo_motion_model::motion::{EstimationFailure, MotionEstimate};

    /// Frames are filled with their own index; the estimator looks the pair
    /// up in a script.
    struct ScriptedEstimator {
        script: Vec<Option<MotionEstimate>>,
    }

    impl MotionEstimator for ScriptedEstimator {
        type Motion = MotionEstimate;

        fn name(&self) -> &str {
            "scripted"
        }

        fn estimate(&self, from: &Frame, _to: &Frame) -> Result<MotionEstimate, EstimationFailure> {
            let pair = from.as_slice()[0] as usize;
            self.script[pair].ok_or(EstimationFailure::TooFewCorrespondences {
                found: 0,
                required: 3,
            })
        }
    }

    fn frames(n: usize) -> Vec<Frame> {
        let size = FrameSize {
            width: 4,
            height: 4,
            channels: 1,
        };
        (0..n).map(|i| Frame::filled(size, i as u8)).collect()
    }

    #[test]
    fn test_single_frame_is_fatal() {
        let estimator = ScriptedEstimator { script: vec![] };
        let err = estimate_motions(&estimator, &frames(1)).unwrap_err();
        assert!(matches!(err, StabiloError::Input { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_mismatched_frame_sizes_are_fatal() {
        let mut video = frames(3);
        video.push(Frame::filled(
            FrameSize {
                width: 8,
                height: 4,
                channels: 1,
            },
            3,
        ));
        assert!(validate_source(&video).is_err());
    }

    #[test]
    fn test_zero_sized_frames_are_fatal() {
        for (width, height, channels) in [(0, 4, 1), (4, 0, 1), (4, 4, 0)] {
            let size = FrameSize {
                width,
                height,
                channels,
            };
            let video = vec![Frame::filled(size, 0); 3];
            let err = validate_source(&video).unwrap_err();
            assert!(matches!(err, StabiloError::Input { .. }), "{err}");
        }
    }

    #[test]
    fn test_samples_keep_pair_order() {
        let script: Vec<_> = (0..20)
            .map(|i| Some(MotionEstimate::new(i as f64, 0.0, 0.0)))
            .collect();
        let estimator = ScriptedEstimator { script };
        let samples = estimate_motions(&estimator, &frames(21)).unwrap();
        for (i, s) in samples.iter().enumerate() {
            assert_eq!(s.estimate.dx, i as f64);
        }
    }

    #[test]
    fn test_failure_is_substituted_and_reported() {
        let estimator = ScriptedEstimator {
            script: vec![
                Some(MotionEstimate::new(1.0, 0.0, 0.0)),
                None,
                Some(MotionEstimate::new(1.0, 0.0, 0.0)),
            ],
        };
        let pipeline =
            StabilizationPipeline::new(estimator, PipelineConfig::with_radius(1)).unwrap();
        let analysis = pipeline.analyze(&frames(4)).unwrap();

        assert_eq!(analysis.raw.pose(2), analysis.raw.pose(1));
        assert_eq!(analysis.synthetic_pairs(), vec![1]);
        assert!(matches!(
            analysis.warnings[0],
            PipelineWarning::SyntheticMotion { pair: 1, .. }
        ));
    }

    #[test]
    fn test_radius_clamp_is_a_warning() {
        let samples = vec![MotionSample::measured(MotionEstimate::new(1.0, 2.0, 0.0)); 9];
        let analysis = analyze_samples(samples, &SmoothingConfig { radius: 100 }).unwrap();
        assert_eq!(analysis.frame_count(), 10);
        assert_eq!(analysis.radius.effective, 5);
        assert_eq!(
            analysis.warnings,
            vec![PipelineWarning::RadiusClamped {
                requested: 100,
                effective: 5,
                frame_count: 10
            }]
        );
    }

    #[test]
    fn test_empty_samples_are_fatal() {
        let result = analyze_samples::<MotionEstimate>(vec![], &SmoothingConfig::default());
        assert!(matches!(result, Err(StabiloError::Input { .. })));
    }

    #[test]
    fn test_report_matches_analysis() {
        let samples = vec![
            MotionSample::measured(MotionEstimate::new(2.0, 0.0, 0.0)),
            MotionSample::measured(MotionEstimate::new(-2.0, 0.0, 0.0)),
            MotionSample::measured(MotionEstimate::new(2.0, 0.0, 0.0)),
        ];
        let analysis = analyze_samples(samples, &SmoothingConfig { radius: 1 }).unwrap();
        let report = analysis.to_report().unwrap();

        assert_eq!(report.channels, vec!["x", "y", "angle"]);
        assert_eq!(report.frames.len(), 4);
        for record in &report.frames {
            assert_eq!(record.raw.len(), 3);
            assert_eq!(record.matrix.m[2], record.delta[0]);
        }
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"radius\":1"));
    }

    #[test]
    fn test_dedicated_pool() {
        let estimator = ScriptedEstimator {
            script: vec![Some(MotionEstimate::ZERO); 3],
        };
        let pipeline = StabilizationPipeline::new(estimator, PipelineConfig::with_radius(1))
            .unwrap()
            .with_worker_threads(2)
            .unwrap();
        let analysis = pipeline.analyze(&frames(4)).unwrap();
        assert!(analysis.warnings.is_empty());
        assert_eq!(analysis.correction(3), Some(MotionEstimate::ZERO));
    }
}
