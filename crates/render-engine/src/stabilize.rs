//! End-to-end stabilization: analysis, border planning, and warping.

use rayon::prelude::*;

use stabilo_common::error::{StabiloError, StabiloResult};
use stabilo_motion_model::affine::AffineTransform;
use stabilo_motion_model::config::WarpConfig;
use stabilo_motion_model::frame::{FrameSink, FrameSource};
use stabilo_motion_model::motion::MotionModel;
use stabilo_motion_model::report::PipelineWarning;
use stabilo_processing_core::estimator::MotionEstimator;
use stabilo_processing_core::pipeline::{validate_source, StabilizationPipeline, TrajectoryAnalysis};

use crate::border::{fill_value, plan_border};
use crate::warp::{warp_affine, WarpOutput};

/// Frames warped concurrently before being handed to the sink.
const WARP_BATCH: usize = 16;

/// Progress callback for stabilization.
pub type ProgressCallback = Box<dyn Fn(StabilizeProgress) + Send + Sync>;

/// Stabilization progress report.
#[derive(Debug, Clone)]
pub struct StabilizeProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames emitted so far.
    pub frames_written: usize,

    /// Total frames to emit.
    pub total_frames: usize,

    /// Current stage.
    pub stage: StabilizeStage,
}

/// Stages of a stabilization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilizeStage {
    Analyzing,
    Warping,
    Complete,
}

/// Outcome of the warp stage.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpSummary {
    /// Zoom applied by the border policy.
    pub scale: f64,
    pub frames_written: usize,
    pub warnings: Vec<PipelineWarning>,
}

/// Warp every frame of `source` by its correction and hand the results to
/// `sink` in frame order.
///
/// Frames are warped in parallel batches on the current rayon pool.
/// Uncovered canvas regions are filled according to the border policy and
/// reported as [`PipelineWarning::OutOfCanvas`], never as errors.
pub fn stabilize_frames<S, K>(
    source: &S,
    corrections: &[AffineTransform],
    config: &WarpConfig,
    sink: &mut K,
    progress: Option<&ProgressCallback>,
) -> StabiloResult<WarpSummary>
where
    S: FrameSource + ?Sized,
    K: FrameSink,
{
    let size = validate_source(source)?;
    let total = source.frame_count();
    if corrections.len() != total {
        return Err(StabiloError::input(format!(
            "{} corrections for {total} frames",
            corrections.len()
        )));
    }
    config
        .border
        .validate()
        .map_err(|e| StabiloError::config(e.to_string()))?;

    let plan = plan_border(&config.border, size, corrections);
    let fill = fill_value(&config.border, config.fill);
    tracing::info!(
        frames = total,
        scale = plan.scale,
        covered = plan.fully_covered,
        "Warping frames"
    );

    let mut warnings = Vec::new();
    let mut written = 0;
    for start in (0..total).step_by(WARP_BATCH) {
        let end = (start + WARP_BATCH).min(total);
        let outputs: Vec<WarpOutput> = (start..end)
            .into_par_iter()
            .map(|index| -> StabiloResult<WarpOutput> {
                let frame = source
                    .frame(index)
                    .ok_or_else(|| StabiloError::input(format!("frame {index} could not be read")))?;
                let transform = plan.frame_transform(&corrections[index], size);
                Ok(warp_affine(frame, &transform, config.interpolation, fill))
            })
            .collect::<StabiloResult<_>>()?;

        for (offset, output) in outputs.into_iter().enumerate() {
            let index = start + offset;
            if output.uncovered > 0 {
                let uncovered_fraction = output.uncovered_fraction();
                tracing::debug!(frame = index, uncovered_fraction, "Border fill applied");
                warnings.push(PipelineWarning::OutOfCanvas {
                    frame: index,
                    uncovered_fraction,
                });
            }
            sink.emit(index, output.frame)
                .map_err(|e| StabiloError::warp(format!("sink rejected frame {index}: {e}")))?;
            written += 1;
        }

        if let Some(cb) = progress {
            cb(StabilizeProgress {
                progress: written as f64 / total as f64,
                frames_written: written,
                total_frames: total,
                stage: StabilizeStage::Warping,
            });
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            frames = warnings.len(),
            "Some frames expose canvas borders after correction"
        );
    }

    Ok(WarpSummary {
        scale: plan.scale,
        frames_written: written,
        warnings,
    })
}

/// Result of [`stabilize_video`].
#[derive(Debug, Clone)]
pub struct StabilizationReport<M: MotionModel> {
    pub analysis: TrajectoryAnalysis<M>,
    pub warp: WarpSummary,
}

impl<M: MotionModel> StabilizationReport<M> {
    /// Every recovered problem from both stages, analysis first.
    pub fn warnings(&self) -> impl Iterator<Item = &PipelineWarning> {
        self.analysis.warnings.iter().chain(&self.warp.warnings)
    }
}

/// Run the whole pipeline: estimate, build, smooth, correct, warp, emit.
///
/// Fatal input problems are detected during analysis, before any frame is
/// emitted, so a failed run produces no partial output.
pub fn stabilize_video<E, S, K>(
    pipeline: &StabilizationPipeline<E>,
    source: &S,
    sink: &mut K,
    progress: Option<&ProgressCallback>,
) -> StabiloResult<StabilizationReport<E::Motion>>
where
    E: MotionEstimator,
    S: FrameSource + ?Sized,
    K: FrameSink + Send,
{
    let total = source.frame_count();
    if let Some(cb) = progress {
        cb(StabilizeProgress {
            progress: 0.0,
            frames_written: 0,
            total_frames: total,
            stage: StabilizeStage::Analyzing,
        });
    }

    let analysis = pipeline.analyze(source)?;
    let corrections = analysis.correction_transforms()?;
    let warp_config = pipeline.config().warp;
    let warp = pipeline.install(|| {
        stabilize_frames(source, &corrections, &warp_config, sink, progress)
    })?;

    if let Some(cb) = progress {
        cb(StabilizeProgress {
            progress: 1.0,
            frames_written: warp.frames_written,
            total_frames: total,
            stage: StabilizeStage::Complete,
        });
    }
    tracing::info!(
        frames = warp.frames_written,
        radius = analysis.radius.effective,
        scale = warp.scale,
        warnings = analysis.warnings.len() + warp.warnings.len(),
        "Stabilization complete"
    );

    Ok(StabilizationReport { analysis, warp })
}
