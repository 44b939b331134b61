//! Compute per-frame corrections from a motion log.

use std::path::PathBuf;

use stabilo_motion_model::config::SmoothingConfig;
use stabilo_processing_core::pipeline::analyze_samples;

use super::load_motion_log;

pub fn run(log: PathBuf, radius: i64, output: Option<PathBuf>) -> anyhow::Result<()> {
    let samples = load_motion_log(&log)?;
    tracing::info!(path = %log.display(), pairs = samples.len(), "Loaded motion log");

    let analysis = analyze_samples(samples, &SmoothingConfig { radius })
        .map_err(|e| anyhow::anyhow!("Trajectory analysis failed: {e}"))?;
    let report = analysis
        .to_report()
        .map_err(|e| anyhow::anyhow!("Failed to build correction report: {e}"))?;

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
            eprintln!(
                "Wrote corrections for {} frames (radius {}) to {}",
                report.frame_count,
                report.radius,
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
