//! Validate a motion log.

use std::path::PathBuf;

use stabilo_common::error::StabiloError;
use stabilo_processing_core::smoother::resolve_radius;

use super::load_motion_log;

pub fn run(log: PathBuf, radius: i64) -> anyhow::Result<()> {
    println!("Validating motion log: {}", log.display());

    let samples = load_motion_log(&log)?;
    let frames = samples.len() + 1;
    let synthetic: Vec<usize> = samples
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_synthetic())
        .map(|(pair, _)| pair)
        .collect();

    println!("  Pairs: {}", samples.len());
    println!("  Frames: {frames}");

    if samples.is_empty() {
        return Err(StabiloError::input(
            "motion log has no pairs, at least 2 frames are needed to stabilize",
        )
        .into());
    }

    let resolved = resolve_radius(radius, frames);
    if resolved.was_clamped() {
        println!(
            "  Radius: {} (requested {radius}, clamped for {frames} frames)",
            resolved.effective
        );
    } else {
        println!("  Radius: {}", resolved.effective);
    }

    if synthetic.is_empty() {
        println!("  Failed pairs: none");
        println!("\nMotion log is valid.");
    } else {
        println!("\nFailed pairs (zero motion will be used):");
        for pair in &synthetic {
            if let Some(failure) = &samples[*pair].failure {
                println!("  - pair {pair}: {failure}");
            }
        }
        println!(
            "\n{} of {} pair(s) failed. Corrections around them will be flatter.",
            synthetic.len(),
            samples.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::write_temp_log;

    #[test]
    fn test_empty_log_is_rejected() {
        let path = write_temp_log("empty.jsonl", "# no pairs recorded\n");
        let err = run(path, 5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StabiloError>(),
            Some(StabiloError::Input { .. })
        ));
    }

    #[test]
    fn test_log_with_failures_is_accepted() {
        let path = write_temp_log(
            "failures.jsonl",
            "{\"pair\":0,\"dx\":1.0,\"dy\":0.0,\"da\":0.0}\n{\"pair\":1,\"failed\":{\"kind\":\"degenerate_fit\"}}\n",
        );
        assert!(run(path, 100).is_ok());
    }
}
