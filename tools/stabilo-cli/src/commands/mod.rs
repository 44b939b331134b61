pub mod config;
pub mod correct;
pub mod validate;

use std::path::Path;

use stabilo_common::error::StabiloError;
use stabilo_motion_model::log::parse_motion_log;
use stabilo_motion_model::motion::{MotionEstimate, MotionSample};

/// Read and parse a motion log file.
pub(crate) fn load_motion_log(path: &Path) -> anyhow::Result<Vec<MotionSample<MotionEstimate>>> {
    if !path.exists() {
        return Err(StabiloError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read motion log {}: {e}", path.display()))?;
    parse_motion_log(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse motion log {}: {e}", path.display()))
}

#[cfg(test)]
pub(crate) fn write_temp_log(name: &str, content: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("stabilo-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
