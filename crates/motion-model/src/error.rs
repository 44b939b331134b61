//! Errors raised while constructing or parsing model types.

/// Validation and parse failures for model data.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid frame: {message}")]
    InvalidFrame { message: String },

    #[error("Invalid trajectory: {message}")]
    InvalidTrajectory { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Motion log line {line}: {message}")]
    MotionLog { line: usize, message: String },
}

impl ModelError {
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame {
            message: msg.into(),
        }
    }

    pub fn invalid_trajectory(msg: impl Into<String>) -> Self {
        Self::InvalidTrajectory {
            message: msg.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: msg.into(),
        }
    }
}
