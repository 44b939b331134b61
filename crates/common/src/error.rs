//! Error types shared across Stabilo crates.

use std::path::PathBuf;

/// Top-level error type for Stabilo operations.
///
/// Only [`StabiloError::Input`] aborts a stabilization run. The other
/// domain variants exist for callers that drive a single stage directly.
#[derive(Debug, thiserror::Error)]
pub enum StabiloError {
    #[error("Input error: {message}")]
    Input { message: String },

    #[error("Smoothing error: {message}")]
    Smoothing { message: String },

    #[error("Warp error: {message}")]
    Warp { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using StabiloError.
pub type StabiloResult<T> = Result<T, StabiloError>;

impl StabiloError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    pub fn smoothing(msg: impl Into<String>) -> Self {
        Self::Smoothing {
            message: msg.into(),
        }
    }

    pub fn warp(msg: impl Into<String>) -> Self {
        Self::Warp {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error must abort a whole pipeline run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Input { .. } | Self::FileNotFound { .. } | Self::Io(_) | Self::Json(_)
        )
    }
}
