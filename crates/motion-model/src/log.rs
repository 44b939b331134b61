//! Motion log: precomputed per-pair estimates in JSONL.
//!
//! One JSON object per line; blank lines and lines starting with `#` are
//! skipped. A measured pair is `{"pair":0,"dx":1.2,"dy":-0.4,"da":0.001}`,
//! a failed pair is `{"pair":1,"failed":{"kind":"degenerate_fit"}}`, or
//! `{"pair":1,"failed":"too few matches"}` when the writer only has a
//! free-form reason. Lines may appear in any order, but pair indices must
//! cover `0..n` exactly once.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::motion::{EstimationFailure, MotionEstimate, MotionSample};

/// A single motion log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MotionLogEntry {
    Failed { pair: usize, failed: LoggedFailure },
    Measured { pair: usize, dx: f64, dy: f64, da: f64 },
}

/// Why a logged pair failed: a structured failure, or a bare reason that
/// is read back as a backend failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoggedFailure {
    Kind(EstimationFailure),
    Reason(String),
}

impl From<LoggedFailure> for EstimationFailure {
    fn from(failure: LoggedFailure) -> Self {
        match failure {
            LoggedFailure::Kind(kind) => kind,
            LoggedFailure::Reason(reason) => EstimationFailure::backend(reason),
        }
    }
}

impl MotionLogEntry {
    pub fn pair(&self) -> usize {
        match self {
            MotionLogEntry::Failed { pair, .. } | MotionLogEntry::Measured { pair, .. } => *pair,
        }
    }

    fn into_sample(self) -> MotionSample<MotionEstimate> {
        match self {
            MotionLogEntry::Failed { failed, .. } => {
                MotionSample::synthetic(failed.into())
            }
            MotionLogEntry::Measured { dx, dy, da, .. } => {
                MotionSample::measured(MotionEstimate::new(dx, dy, da))
            }
        }
    }

    fn from_sample(pair: usize, sample: &MotionSample<MotionEstimate>) -> Self {
        match &sample.failure {
            Some(failure) => MotionLogEntry::Failed {
                pair,
                failed: LoggedFailure::Kind(failure.clone()),
            },
            None => MotionLogEntry::Measured {
                pair,
                dx: sample.estimate.dx,
                dy: sample.estimate.dy,
                da: sample.estimate.dangle,
            },
        }
    }
}

/// Parse a motion log into samples ordered by pair index.
pub fn parse_motion_log(jsonl: &str) -> Result<Vec<MotionSample<MotionEstimate>>, ModelError> {
    let mut entries = jsonl
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            serde_json::from_str::<MotionLogEntry>(line)
                .map(|entry| (line_no, entry))
                .map_err(|e| ModelError::MotionLog {
                    line: line_no,
                    message: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    entries.sort_by_key(|(_, entry)| entry.pair());

    for (expected, (line_no, entry)) in entries.iter().enumerate() {
        if entry.pair() != expected {
            let message = if entry.pair() < expected {
                format!("duplicate entry for pair {}", entry.pair())
            } else {
                format!("missing entry for pair {expected}")
            };
            return Err(ModelError::MotionLog {
                line: *line_no,
                message,
            });
        }
    }

    Ok(entries
        .into_iter()
        .map(|(_, entry)| entry.into_sample())
        .collect())
}

/// Serialize samples to motion log JSONL, pair `i` being `samples[i]`.
pub fn serialize_motion_log(
    samples: &[MotionSample<MotionEstimate>],
) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for (pair, sample) in samples.iter().enumerate() {
        output.push_str(&serde_json::to_string(&MotionLogEntry::from_sample(
            pair, sample,
        ))?);
        output.push('\n');
    }
    Ok(output)
}
