//! Stabilo Motion Model
//!
//! Defines the data contracts shared by every stage of the stabilizer:
//! - **Frames:** Read-only pixel buffers and the source/sink seams
//! - **Motion:** Inter-frame motion estimates and the failure signal
//! - **Trajectory:** Channel-major absolute pose sequences
//! - **Affine:** 2x3 transforms consumed by any warp implementation
//! - **Config:** Typed configuration for the stabilizer and its collaborators
//! - **Log / Report:** JSON formats for precomputed motion and corrections

pub mod affine;
pub mod config;
pub mod error;
pub mod frame;
pub mod log;
pub mod motion;
pub mod report;
pub mod trajectory;

pub use affine::*;
pub use config::*;
pub use error::*;
pub use frame::*;
pub use log::*;
pub use motion::*;
pub use report::*;
pub use trajectory::*;
