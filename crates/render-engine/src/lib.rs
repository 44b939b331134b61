//! Stabilo Render Engine
//!
//! Applies per-frame corrections to the original frames and resolves the
//! borders the corrections expose.
//!
//! # Pipeline Architecture
//!
//! ```text
//! frames ──┬── Motion Estimator (per pair, parallel)
//!          │          │
//!          │          ▼
//!          │   Build → Smooth → Correct      (processing-core)
//!          │                       │
//!          │                       ▼
//!          │              Border plan (pad / crop)
//!          │                       │
//!          └───────────────────────┤
//!                                  ▼
//!                       Warp (per frame, parallel)
//!                                  │
//!                                  ▼
//!                              FrameSink
//! ```

pub mod border;
pub mod stabilize;
pub mod warp;

pub use border::{plan_border, BorderPlan};
pub use stabilize::*;
pub use warp::{warp_affine, WarpOutput};
