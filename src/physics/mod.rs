//! Physics module - joint angle geometry and signal smoothing
//!
//! Re-exports only. All logic in submodules.

mod angles;
mod smoothing;

pub use angles::{angle_at, normalize_to_180};
pub use smoothing::{SignalSmoother, Smoothing, DEFAULT_AVERAGE_WINDOW, DEFAULT_EMA_ALPHA};
