//! Rep Counter - real-time push-up repetition counting
//!
//! Consumes per-frame joint positions from an external pose estimator and
//! tracks repetition count, movement phase, pace, elapsed time and form
//! score. Entry point for the WASM module; only contains:
//! - Module declarations
//! - wasm_bindgen entry points that delegate to submodules

mod bridge;
pub mod counter;
pub mod physics;
pub mod pose;

use wasm_bindgen::prelude::*;

pub use bridge::RepCounter;
pub use counter::{
    ConfigError, CounterConfig, CounterProfile, CounterSession, Phase, SessionError, Snapshot,
};
pub use pose::{Joint, JointName, PoseFrame, Side};

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

/// Called automatically when WASM module loads
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Route `log` output to the browser console.
///
/// @param {string} level - "trace", "debug", "info", "warn" or "error"
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => log::Level::Trace,
        "debug" => log::Level::Debug,
        "warn" => log::Level::Warn,
        "error" => log::Level::Error,
        _ => log::Level::Info,
    };

    wasm_logger::init(wasm_logger::Config::new(log_level));
    log::info!("✅ Rep counter logging at {level}");
}
