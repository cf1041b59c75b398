//! Counter module - repetition state machine, scoring and metrics
//!
//! Re-exports only. All logic in submodules.

mod config;
mod machine;
mod metrics;
mod phase;
mod scoring;
mod session;
mod signals;

pub use config::{
    ConfigError, CounterConfig, CounterProfile, SideStrategy, Thresholds,
    DEFAULT_METRICS_REFRESH_MS,
};
pub use machine::{AlignedMachine, BottomLatch, FivePhaseMachine, MachineInput, RepStateMachine};
pub use metrics::{Metrics, MetricsAggregator};
pub use phase::Phase;
pub use scoring::{RepSample, RepTracker, ScoringPolicy, FULL_DEPTH_MARGIN_DEG, STRAIGHT_REFERENCE_DEG};
pub use session::{CounterSession, SessionError, Snapshot};
