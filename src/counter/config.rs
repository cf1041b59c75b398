//! Counter configuration and profiles
//!
//! The whole threshold set lives in one value so a profile swap replaces
//! every constant at once. Validation happens before a session exists.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scoring::ScoringPolicy;
use crate::physics::{Smoothing, DEFAULT_AVERAGE_WINDOW};
use crate::pose::SideHysteresis;

/// Default refresh cadence for elapsed/pace display
pub const DEFAULT_METRICS_REFRESH_MS: f64 = 500.0;

/// Which state machine drives the count
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CounterProfile {
    /// Two phases (`up`/`down`), EMA-smoothed elbow angle gated by body alignment
    #[default]
    AlignedEma,
    /// Five phases with transition states, elbow angle plus shoulder-hip depth
    FivePhase,
}

/// How joints are turned into angle signals
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SideStrategy {
    /// Use the side with the higher summed confidence
    MostVisible {
        #[serde(default)]
        hysteresis: Option<SideHysteresis>,
    },
    /// Require both sides and average them
    Bilateral,
}

impl Default for SideStrategy {
    fn default() -> Self {
        SideStrategy::MostVisible { hysteresis: None }
    }
}

/// Numeric thresholds. Angles in degrees, times in milliseconds.
///
/// The aligned profile reads `up_angle`, `down_angle`, `alignment_min` and
/// `debounce_ms` (minimum gap between counted reps). The five-phase profile
/// reads `up_angle`, `down_angle`, `depth`, `debounce_ms` (minimum time since
/// the last phase transition) and `min_bottom_dwell_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Bend angle above which the joint counts as extended
    pub up_angle: f32,
    /// Bend angle below which the joint counts as fully flexed
    pub down_angle: f32,
    /// Shoulder-hip-ankle angle required for good form
    pub alignment_min: f32,
    /// Normalized shoulder-hip vertical offset separating top from bottom
    pub depth: f32,
    pub debounce_ms: f64,
    pub min_bottom_dwell_ms: f64,
}

impl Thresholds {
    pub fn aligned_ema() -> Self {
        Self {
            up_angle: 155.0,
            down_angle: 95.0,
            alignment_min: 150.0,
            depth: 0.15,
            debounce_ms: 450.0,
            min_bottom_dwell_ms: 0.0,
        }
    }

    pub fn five_phase() -> Self {
        Self {
            up_angle: 160.0,
            down_angle: 90.0,
            alignment_min: 150.0,
            depth: 0.15,
            debounce_ms: 300.0,
            min_bottom_dwell_ms: 200.0,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::aligned_ema()
    }
}

/// Complete counter configuration
///
/// Deserializing fills every field the input leaves out from the named
/// profile's defaults (the aligned profile when no profile is given), so
/// `{"profile": "fivePhase"}` yields `CounterConfig::five_phase()`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "PartialConfig", rename_all = "camelCase")]
pub struct CounterConfig {
    pub profile: CounterProfile,
    pub thresholds: Thresholds,
    pub smoothing: Smoothing,
    pub side: SideStrategy,
    pub scoring: ScoringPolicy,
    /// Joints below this confidence are treated as missing
    pub min_confidence: f32,
    pub metrics_refresh_ms: f64,
}

impl CounterConfig {
    /// EMA-smoothed, alignment-gated two-phase counter
    pub fn aligned_ema() -> Self {
        Self {
            profile: CounterProfile::AlignedEma,
            thresholds: Thresholds::aligned_ema(),
            smoothing: Smoothing::default(),
            side: SideStrategy::default(),
            scoring: ScoringPolicy::DepthAndAlignment,
            min_confidence: 0.5,
            metrics_refresh_ms: DEFAULT_METRICS_REFRESH_MS,
        }
    }

    /// Five-phase angle + depth counter
    pub fn five_phase() -> Self {
        Self {
            profile: CounterProfile::FivePhase,
            thresholds: Thresholds::five_phase(),
            smoothing: Smoothing::MovingAverage {
                window: DEFAULT_AVERAGE_WINDOW,
            },
            side: SideStrategy::Bilateral,
            scoring: ScoringPolicy::Extension,
            min_confidence: 0.3,
            metrics_refresh_ms: DEFAULT_METRICS_REFRESH_MS,
        }
    }

    /// Profile defaults for `profile`
    pub fn for_profile(profile: CounterProfile) -> Self {
        match profile {
            CounterProfile::AlignedEma => Self::aligned_ema(),
            CounterProfile::FivePhase => Self::five_phase(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;

        for (name, value) in [
            ("upAngle", t.up_angle),
            ("downAngle", t.down_angle),
            ("alignmentMin", t.alignment_min),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name });
            }
            if value <= 0.0 || value > 180.0 {
                return Err(ConfigError::AngleOutOfRange { name, value });
            }
        }
        if t.down_angle >= t.up_angle {
            return Err(ConfigError::ThresholdOrder {
                down: t.down_angle,
                up: t.up_angle,
            });
        }

        if !t.depth.is_finite() {
            return Err(ConfigError::NonFinite { name: "depth" });
        }
        if t.depth <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "depth",
                value: f64::from(t.depth),
            });
        }

        for (name, value) in [
            ("debounceMs", t.debounce_ms),
            ("minBottomDwellMs", t.min_bottom_dwell_ms),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name });
            }
            if value < 0.0 {
                return Err(ConfigError::NegativeDuration { name, value });
            }
        }

        match self.smoothing {
            Smoothing::Ema { alpha } if !(alpha > 0.0 && alpha <= 1.0) => {
                return Err(ConfigError::InvalidAlpha(alpha));
            }
            Smoothing::MovingAverage { window: 0 } => return Err(ConfigError::EmptyWindow),
            _ => {}
        }

        if let SideStrategy::MostVisible {
            hysteresis: Some(rule),
        } = self.side
        {
            if rule.frames == 0 || !rule.margin.is_finite() || rule.margin < 0.0 {
                return Err(ConfigError::InvalidHysteresis {
                    margin: rule.margin,
                    frames: rule.frames,
                });
            }
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::ConfidenceOutOfRange(self.min_confidence));
        }

        if !self.metrics_refresh_ms.is_finite() || self.metrics_refresh_ms <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "metricsRefreshMs",
                value: self.metrics_refresh_ms,
            });
        }

        Ok(())
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self::aligned_ema()
    }
}

// ============================================================================
// PARTIAL INPUT
// ============================================================================

/// Threshold overrides; absent fields keep the profile's value
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PartialThresholds {
    up_angle: Option<f32>,
    down_angle: Option<f32>,
    alignment_min: Option<f32>,
    depth: Option<f32>,
    debounce_ms: Option<f64>,
    min_bottom_dwell_ms: Option<f64>,
}

impl PartialThresholds {
    fn apply(self, base: Thresholds) -> Thresholds {
        Thresholds {
            up_angle: self.up_angle.unwrap_or(base.up_angle),
            down_angle: self.down_angle.unwrap_or(base.down_angle),
            alignment_min: self.alignment_min.unwrap_or(base.alignment_min),
            depth: self.depth.unwrap_or(base.depth),
            debounce_ms: self.debounce_ms.unwrap_or(base.debounce_ms),
            min_bottom_dwell_ms: self.min_bottom_dwell_ms.unwrap_or(base.min_bottom_dwell_ms),
        }
    }
}

/// Wire form of `CounterConfig`: every field optional
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PartialConfig {
    profile: Option<CounterProfile>,
    thresholds: Option<PartialThresholds>,
    smoothing: Option<Smoothing>,
    side: Option<SideStrategy>,
    scoring: Option<ScoringPolicy>,
    min_confidence: Option<f32>,
    metrics_refresh_ms: Option<f64>,
}

impl From<PartialConfig> for CounterConfig {
    fn from(partial: PartialConfig) -> Self {
        let base = CounterConfig::for_profile(partial.profile.unwrap_or_default());
        CounterConfig {
            profile: base.profile,
            thresholds: partial
                .thresholds
                .map_or(base.thresholds, |overrides| overrides.apply(base.thresholds)),
            smoothing: partial.smoothing.unwrap_or(base.smoothing),
            side: partial.side.unwrap_or(base.side),
            scoring: partial.scoring.unwrap_or(base.scoring),
            min_confidence: partial.min_confidence.unwrap_or(base.min_confidence),
            metrics_refresh_ms: partial.metrics_refresh_ms.unwrap_or(base.metrics_refresh_ms),
        }
    }
}

/// Configuration rejected at session construction
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("down threshold {down}° must be below up threshold {up}°")]
    ThresholdOrder { down: f32, up: f32 },
    #[error("{name} must be within (0, 180] degrees, got {value}")]
    AngleOutOfRange { name: &'static str, value: f32 },
    #[error("{name} must be a finite number")]
    NonFinite { name: &'static str },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{name} must not be negative, got {value}")]
    NegativeDuration { name: &'static str, value: f64 },
    #[error("EMA alpha must be within (0, 1], got {0}")]
    InvalidAlpha(f32),
    #[error("moving-average window must hold at least one sample")]
    EmptyWindow,
    #[error("minimum confidence must be within [0, 1], got {0}")]
    ConfidenceOutOfRange(f32),
    #[error("side hysteresis needs a non-negative margin and at least one frame (margin {margin}, frames {frames})")]
    InvalidHysteresis { margin: f32, frames: u32 },
}
