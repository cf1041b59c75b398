//! Per-stream signal smoothing
//!
//! Suppresses frame-to-frame jitter in the angle and depth signals before
//! they reach the repetition thresholds. Each stream owns one smoother.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// EMA coefficient used by the default profile
pub const DEFAULT_EMA_ALPHA: f32 = 0.35;

/// Rolling-mean window used by the five-phase profile
pub const DEFAULT_AVERAGE_WINDOW: usize = 5;

/// Smoothing method for a signal stream
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Smoothing {
    /// `alpha * raw + (1 - alpha) * previous`; alpha in (0, 1]
    Ema { alpha: f32 },
    /// Mean of the last `window` raw samples
    MovingAverage { window: usize },
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::Ema {
            alpha: DEFAULT_EMA_ALPHA,
        }
    }
}

/// Stateful smoother for one signal stream
#[derive(Clone, Debug)]
pub struct SignalSmoother {
    method: Smoothing,
    /// Last smoothed value, `None` until the first sample
    value: Option<f32>,
    /// Raw samples, only used by the moving average
    history: VecDeque<f32>,
}

impl SignalSmoother {
    pub fn new(method: Smoothing) -> Self {
        let capacity = match method {
            Smoothing::MovingAverage { window } => window,
            Smoothing::Ema { .. } => 0,
        };
        Self {
            method,
            value: None,
            history: VecDeque::with_capacity(capacity),
        }
    }

    /// Feed a raw sample, returns the smoothed value
    ///
    /// The first sample after construction or `reset` passes through as-is.
    pub fn update(&mut self, raw: f32) -> f32 {
        let smoothed = match self.method {
            Smoothing::Ema { alpha } => match self.value {
                None => raw,
                Some(prev) => alpha * raw + (1.0 - alpha) * prev,
            },
            Smoothing::MovingAverage { window } => {
                self.history.push_back(raw);
                while self.history.len() > window.max(1) {
                    self.history.pop_front();
                }
                self.history.iter().sum::<f32>() / self.history.len() as f32
            }
        };
        self.value = Some(smoothed);
        smoothed
    }

    /// Forget all state so the next sample is taken unchanged
    pub fn reset(&mut self) {
        self.value = None;
        self.history.clear();
    }
}

impl Default for SignalSmoother {
    fn default() -> Self {
        Self::new(Smoothing::default())
    }
}
