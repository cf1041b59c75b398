//! Derived performance metrics
//!
//! Pace, elapsed time, mean form score and last repetition duration,
//! recomputed on every counted repetition and on a coarse refresh cadence
//! for elapsed-time display.

use serde::{Deserialize, Serialize};

/// Display-ready metrics
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Repetitions per minute, one decimal
    pub pace: f32,
    /// Whole seconds since the first valid observation
    pub elapsed: u32,
    /// Mean per-rep form score, 0-100
    pub quality_score: u32,
    /// Milliseconds between the two most recent repetitions
    pub last_rep_duration: u64,
}

/// Session timing and per-rep history
#[derive(Clone, Debug)]
pub struct MetricsAggregator {
    refresh_interval_ms: f64,
    session_start: Option<f64>,
    last_rep_at: Option<f64>,
    /// Gaps between consecutive counted reps
    rep_durations: Vec<f64>,
    quality_scores: Vec<f32>,
    last_refresh_at: Option<f64>,
    current: Metrics,
}

impl MetricsAggregator {
    pub fn new(refresh_interval_ms: f64) -> Self {
        Self {
            refresh_interval_ms,
            session_start: None,
            last_rep_at: None,
            rep_durations: Vec::new(),
            quality_scores: Vec::new(),
            last_refresh_at: None,
            current: Metrics::default(),
        }
    }

    /// Mark the first valid observation; later calls are ignored
    pub fn begin(&mut self, now_ms: f64) {
        if self.session_start.is_none() {
            self.session_start = Some(now_ms);
        }
    }

    /// Record a counted repetition and recompute immediately
    pub fn record_rep(&mut self, now_ms: f64, score: f32, repetitions: u32) {
        if let Some(prev) = self.last_rep_at {
            self.rep_durations.push(now_ms - prev);
        }
        self.last_rep_at = Some(now_ms);
        self.quality_scores.push(score);
        self.recompute(now_ms, repetitions);
    }

    /// Recompute if the refresh interval has passed
    pub fn tick(&mut self, now_ms: f64, repetitions: u32) {
        let due = self
            .last_refresh_at
            .map_or(true, |last| now_ms - last >= self.refresh_interval_ms);
        if due {
            self.recompute(now_ms, repetitions);
        }
    }

    pub fn recompute(&mut self, now_ms: f64, repetitions: u32) {
        let elapsed_secs = self
            .session_start
            .map_or(0.0, |start| ((now_ms - start) / 1000.0).max(0.0));

        let pace = if elapsed_secs > 0.0 {
            (f64::from(repetitions) / elapsed_secs * 60.0 * 10.0).round() / 10.0
        } else {
            0.0
        };

        let quality = if self.quality_scores.is_empty() {
            0.0
        } else {
            self.quality_scores.iter().sum::<f32>() / self.quality_scores.len() as f32
        };

        self.current = Metrics {
            pace: pace as f32,
            elapsed: elapsed_secs.round() as u32,
            quality_score: quality.round().clamp(0.0, 100.0) as u32,
            last_rep_duration: self
                .rep_durations
                .last()
                .map_or(0, |gap| gap.max(0.0).round() as u64),
        };
        self.last_refresh_at = Some(now_ms);
    }

    /// Metrics as of the last recompute
    pub fn current(&self) -> Metrics {
        self.current
    }

    pub fn rep_durations(&self) -> &[f64] {
        &self.rep_durations
    }

    pub fn quality_scores(&self) -> &[f32] {
        &self.quality_scores
    }
}
