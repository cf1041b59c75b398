//! Per-repetition form scoring
//!
//! Scoring is a swappable policy. Neither policy claims to be a principled
//! biomechanical assessment; both map what the counter already measures
//! onto 0-100.

use serde::{Deserialize, Serialize};

use super::config::Thresholds;

/// Bend this far below the down threshold earns full depth credit
pub const FULL_DEPTH_MARGIN_DEG: f32 = 20.0;

/// Body alignment earning full alignment credit
pub const STRAIGHT_REFERENCE_DEG: f32 = 170.0;

/// How a counted repetition is scored
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoringPolicy {
    /// `min(100, raw bend at the top * 0.5)`
    Extension,
    /// Half depth reached, half worst body alignment during the rep
    #[default]
    DepthAndAlignment,
}

/// What was measured over one repetition
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepSample {
    /// Unsmoothed bend angle on the frame that completed the rep
    pub top_bend: f32,
    /// Smallest smoothed bend angle since the previous rep
    pub deepest_bend: f32,
    /// Smallest smoothed alignment angle since the previous rep
    pub worst_alignment: Option<f32>,
}

impl ScoringPolicy {
    /// Score in [0, 100]
    pub fn score(self, sample: &RepSample, thresholds: &Thresholds) -> f32 {
        let score = match self {
            ScoringPolicy::Extension => sample.top_bend * 0.5,
            ScoringPolicy::DepthAndAlignment => {
                let full_depth = thresholds.down_angle - FULL_DEPTH_MARGIN_DEG;
                let travel = (thresholds.up_angle - full_depth).max(f32::EPSILON);
                let depth = ((thresholds.up_angle - sample.deepest_bend) / travel).clamp(0.0, 1.0);

                match sample.worst_alignment {
                    Some(alignment) => {
                        let span = (STRAIGHT_REFERENCE_DEG - thresholds.alignment_min).max(f32::EPSILON);
                        let straight = ((alignment - thresholds.alignment_min) / span).clamp(0.0, 1.0);
                        50.0 * depth + 50.0 * straight
                    }
                    None => 100.0 * depth,
                }
            }
        };
        score.clamp(0.0, 100.0)
    }
}

/// Running extremes between two counted repetitions
#[derive(Clone, Debug, Default)]
pub struct RepTracker {
    deepest_bend: Option<f32>,
    worst_alignment: Option<f32>,
}

impl RepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, bend: f32, alignment: Option<f32>) {
        self.deepest_bend = Some(self.deepest_bend.map_or(bend, |d| d.min(bend)));
        if let Some(a) = alignment {
            self.worst_alignment = Some(self.worst_alignment.map_or(a, |w| w.min(a)));
        }
    }

    /// Close the current repetition and start tracking the next one
    pub fn finish(&mut self, top_bend: f32) -> RepSample {
        let sample = RepSample {
            top_bend,
            deepest_bend: self.deepest_bend.unwrap_or(top_bend),
            worst_alignment: self.worst_alignment,
        };
        *self = Self::default();
        sample
    }
}
