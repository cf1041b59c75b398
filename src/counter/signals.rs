//! Raw signal extraction from a pose frame
//!
//! Turns joints into the bend angle, body-alignment angle and shoulder-hip
//! depth the state machine consumes. Returns `None` when a required joint
//! is missing or below the confidence threshold.

use super::config::SideStrategy;
use crate::physics::angle_at;
use crate::pose::{Joint, PoseFrame, Side, SideTracker};

/// Unsmoothed per-frame signals
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawSignals {
    /// Elbow bend in degrees
    pub bend: f32,
    /// Shoulder-hip-ankle angle in degrees, `None` if ankles are not visible
    pub alignment: Option<f32>,
    /// |shoulder y - hip y| in normalized image units
    pub depth: f32,
    /// Side used, `None` when both sides were averaged
    pub side: Option<Side>,
}

/// Usable joints of one side's chain
struct Chain {
    shoulder: Joint,
    elbow: Joint,
    wrist: Joint,
    hip: Joint,
    ankle: Option<Joint>,
}

impl Chain {
    fn read(frame: &PoseFrame, side: Side, min_confidence: f32) -> Option<Self> {
        let names = side.chain();
        Some(Self {
            shoulder: frame.available(names.shoulder, min_confidence)?,
            elbow: frame.available(names.elbow, min_confidence)?,
            wrist: frame.available(names.wrist, min_confidence)?,
            hip: frame.available(names.hip, min_confidence)?,
            ankle: frame.available(names.ankle, min_confidence),
        })
    }

    fn bend(&self) -> f32 {
        angle_at(
            self.shoulder.position(),
            self.elbow.position(),
            self.wrist.position(),
        )
    }

    fn alignment(&self) -> Option<f32> {
        self.ankle.map(|ankle| {
            angle_at(
                self.shoulder.position(),
                self.hip.position(),
                ankle.position(),
            )
        })
    }
}

/// Extract this frame's signals under the given side strategy
pub fn extract(
    frame: &PoseFrame,
    strategy: &SideStrategy,
    tracker: &mut SideTracker,
    min_confidence: f32,
) -> Option<RawSignals> {
    match strategy {
        SideStrategy::MostVisible { .. } => {
            let side = tracker.update(frame);
            let chain = Chain::read(frame, side, min_confidence)?;
            // The whole chain, ankle included, must be visible
            let alignment = chain.alignment()?;

            Some(RawSignals {
                bend: chain.bend(),
                alignment: Some(alignment),
                depth: (chain.shoulder.y - chain.hip.y).abs(),
                side: Some(side),
            })
        }
        SideStrategy::Bilateral => {
            let left = Chain::read(frame, Side::Left, min_confidence)?;
            let right = Chain::read(frame, Side::Right, min_confidence)?;

            let shoulder_y = (left.shoulder.y + right.shoulder.y) / 2.0;
            let hip_y = (left.hip.y + right.hip.y) / 2.0;
            let alignment = match (left.alignment(), right.alignment()) {
                (Some(l), Some(r)) => Some((l + r) / 2.0),
                (l, r) => l.or(r),
            };

            Some(RawSignals {
                bend: (left.bend() + right.bend()) / 2.0,
                alignment,
                depth: (shoulder_y - hip_y).abs(),
                side: None,
            })
        }
    }
}
