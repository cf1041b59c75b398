//! Side selection - pick the body side the camera sees best
//!
//! Push-ups are filmed side-on, so one arm/torso chain is usually occluded.
//! Each side's landmark chain is scored by summed confidence and the better
//! side drives the angle signals.

use serde::{Deserialize, Serialize};

use super::joints::{JointName, PoseFrame};

/// Body side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Side chosen when both sides score the same
pub const DEFAULT_SIDE: Side = Side::Left;

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// Landmark chain used for this side
    pub fn chain(self) -> SideChain {
        match self {
            Side::Left => SideChain {
                shoulder: JointName::LeftShoulder,
                elbow: JointName::LeftElbow,
                wrist: JointName::LeftWrist,
                hip: JointName::LeftHip,
                ankle: JointName::LeftAnkle,
            },
            Side::Right => SideChain {
                shoulder: JointName::RightShoulder,
                elbow: JointName::RightElbow,
                wrist: JointName::RightWrist,
                hip: JointName::RightHip,
                ankle: JointName::RightAnkle,
            },
        }
    }
}

/// Shoulder, elbow, wrist, hip and ankle of one side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SideChain {
    pub shoulder: JointName,
    pub elbow: JointName,
    pub wrist: JointName,
    pub hip: JointName,
    pub ankle: JointName,
}

impl SideChain {
    pub fn joints(&self) -> [JointName; 5] {
        [self.shoulder, self.elbow, self.wrist, self.hip, self.ankle]
    }
}

/// Summed confidence of a side's chain; missing joints count as 0
pub fn side_confidence(frame: &PoseFrame, side: Side) -> f32 {
    side.chain()
        .joints()
        .iter()
        .map(|joint| frame.confidence(*joint))
        .sum()
}

/// Stateless per-frame choice: higher summed confidence wins, ties go to
/// [`DEFAULT_SIDE`]
pub fn select_side(frame: &PoseFrame) -> Side {
    let left = side_confidence(frame, Side::Left);
    let right = side_confidence(frame, Side::Right);

    if right > left {
        Side::Right
    } else if left > right {
        Side::Left
    } else {
        DEFAULT_SIDE
    }
}

/// Switching rule for [`SideTracker`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideHysteresis {
    /// Summed-confidence lead the other side needs to count as winning
    pub margin: f32,
    /// Consecutive winning frames before the tracked side switches
    pub frames: u32,
}

impl Default for SideHysteresis {
    fn default() -> Self {
        Self {
            margin: 0.25,
            frames: 3,
        }
    }
}

/// Side selection across frames, optionally with hysteresis
#[derive(Clone, Debug)]
pub struct SideTracker {
    hysteresis: Option<SideHysteresis>,
    current: Option<Side>,
    /// Consecutive frames the other side has led by more than the margin
    challenger_streak: u32,
}

impl SideTracker {
    pub fn new(hysteresis: Option<SideHysteresis>) -> Self {
        Self {
            hysteresis,
            current: None,
            challenger_streak: 0,
        }
    }

    /// Pick the side for this frame
    pub fn update(&mut self, frame: &PoseFrame) -> Side {
        let (Some(rule), Some(current)) = (self.hysteresis, self.current) else {
            let side = select_side(frame);
            self.current = Some(side);
            return side;
        };

        let challenger = current.opposite();
        let lead = side_confidence(frame, challenger) - side_confidence(frame, current);

        if lead > rule.margin {
            self.challenger_streak += 1;
            if self.challenger_streak >= rule.frames {
                log::debug!("side switched {} -> {}", current.as_str(), challenger.as_str());
                self.current = Some(challenger);
                self.challenger_streak = 0;
                return challenger;
            }
        } else {
            self.challenger_streak = 0;
        }
        current
    }

    /// Side chosen on the last update
    pub fn current(&self) -> Option<Side> {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.challenger_streak = 0;
    }
}

impl Default for SideTracker {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Joint;

    fn frame_with(left: f32, right: f32) -> PoseFrame {
        let mut frame = PoseFrame::empty(0.0);
        for joint in Side::Left.chain().joints() {
            frame.set(joint, Joint::new(0.5, 0.5, left));
        }
        for joint in Side::Right.chain().joints() {
            frame.set(joint, Joint::new(0.5, 0.5, right));
        }
        frame
    }

    #[test]
    fn test_higher_confidence_wins() {
        assert_eq!(select_side(&frame_with(0.9, 0.2)), Side::Left);
        assert_eq!(select_side(&frame_with(0.2, 0.9)), Side::Right);
    }

    #[test]
    fn test_tie_goes_to_default_side() {
        assert_eq!(select_side(&frame_with(0.6, 0.6)), DEFAULT_SIDE);
        assert_eq!(select_side(&PoseFrame::empty(0.0)), DEFAULT_SIDE);
    }

    #[test]
    fn test_missing_joints_count_as_zero() {
        let frame = PoseFrame::empty(0.0)
            .with_joint(JointName::RightShoulder, Joint::new(0.5, 0.5, 0.4));
        assert!((side_confidence(&frame, Side::Right) - 0.4).abs() < 1e-6);
        assert_eq!(select_side(&frame), Side::Right);
    }

    #[test]
    fn test_tracker_without_hysteresis_follows_every_frame() {
        let mut tracker = SideTracker::new(None);
        assert_eq!(tracker.update(&frame_with(0.9, 0.1)), Side::Left);
        assert_eq!(tracker.update(&frame_with(0.1, 0.9)), Side::Right);
        assert_eq!(tracker.update(&frame_with(0.9, 0.1)), Side::Left);
    }

    #[test]
    fn test_tracker_hysteresis_requires_streak() {
        let mut tracker = SideTracker::new(Some(SideHysteresis { margin: 0.5, frames: 3 }));
        assert_eq!(tracker.update(&frame_with(0.9, 0.5)), Side::Left);

        // Right leads by 5 * 0.2 = 1.0 > 0.5, but only twice in a row
        assert_eq!(tracker.update(&frame_with(0.6, 0.8)), Side::Left);
        assert_eq!(tracker.update(&frame_with(0.6, 0.8)), Side::Left);
        // Streak broken
        assert_eq!(tracker.update(&frame_with(0.8, 0.8)), Side::Left);

        assert_eq!(tracker.update(&frame_with(0.6, 0.8)), Side::Left);
        assert_eq!(tracker.update(&frame_with(0.6, 0.8)), Side::Left);
        assert_eq!(tracker.update(&frame_with(0.6, 0.8)), Side::Right);
        assert_eq!(tracker.current(), Some(Side::Right));
    }

    #[test]
    fn test_tracker_hysteresis_ignores_small_lead() {
        let mut tracker = SideTracker::new(Some(SideHysteresis { margin: 1.0, frames: 1 }));
        tracker.update(&frame_with(0.5, 0.4));
        for _ in 0..10 {
            // Lead of 5 * 0.1 = 0.5 never exceeds the margin
            assert_eq!(tracker.update(&frame_with(0.5, 0.6)), Side::Left);
        }
    }

    #[test]
    fn test_tracker_reset_reselects() {
        let mut tracker = SideTracker::new(Some(SideHysteresis::default()));
        tracker.update(&frame_with(0.9, 0.1));
        tracker.reset();
        assert_eq!(tracker.current(), None);
        assert_eq!(tracker.update(&frame_with(0.1, 0.9)), Side::Right);
    }
}
