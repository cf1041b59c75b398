//! Movement phase vocabulary
//!
//! Each profile reports a closed subset of these phases.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::CounterProfile;

/// Current stage of the movement cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Joint extended (aligned profile)
    Up,
    /// Joint flexed past the down threshold
    Down,
    /// Required joints missing or low confidence (aligned profile)
    NoPose,
    /// Joint extended with shallow depth (five-phase profile)
    Top,
    /// Leaving the top, not yet at the bottom
    TransitionDown,
    /// Bottom reached with the latch armed, heading back up
    TransitionUp,
    /// No usable pose yet, or pose lost (five-phase profile)
    Unknown,
}

const ALIGNED_PHASES: [Phase; 3] = [Phase::Up, Phase::Down, Phase::NoPose];

const FIVE_PHASES: [Phase; 5] = [
    Phase::Top,
    Phase::Down,
    Phase::TransitionDown,
    Phase::TransitionUp,
    Phase::Unknown,
];

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Up => "up",
            Phase::Down => "down",
            Phase::NoPose => "no_pose",
            Phase::Top => "top",
            Phase::TransitionDown => "transition_down",
            Phase::TransitionUp => "transition_up",
            Phase::Unknown => "unknown",
        }
    }

    /// False for the "pose not detected" phases
    pub fn has_pose(self) -> bool {
        !matches!(self, Phase::NoPose | Phase::Unknown)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CounterProfile {
    /// Every phase this profile can report
    pub fn phases(self) -> &'static [Phase] {
        match self {
            CounterProfile::AlignedEma => &ALIGNED_PHASES,
            CounterProfile::FivePhase => &FIVE_PHASES,
        }
    }

    /// Phase of a fresh or reset session
    pub fn initial_phase(self) -> Phase {
        match self {
            CounterProfile::AlignedEma => Phase::Up,
            CounterProfile::FivePhase => Phase::Unknown,
        }
    }

    /// Phase reported when the pose is not usable
    pub fn no_pose_phase(self) -> Phase {
        match self {
            CounterProfile::AlignedEma => Phase::NoPose,
            CounterProfile::FivePhase => Phase::Unknown,
        }
    }
}
