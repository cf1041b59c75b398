//! Repetition state machines
//!
//! Both variants share one shape: a bottom latch armed by a deep enough
//! position, hysteresis between the up and down thresholds, and a timing
//! guard against counting the same repetition twice.

use super::config::{CounterConfig, CounterProfile, Thresholds};
use super::phase::Phase;

/// Smoothed per-frame input
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MachineInput {
    pub bend: f32,
    pub alignment: Option<f32>,
    pub depth: f32,
    pub timestamp_ms: f64,
}

/// Gate armed at the bottom of a repetition
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BottomLatch {
    armed_at: Option<f64>,
}

impl BottomLatch {
    /// Arm the latch; an already armed latch keeps its first timestamp
    pub fn arm(&mut self, now_ms: f64) {
        if self.armed_at.is_none() {
            self.armed_at = Some(now_ms);
        }
    }

    pub fn clear(&mut self) {
        self.armed_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    pub fn armed_at(&self) -> Option<f64> {
        self.armed_at
    }
}

// ============================================================================
// ALIGNED EMA (two-phase)
// ============================================================================

/// Two-phase counter gated by body alignment
#[derive(Clone, Debug)]
pub struct AlignedMachine {
    thresholds: Thresholds,
    /// `Up` or `Down`
    stage: Phase,
    latch: BottomLatch,
    last_rep_at: Option<f64>,
    pose_lost: bool,
}

impl AlignedMachine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            stage: Phase::Up,
            latch: BottomLatch::default(),
            last_rep_at: None,
            pose_lost: false,
        }
    }

    /// Returns true when this frame completed a repetition
    pub fn step(&mut self, input: &MachineInput) -> bool {
        let t = &self.thresholds;
        let now = input.timestamp_ms;
        let good_form = input.alignment.is_some_and(|a| a >= t.alignment_min);
        self.pose_lost = false;

        if input.bend < t.down_angle && good_form {
            self.latch.arm(now);
            self.stage = Phase::Down;
        }

        let mut counted = false;
        if self.latch.is_armed() && input.bend > t.up_angle && good_form {
            let rested = self
                .last_rep_at
                .map_or(true, |last| now - last > t.debounce_ms);
            if rested {
                self.last_rep_at = Some(now);
                self.latch.clear();
                counted = true;
            }
            self.stage = Phase::Up;
        }
        counted
    }

    /// Required joints not visible this frame; counter and latch untouched
    pub fn lose_pose(&mut self) {
        self.pose_lost = true;
    }

    pub fn phase(&self) -> Phase {
        if self.pose_lost {
            Phase::NoPose
        } else {
            self.stage
        }
    }

    pub fn latch(&self) -> &BottomLatch {
        &self.latch
    }
}

// ============================================================================
// FIVE-PHASE (angle + depth)
// ============================================================================

/// Five-phase counter with explicit transition states
#[derive(Clone, Debug)]
pub struct FivePhaseMachine {
    thresholds: Thresholds,
    state: Phase,
    latch: BottomLatch,
    last_transition_at: Option<f64>,
}

impl FivePhaseMachine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            state: Phase::Unknown,
            latch: BottomLatch::default(),
            last_transition_at: None,
        }
    }

    /// Returns true when this frame completed a repetition
    pub fn step(&mut self, input: &MachineInput) -> bool {
        let t = &self.thresholds;
        let now = input.timestamp_ms;
        let at_top = input.bend > t.up_angle && input.depth < t.depth;
        let at_bottom = input.bend < t.down_angle && input.depth > t.depth;

        let mut counted = false;
        if at_top {
            let settled = self
                .last_transition_at
                .map_or(true, |last| now - last > t.debounce_ms);
            if self.state == Phase::TransitionUp && settled {
                counted = self
                    .latch
                    .armed_at()
                    .is_some_and(|armed| now - armed > t.min_bottom_dwell_ms);
                self.latch.clear();
            }
            self.state = Phase::Top;
            self.last_transition_at = Some(now);
        } else if at_bottom {
            // Coming down from the top, or still holding an armed bottom
            let descending = matches!(self.state, Phase::Top | Phase::TransitionDown);
            if descending || self.latch.is_armed() {
                self.latch.arm(now);
                self.state = Phase::TransitionUp;
            } else {
                self.state = Phase::Down;
            }
            self.last_transition_at = Some(now);
        } else if self.state == Phase::Top && input.bend < t.up_angle {
            self.state = Phase::TransitionDown;
        }
        counted
    }

    /// Pose lost: report unknown, keep counter and latch
    pub fn lose_pose(&mut self) {
        self.state = Phase::Unknown;
    }

    pub fn phase(&self) -> Phase {
        self.state
    }

    pub fn latch(&self) -> &BottomLatch {
        &self.latch
    }
}

// ============================================================================
// PROFILE DISPATCH
// ============================================================================

/// State machine selected by the configured profile
#[derive(Clone, Debug)]
pub enum RepStateMachine {
    AlignedEma(AlignedMachine),
    FivePhase(FivePhaseMachine),
}

impl RepStateMachine {
    pub fn new(config: &CounterConfig) -> Self {
        match config.profile {
            CounterProfile::AlignedEma => Self::AlignedEma(AlignedMachine::new(config.thresholds)),
            CounterProfile::FivePhase => Self::FivePhase(FivePhaseMachine::new(config.thresholds)),
        }
    }

    pub fn step(&mut self, input: &MachineInput) -> bool {
        match self {
            Self::AlignedEma(m) => m.step(input),
            Self::FivePhase(m) => m.step(input),
        }
    }

    pub fn lose_pose(&mut self) {
        match self {
            Self::AlignedEma(m) => m.lose_pose(),
            Self::FivePhase(m) => m.lose_pose(),
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::AlignedEma(m) => m.phase(),
            Self::FivePhase(m) => m.phase(),
        }
    }

    pub fn is_bottom_armed(&self) -> bool {
        match self {
            Self::AlignedEma(m) => m.latch().is_armed(),
            Self::FivePhase(m) => m.latch().is_armed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aligned(bend: f32, alignment: f32, t: f64) -> MachineInput {
        MachineInput { bend, alignment: Some(alignment), depth: 0.0, timestamp_ms: t }
    }

    fn five(bend: f32, depth: f32, t: f64) -> MachineInput {
        MachineInput { bend, alignment: None, depth, timestamp_ms: t }
    }

    #[test]
    fn test_latch_keeps_first_timestamp() {
        let mut latch = BottomLatch::default();
        latch.arm(300.0);
        latch.arm(600.0);
        assert_eq!(latch.armed_at(), Some(300.0));
        latch.clear();
        assert!(!latch.is_armed());
    }

    #[test]
    fn test_aligned_counts_full_rep() {
        let mut m = AlignedMachine::new(Thresholds::aligned_ema());
        assert_eq!(m.phase(), Phase::Up);
        assert!(!m.step(&aligned(170.0, 175.0, 0.0)));
        assert!(!m.step(&aligned(90.0, 170.0, 400.0)));
        assert_eq!(m.phase(), Phase::Down);
        assert!(m.latch().is_armed());
        assert!(m.step(&aligned(160.0, 172.0, 900.0)));
        assert_eq!(m.phase(), Phase::Up);
        assert!(!m.latch().is_armed());
    }

    #[test]
    fn test_aligned_requires_bottom() {
        let mut m = AlignedMachine::new(Thresholds::aligned_ema());
        for (i, bend) in [170.0, 120.0, 100.0, 120.0, 170.0].into_iter().enumerate() {
            assert!(!m.step(&aligned(bend, 175.0, i as f64 * 200.0)));
        }
        assert_eq!(m.phase(), Phase::Up);
    }

    #[test]
    fn test_aligned_bad_form_blocks_latch_and_count() {
        let mut m = AlignedMachine::new(Thresholds::aligned_ema());
        // Hips sagging: alignment below 150
        m.step(&aligned(80.0, 130.0, 0.0));
        assert!(!m.latch().is_armed());

        m.step(&aligned(80.0, 170.0, 100.0));
        assert!(!m.step(&aligned(170.0, 130.0, 600.0)));
        assert!(m.latch().is_armed());
        assert!(m.step(&aligned(170.0, 170.0, 700.0)));
    }

    #[test]
    fn test_aligned_min_gap_between_reps() {
        let mut m = AlignedMachine::new(Thresholds::aligned_ema());
        m.step(&aligned(80.0, 170.0, 0.0));
        assert!(m.step(&aligned(170.0, 170.0, 500.0)));

        // Second full cycle inside 450 ms of the first count
        m.step(&aligned(80.0, 170.0, 700.0));
        assert!(!m.step(&aligned(170.0, 170.0, 900.0)));
        assert_eq!(m.phase(), Phase::Up);
        // Latch stays armed, so the next extension past the gap counts
        assert!(m.step(&aligned(170.0, 170.0, 1000.0)));
    }

    #[test]
    fn test_aligned_lose_pose_keeps_latch() {
        let mut m = AlignedMachine::new(Thresholds::aligned_ema());
        m.step(&aligned(80.0, 170.0, 0.0));
        m.lose_pose();
        assert_eq!(m.phase(), Phase::NoPose);
        assert!(m.latch().is_armed());
        assert!(m.step(&aligned(170.0, 170.0, 600.0)));
    }

    #[test]
    fn test_five_phase_transitions() {
        let mut m = FivePhaseMachine::new(Thresholds::five_phase());
        assert_eq!(m.phase(), Phase::Unknown);
        m.step(&five(170.0, 0.05, 0.0));
        assert_eq!(m.phase(), Phase::Top);
        m.step(&five(150.0, 0.1, 100.0));
        assert_eq!(m.phase(), Phase::TransitionDown);
        m.step(&five(85.0, 0.2, 200.0));
        assert_eq!(m.phase(), Phase::TransitionUp);
    }

    #[test]
    fn test_five_phase_counts_after_dwell() {
        let mut m = FivePhaseMachine::new(Thresholds::five_phase());
        assert!(!m.step(&five(170.0, 0.05, 0.0)));
        assert!(!m.step(&five(85.0, 0.2, 300.0)));
        assert!(!m.step(&five(85.0, 0.2, 600.0)));
        assert_eq!(m.phase(), Phase::TransitionUp);
        assert!(m.step(&five(170.0, 0.05, 1000.0)));
        assert_eq!(m.phase(), Phase::Top);
        assert!(!m.latch().is_armed());
    }

    #[test]
    fn test_five_phase_bottom_from_unknown_is_down() {
        let mut m = FivePhaseMachine::new(Thresholds::five_phase());
        m.step(&five(85.0, 0.2, 0.0));
        assert_eq!(m.phase(), Phase::Down);
        assert!(!m.latch().is_armed());
        assert!(!m.step(&five(170.0, 0.05, 800.0)));
    }

    #[test]
    fn test_five_phase_partial_rep_not_counted() {
        let mut m = FivePhaseMachine::new(Thresholds::five_phase());
        m.step(&five(170.0, 0.05, 0.0));
        m.step(&five(120.0, 0.1, 100.0));
        m.step(&five(110.0, 0.12, 200.0));
        assert!(!m.step(&five(170.0, 0.05, 400.0)));
    }

    #[test]
    fn test_dispatch_follows_profile() {
        let m = RepStateMachine::new(&CounterConfig::five_phase());
        assert_eq!(m.phase(), Phase::Unknown);
        let mut m = RepStateMachine::new(&CounterConfig::aligned_ema());
        assert_eq!(m.phase(), Phase::Up);
        m.lose_pose();
        assert_eq!(m.phase(), Phase::NoPose);
        assert!(!m.is_bottom_armed());
    }
}
