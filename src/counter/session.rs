//! Counting session - owns every piece of mutable counter state
//!
//! One session per counting run. The caller drives it one frame at a time;
//! nothing here schedules work or blocks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::{ConfigError, CounterConfig, SideStrategy};
use super::machine::{MachineInput, RepStateMachine};
use super::metrics::{Metrics, MetricsAggregator};
use super::phase::Phase;
use super::scoring::RepTracker;
use super::signals;
use crate::physics::SignalSmoother;
use crate::pose::{PoseFrame, Side, SideTracker};

/// Caller misuse of a session
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("counting session has not been started")]
    NotStarted,
}

/// Point-in-time view of a session for the UI
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub repetition_count: u32,
    pub phase: Phase,
    pub pace: f32,
    pub elapsed: u32,
    pub quality_score: u32,
    pub last_rep_duration: u64,
    /// Smoothed signals of the last frame with a usable pose
    pub bend_angle: Option<f32>,
    pub alignment_angle: Option<f32>,
    pub depth: Option<f32>,
    pub side: Option<Side>,
}

/// Smoothed signals of one frame
#[derive(Clone, Copy, Debug, PartialEq)]
struct FrameSignals {
    bend: f32,
    alignment: Option<f32>,
    depth: f32,
    side: Option<Side>,
}

/// Everything `reset` clears, replaced as one value
#[derive(Clone, Debug)]
struct SessionState {
    repetition_count: u32,
    machine: RepStateMachine,
    side: SideTracker,
    bend: SignalSmoother,
    alignment: SignalSmoother,
    depth: SignalSmoother,
    rep: RepTracker,
    metrics: MetricsAggregator,
    last_timestamp: Option<f64>,
    last_signals: Option<FrameSignals>,
}

impl SessionState {
    fn new(config: &CounterConfig) -> Self {
        let hysteresis = match config.side {
            SideStrategy::MostVisible { hysteresis } => hysteresis,
            SideStrategy::Bilateral => None,
        };
        Self {
            repetition_count: 0,
            machine: RepStateMachine::new(config),
            side: SideTracker::new(hysteresis),
            bend: SignalSmoother::new(config.smoothing),
            alignment: SignalSmoother::new(config.smoothing),
            depth: SignalSmoother::new(config.smoothing),
            rep: RepTracker::new(),
            metrics: MetricsAggregator::new(config.metrics_refresh_ms),
            last_timestamp: None,
            last_signals: None,
        }
    }
}

/// Repetition counting session
#[derive(Clone, Debug)]
pub struct CounterSession {
    config: CounterConfig,
    running: bool,
    state: SessionState,
}

impl CounterSession {
    /// Validate `config` and build an idle session
    pub fn new(config: CounterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = SessionState::new(&config);
        Ok(Self {
            config,
            running: false,
            state,
        })
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Begin accepting frames; no-op if already running
    pub fn start(&mut self) {
        if !self.running {
            log::debug!("counting session started ({:?})", self.config.profile);
            self.running = true;
        }
    }

    /// Stop accepting frames; counts and history are kept
    pub fn stop(&mut self) {
        if self.running {
            log::debug!("counting session stopped at {} reps", self.state.repetition_count);
            self.running = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Return every counter field to its initial value
    pub fn reset(&mut self) {
        self.state = SessionState::new(&self.config);
        log::debug!("counting session reset");
    }

    pub fn repetition_count(&self) -> u32 {
        self.state.repetition_count
    }

    pub fn phase(&self) -> Phase {
        self.state.machine.phase()
    }

    /// Whether the bottom latch is currently armed
    pub fn is_bottom_armed(&self) -> bool {
        self.state.machine.is_bottom_armed()
    }

    /// Per-rep gaps in milliseconds, oldest first
    pub fn rep_durations(&self) -> &[f64] {
        self.state.metrics.rep_durations()
    }

    /// Per-rep form scores, oldest first
    pub fn quality_scores(&self) -> &[f32] {
        self.state.metrics.quality_scores()
    }

    /// Process one frame observation
    ///
    /// Frames with missing or low-confidence joints never fail: the phase
    /// reports the profile's no-pose value and counts stay untouched.
    pub fn process_frame(&mut self, frame: &PoseFrame) -> Result<Snapshot, SessionError> {
        if !self.running {
            return Err(SessionError::NotStarted);
        }

        let now = frame.timestamp_ms;
        let rewound = self.state.last_timestamp.is_some_and(|last| now < last);
        if !now.is_finite() || rewound {
            log::warn!("dropping frame with out-of-order timestamp {now}");
            return Ok(self.snapshot());
        }
        self.state.last_timestamp = Some(now);

        let state = &mut self.state;
        let Some(raw) = signals::extract(
            frame,
            &self.config.side,
            &mut state.side,
            self.config.min_confidence,
        ) else {
            if state.machine.phase().has_pose() {
                log::trace!("pose lost at {now}");
            }
            state.machine.lose_pose();
            state.last_signals = None;
            state.metrics.tick(now, state.repetition_count);
            return Ok(self.snapshot());
        };

        state.metrics.begin(now);

        let smoothed = FrameSignals {
            bend: state.bend.update(raw.bend),
            alignment: raw.alignment.map(|a| state.alignment.update(a)),
            depth: state.depth.update(raw.depth),
            side: raw.side,
        };
        state.rep.observe(smoothed.bend, smoothed.alignment);
        state.last_signals = Some(smoothed);

        let before = state.machine.phase();
        let counted = state.machine.step(&MachineInput {
            bend: smoothed.bend,
            alignment: smoothed.alignment,
            depth: smoothed.depth,
            timestamp_ms: now,
        });
        let after = state.machine.phase();
        if before != after {
            log::trace!("phase {before} -> {after} at {now}");
        }

        if counted {
            state.repetition_count += 1;
            let sample = state.rep.finish(raw.bend);
            let score = self.config.scoring.score(&sample, &self.config.thresholds);
            state.metrics.record_rep(now, score, state.repetition_count);
            log::debug!(
                "rep {} counted at {now} ms (score {score:.0})",
                state.repetition_count
            );
        } else {
            state.metrics.tick(now, state.repetition_count);
        }

        Ok(self.snapshot())
    }

    /// Recompute time-based metrics for display, e.g. from a UI timer
    pub fn refresh(&mut self, now_ms: f64) {
        if now_ms.is_finite() {
            self.state.metrics.recompute(now_ms, self.state.repetition_count);
        }
    }

    /// Metrics as of the last recompute
    pub fn metrics(&self) -> Metrics {
        self.state.metrics.current()
    }

    pub fn snapshot(&self) -> Snapshot {
        let metrics = self.state.metrics.current();
        let signals = self.state.last_signals;
        Snapshot {
            repetition_count: self.state.repetition_count,
            phase: self.state.machine.phase(),
            pace: metrics.pace,
            elapsed: metrics.elapsed,
            quality_score: metrics.quality_score,
            last_rep_duration: metrics.last_rep_duration,
            bend_angle: signals.map(|s| s.bend),
            alignment_angle: signals.and_then(|s| s.alignment),
            depth: signals.map(|s| s.depth),
            side: signals.and_then(|s| s.side),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::Thresholds;
    use crate::pose::{Joint, JointName};

    /// Side-on push-up pose on the left side with the given elbow angle
    fn pushup(elbow_deg: f32, confidence: f32, t: f64) -> PoseFrame {
        let shoulder = (0.30_f32, 0.40_f32);
        let elbow = (0.30, 0.55);
        // Rotate the forearm around the elbow so the opening is `elbow_deg`
        let heading = (-90.0_f32 + elbow_deg).to_radians();
        let wrist = (elbow.0 + 0.15 * heading.cos(), elbow.1 + 0.15 * heading.sin());

        PoseFrame::empty(t)
            .with_joint(JointName::LeftShoulder, Joint::new(shoulder.0, shoulder.1, confidence))
            .with_joint(JointName::LeftElbow, Joint::new(elbow.0, elbow.1, confidence))
            .with_joint(JointName::LeftWrist, Joint::new(wrist.0, wrist.1, confidence))
            .with_joint(JointName::LeftHip, Joint::new(0.60, 0.45, confidence))
            .with_joint(JointName::LeftAnkle, Joint::new(0.90, 0.50, confidence))
    }

    fn unsmoothed() -> CounterConfig {
        CounterConfig {
            smoothing: crate::physics::Smoothing::Ema { alpha: 1.0 },
            ..CounterConfig::aligned_ema()
        }
    }

    #[test]
    fn test_pose_helper_geometry() {
        let mut session = CounterSession::new(unsmoothed()).unwrap();
        session.start();
        let snap = session.process_frame(&pushup(90.0, 0.9, 0.0)).unwrap();
        assert!((snap.bend_angle.unwrap() - 90.0).abs() < 0.5);
        assert!(snap.alignment_angle.unwrap() > 170.0);
        assert_eq!(snap.side, Some(Side::Left));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = CounterConfig::aligned_ema();
        config.thresholds = Thresholds { down_angle: 170.0, ..Thresholds::aligned_ema() };
        assert!(CounterSession::new(config).is_err());
    }

    #[test]
    fn test_frames_rejected_before_start() {
        let mut session = CounterSession::new(CounterConfig::default()).unwrap();
        let before = session.snapshot();
        assert_eq!(
            session.process_frame(&pushup(170.0, 0.9, 0.0)),
            Err(SessionError::NotStarted)
        );
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_stop_keeps_state_and_resumes() {
        let mut session = CounterSession::new(unsmoothed()).unwrap();
        session.start();
        session.start();
        session.process_frame(&pushup(170.0, 0.9, 0.0)).unwrap();
        session.process_frame(&pushup(80.0, 0.9, 300.0)).unwrap();
        session.stop();
        assert!(!session.is_running());
        assert!(session.is_bottom_armed());

        assert!(session.process_frame(&pushup(170.0, 0.9, 600.0)).is_err());
        session.start();
        let snap = session.process_frame(&pushup(170.0, 0.9, 900.0)).unwrap();
        assert_eq!(snap.repetition_count, 1);
    }

    #[test]
    fn test_rewound_timestamp_is_dropped() {
        let mut session = CounterSession::new(unsmoothed()).unwrap();
        session.start();
        session.process_frame(&pushup(80.0, 0.9, 1_000.0)).unwrap();
        let snap = session.process_frame(&pushup(170.0, 0.9, 500.0)).unwrap();
        assert_eq!(snap.repetition_count, 0);
        assert_eq!(snap.phase, Phase::Down);
    }

    #[test]
    fn test_no_pose_leaves_counter_and_latch() {
        let mut session = CounterSession::new(unsmoothed()).unwrap();
        session.start();
        session.process_frame(&pushup(80.0, 0.9, 0.0)).unwrap();
        assert!(session.is_bottom_armed());

        let snap = session.process_frame(&pushup(170.0, 0.1, 300.0)).unwrap();
        assert_eq!(snap.phase, Phase::NoPose);
        assert_eq!(snap.bend_angle, None);
        assert!(session.is_bottom_armed());

        let snap = session.process_frame(&pushup(170.0, 0.9, 600.0)).unwrap();
        assert_eq!(snap.repetition_count, 1);
        assert_eq!(snap.phase, Phase::Up);
    }

    #[test]
    fn test_smoothing_lags_raw_signal() {
        let mut session = CounterSession::new(CounterConfig::aligned_ema()).unwrap();
        session.start();
        session.process_frame(&pushup(170.0, 0.9, 0.0)).unwrap();
        // One deep frame is not enough to pull the EMA under 95°
        let snap = session.process_frame(&pushup(80.0, 0.9, 33.0)).unwrap();
        assert!(snap.bend_angle.unwrap() > 95.0);
        assert!(!session.is_bottom_armed());
    }

    #[test]
    fn test_reset_restores_initial_snapshot() {
        let mut session = CounterSession::new(unsmoothed()).unwrap();
        let initial = session.snapshot();
        session.start();
        session.process_frame(&pushup(80.0, 0.9, 0.0)).unwrap();
        session.process_frame(&pushup(170.0, 0.9, 600.0)).unwrap();
        assert_eq!(session.repetition_count(), 1);

        session.reset();
        assert_eq!(session.snapshot(), initial);
        assert!(session.quality_scores().is_empty());
        session.reset();
        assert_eq!(session.snapshot(), initial);
        // Smoothers were cleared: the next sample is taken as-is
        let snap = session.process_frame(&pushup(120.0, 0.9, 700.0)).unwrap();
        assert!((snap.bend_angle.unwrap() - 120.0).abs() < 0.5);
    }

    #[test]
    fn test_refresh_updates_elapsed() {
        let mut session = CounterSession::new(unsmoothed()).unwrap();
        session.start();
        session.process_frame(&pushup(170.0, 0.9, 1_000.0)).unwrap();
        session.refresh(11_400.0);
        assert_eq!(session.metrics().elapsed, 10);
        assert_eq!(session.snapshot().elapsed, 10);
    }
}
