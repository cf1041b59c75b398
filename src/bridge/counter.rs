//! Counter JS class
//!
//! Wraps one `CounterSession`. JavaScript owns the object, so there is no
//! module-level session state: two `RepCounter`s count independently.

use wasm_bindgen::prelude::*;

use crate::counter::{
    ConfigError, CounterConfig, CounterProfile, CounterSession, SessionError, Snapshot,
};
use crate::pose::{InputError, Keypoint, PoseFrame};

impl From<ConfigError> for JsValue {
    fn from(err: ConfigError) -> Self {
        JsValue::from_str(&format!("Invalid counter configuration: {err}"))
    }
}

impl From<SessionError> for JsValue {
    fn from(err: SessionError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<InputError> for JsValue {
    fn from(err: InputError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Monotonic browser clock in milliseconds
fn performance_now() -> Option<f64> {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
}

fn frame_time(timestamp_ms: Option<f64>) -> Result<f64, JsValue> {
    timestamp_ms
        .or_else(performance_now)
        .ok_or_else(|| JsValue::from_str("No timestamp given and no performance clock available"))
}

fn phase_names(profile: CounterProfile) -> Vec<String> {
    profile
        .phases()
        .iter()
        .map(|phase| phase.as_str().to_string())
        .collect()
}

fn to_js(snapshot: &Snapshot) -> JsValue {
    serde_wasm_bindgen::to_value(snapshot).unwrap_or(JsValue::NULL)
}

/// Push-up repetition counter
#[wasm_bindgen]
pub struct RepCounter {
    session: CounterSession,
}

#[wasm_bindgen]
impl RepCounter {
    /// Create a counter. `config` is an optional partial `CounterConfig`
    /// object; missing fields take the values of its `profile` (aligned
    /// EMA when absent).
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<RepCounter, JsValue> {
        let config: CounterConfig = if config.is_undefined() || config.is_null() {
            CounterConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        Self::with_config(config)
    }

    /// Counter with the five-phase angle + depth profile
    #[wasm_bindgen(js_name = fivePhase)]
    pub fn five_phase() -> Result<RepCounter, JsValue> {
        Self::with_config(CounterConfig::for_profile(CounterProfile::FivePhase))
    }

    /// Begin accepting frames
    pub fn start(&mut self) {
        self.session.start();
    }

    /// Stop accepting frames; the count is kept
    pub fn stop(&mut self) {
        self.session.stop();
    }

    /// Clear the count, phase and all history
    pub fn reset(&mut self) {
        self.session.reset();
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    #[wasm_bindgen(getter, js_name = repetitionCount)]
    pub fn repetition_count(&self) -> u32 {
        self.session.repetition_count()
    }

    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        self.session.phase().as_str().to_string()
    }

    /// Every phase name this counter's profile can report
    #[wasm_bindgen(getter)]
    pub fn phases(&self) -> Vec<String> {
        phase_names(self.session.config().profile)
    }

    /// Process a MoveNet frame: flat Float32Array of 51 values
    /// (17 keypoints × x, y, score)
    #[wasm_bindgen(js_name = processMoveNet)]
    pub fn process_movenet(&mut self, data: &[f32], timestamp_ms: Option<f64>) -> Result<JsValue, JsValue> {
        let frame = PoseFrame::from_movenet(data, frame_time(timestamp_ms)?).map_err(|err| {
            log::warn!("{err}");
            err
        })?;
        self.process(&frame)
    }

    /// Process a MediaPipe Pose frame: flat Float32Array of 132 values
    /// (33 landmarks × x, y, z, visibility)
    #[wasm_bindgen(js_name = processMediaPipe)]
    pub fn process_mediapipe(&mut self, data: &[f32], timestamp_ms: Option<f64>) -> Result<JsValue, JsValue> {
        let frame = PoseFrame::from_mediapipe(data, frame_time(timestamp_ms)?).map_err(|err| {
            log::warn!("{err}");
            err
        })?;
        self.process(&frame)
    }

    /// Process one pose observation: named keypoints
    /// `[{ name, x, y, score? }, ...]`
    #[wasm_bindgen(js_name = processFrame)]
    pub fn process_frame(&mut self, keypoints: JsValue, timestamp_ms: Option<f64>) -> Result<JsValue, JsValue> {
        let keypoints: Vec<Keypoint> = serde_wasm_bindgen::from_value(keypoints)?;
        let frame = PoseFrame::from_keypoints(&keypoints, frame_time(timestamp_ms)?);
        self.process(&frame)
    }

    /// Recompute elapsed time and pace, e.g. from a display timer
    pub fn refresh(&mut self, now_ms: Option<f64>) -> Result<JsValue, JsValue> {
        self.session.refresh(frame_time(now_ms)?);
        Ok(self.snapshot())
    }

    /// Current counter state as a plain JS object
    pub fn snapshot(&self) -> JsValue {
        to_js(&self.session.snapshot())
    }
}

impl RepCounter {
    fn with_config(config: CounterConfig) -> Result<RepCounter, JsValue> {
        let session = CounterSession::new(config)?;
        log::info!("Rep counter ready ({:?} profile)", session.config().profile);
        Ok(RepCounter { session })
    }

    fn process(&mut self, frame: &PoseFrame) -> Result<JsValue, JsValue> {
        let snapshot = self.session.process_frame(frame)?;
        Ok(to_js(&snapshot))
    }
}
