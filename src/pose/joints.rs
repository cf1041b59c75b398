//! Joint vocabulary and per-frame pose observations
//!
//! Receives keypoints from the external pose estimator (MoveNet,
//! MediaPipe Pose, or a named keypoint list) and normalizes them onto one
//! fixed 17-joint vocabulary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// JOINT VOCABULARY (COCO / MoveNet order)
// ============================================================================

/// Anatomical joint names understood by the counter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// Number of joints in the vocabulary
pub const JOINT_COUNT: usize = 17;

/// Values per joint in a MoveNet flat array: x, y, score
pub const MOVENET_STRIDE: usize = 3;

/// MediaPipe Pose landmark count
pub const MEDIAPIPE_LANDMARKS: usize = 33;

/// Values per landmark in a MediaPipe flat array: x, y, z, visibility
pub const MEDIAPIPE_STRIDE: usize = 4;

/// MediaPipe landmark index for each vocabulary joint, in vocabulary order
const MEDIAPIPE_INDICES: [usize; JOINT_COUNT] = [
    0, // nose
    2, 5, // eyes
    7, 8, // ears
    11, 12, // shoulders
    13, 14, // elbows
    15, 16, // wrists
    23, 24, // hips
    25, 26, // knees
    27, 28, // ankles
];

impl JointName {
    /// All joints in vocabulary order
    pub const ALL: [JointName; JOINT_COUNT] = [
        JointName::Nose,
        JointName::LeftEye,
        JointName::RightEye,
        JointName::LeftEar,
        JointName::RightEar,
        JointName::LeftShoulder,
        JointName::RightShoulder,
        JointName::LeftElbow,
        JointName::RightElbow,
        JointName::LeftWrist,
        JointName::RightWrist,
        JointName::LeftHip,
        JointName::RightHip,
        JointName::LeftKnee,
        JointName::RightKnee,
        JointName::LeftAnkle,
        JointName::RightAnkle,
    ];

    /// Position in the vocabulary (and in a MoveNet keypoint array)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JointName::Nose => "nose",
            JointName::LeftEye => "left_eye",
            JointName::RightEye => "right_eye",
            JointName::LeftEar => "left_ear",
            JointName::RightEar => "right_ear",
            JointName::LeftShoulder => "left_shoulder",
            JointName::RightShoulder => "right_shoulder",
            JointName::LeftElbow => "left_elbow",
            JointName::RightElbow => "right_elbow",
            JointName::LeftWrist => "left_wrist",
            JointName::RightWrist => "right_wrist",
            JointName::LeftHip => "left_hip",
            JointName::RightHip => "right_hip",
            JointName::LeftKnee => "left_knee",
            JointName::RightKnee => "right_knee",
            JointName::LeftAnkle => "left_ankle",
            JointName::RightAnkle => "right_ankle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        JointName::ALL.into_iter().find(|joint| joint.as_str() == name)
    }
}

// ============================================================================
// OBSERVATIONS
// ============================================================================

/// A single detected joint (normalized image coordinates)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Joint {
    pub x: f32,
    pub y: f32,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
}

impl Joint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Finite position and confidence at or above `min_confidence`
    pub fn is_usable(&self, min_confidence: f32) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.confidence.is_finite()
            && self.confidence >= min_confidence
    }
}

/// Named keypoint as delivered by a pose-detection JS API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    /// Missing score means the estimator did not report one
    #[serde(default)]
    pub score: Option<f32>,
}

/// Rejected estimator input
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("invalid {layout} keypoint data length: {actual} (expected {expected})")]
    LengthMismatch {
        layout: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// All joints observed in one video frame
#[derive(Clone, Debug, PartialEq)]
pub struct PoseFrame {
    joints: [Option<Joint>; JOINT_COUNT],
    /// Monotonic frame time in milliseconds
    pub timestamp_ms: f64,
}

impl PoseFrame {
    /// Frame with no joints detected
    pub fn empty(timestamp_ms: f64) -> Self {
        Self {
            joints: [None; JOINT_COUNT],
            timestamp_ms,
        }
    }

    /// Builder-style joint insertion
    pub fn with_joint(mut self, name: JointName, joint: Joint) -> Self {
        self.set(name, joint);
        self
    }

    pub fn set(&mut self, name: JointName, joint: Joint) {
        self.joints[name.index()] = Some(joint);
    }

    pub fn get(&self, name: JointName) -> Option<&Joint> {
        self.joints[name.index()].as_ref()
    }

    /// Joint if present and usable at the given confidence
    pub fn available(&self, name: JointName, min_confidence: f32) -> Option<Joint> {
        self.get(name)
            .copied()
            .filter(|joint| joint.is_usable(min_confidence))
    }

    /// Confidence of a joint, 0 when absent
    pub fn confidence(&self, name: JointName) -> f32 {
        self.get(name)
            .map(|joint| joint.confidence)
            .filter(|c| c.is_finite())
            .unwrap_or(0.0)
    }

    /// Number of joints present in the frame
    pub fn len(&self) -> usize {
        self.joints.iter().filter(|j| j.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a MoveNet-style flat array: 17 × [x, y, score]
    pub fn from_movenet(data: &[f32], timestamp_ms: f64) -> Result<Self, InputError> {
        let expected = JOINT_COUNT * MOVENET_STRIDE;
        if data.len() != expected {
            return Err(InputError::LengthMismatch {
                layout: "movenet",
                expected,
                actual: data.len(),
            });
        }

        let mut frame = Self::empty(timestamp_ms);
        for (name, chunk) in JointName::ALL.iter().zip(data.chunks_exact(MOVENET_STRIDE)) {
            frame.set(*name, Joint::new(chunk[0], chunk[1], chunk[2]));
        }
        Ok(frame)
    }

    /// Decode a MediaPipe-style flat array: 33 × [x, y, z, visibility]
    ///
    /// Landmarks outside the shared vocabulary (hands, feet, mouth) are ignored.
    pub fn from_mediapipe(data: &[f32], timestamp_ms: f64) -> Result<Self, InputError> {
        let expected = MEDIAPIPE_LANDMARKS * MEDIAPIPE_STRIDE;
        if data.len() != expected {
            return Err(InputError::LengthMismatch {
                layout: "mediapipe",
                expected,
                actual: data.len(),
            });
        }

        let mut frame = Self::empty(timestamp_ms);
        for (name, &landmark) in JointName::ALL.iter().zip(MEDIAPIPE_INDICES.iter()) {
            let base = landmark * MEDIAPIPE_STRIDE;
            frame.set(*name, Joint::new(data[base], data[base + 1], data[base + 3]));
        }
        Ok(frame)
    }

    /// Build from named keypoints; unknown names are skipped
    pub fn from_keypoints(keypoints: &[Keypoint], timestamp_ms: f64) -> Self {
        let mut frame = Self::empty(timestamp_ms);
        for kp in keypoints {
            if let Some(name) = JointName::from_name(&kp.name) {
                frame.set(name, Joint::new(kp.x, kp.y, kp.score.unwrap_or(1.0)));
            }
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_round_trips_names() {
        for (i, joint) in JointName::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(JointName::from_name(joint.as_str()), Some(*joint));
        }
        assert_eq!(JointName::from_name("left_pinky"), None);
    }

    #[test]
    fn test_movenet_layout() {
        let mut data = vec![0.0; JOINT_COUNT * MOVENET_STRIDE];
        let i = JointName::RightElbow.index() * MOVENET_STRIDE;
        data[i..i + 3].copy_from_slice(&[0.4, 0.6, 0.9]);

        let frame = PoseFrame::from_movenet(&data, 12.0).unwrap();
        assert_eq!(frame.timestamp_ms, 12.0);
        assert_eq!(
            frame.get(JointName::RightElbow),
            Some(&Joint::new(0.4, 0.6, 0.9))
        );
        assert_eq!(frame.len(), JOINT_COUNT);
    }

    #[test]
    fn test_mediapipe_layout_uses_visibility() {
        let mut data = vec![0.0; MEDIAPIPE_LANDMARKS * MEDIAPIPE_STRIDE];
        // Landmark 27 = left ankle
        let i = 27 * MEDIAPIPE_STRIDE;
        data[i..i + 4].copy_from_slice(&[0.2, 0.8, -0.1, 0.75]);

        let frame = PoseFrame::from_mediapipe(&data, 0.0).unwrap();
        assert_eq!(
            frame.get(JointName::LeftAnkle),
            Some(&Joint::new(0.2, 0.8, 0.75))
        );
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = PoseFrame::from_movenet(&[0.0; 10], 0.0).unwrap_err();
        assert_eq!(
            err,
            InputError::LengthMismatch {
                layout: "movenet",
                expected: 51,
                actual: 10
            }
        );
        assert!(PoseFrame::from_mediapipe(&[0.0; 99], 0.0).is_err());
    }

    #[test]
    fn test_keypoints_skip_unknown_and_default_score() {
        let keypoints = vec![
            Keypoint { name: "left_hip".into(), x: 0.5, y: 0.5, score: None },
            Keypoint { name: "tail".into(), x: 0.1, y: 0.1, score: Some(0.9) },
        ];
        let frame = PoseFrame::from_keypoints(&keypoints, 0.0);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.confidence(JointName::LeftHip), 1.0);
    }

    #[test]
    fn test_availability_threshold() {
        let frame = PoseFrame::empty(0.0)
            .with_joint(JointName::Nose, Joint::new(0.5, 0.1, 0.3))
            .with_joint(JointName::LeftEye, Joint::new(f32::NAN, 0.1, 0.9));

        assert!(frame.available(JointName::Nose, 0.3).is_some());
        assert!(frame.available(JointName::Nose, 0.5).is_none());
        assert!(frame.available(JointName::LeftEye, 0.0).is_none());
        assert!(frame.available(JointName::RightEye, 0.0).is_none());
        assert_eq!(frame.confidence(JointName::RightEye), 0.0);
    }
}
