//! Pose module - joint vocabulary, frame decoding and side selection
//!
//! Re-exports only. All logic in submodules.

mod joints;
mod side;

pub use joints::{
    InputError, Joint, JointName, Keypoint, PoseFrame, JOINT_COUNT, MEDIAPIPE_LANDMARKS,
    MEDIAPIPE_STRIDE, MOVENET_STRIDE,
};
pub use side::{
    select_side, side_confidence, Side, SideChain, SideHysteresis, SideTracker, DEFAULT_SIDE,
};
