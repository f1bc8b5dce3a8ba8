//! Static pose classification for the first hand.
//!
//! Three independent checks, applied in order as label overrides:
//! 1. two-finger motion candidate (handed to the stability tracker)
//! 2. cursor pose: thumb up, index raised, middle/ring/pinky down
//! 3. click: cursor pose with thumb and index tips pinched together
//!
//! Click is a refinement of cursor and always wins when both hold.  All
//! distance checks are strict.

use super::features::HandFeatures;
use crate::config::GestureConfig;

/// Pointer-driving poses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerGesture {
    Cursor,
    Click,
}

impl PointerGesture {
    /// Label shown for this pose.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::Click => "click",
        }
    }
}

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Index and middle raised together, ring and pinky down.
    pub motion_candidate: bool,
    pub pointer: Option<PointerGesture>,
}

/// Classifies hand features using the configured distance thresholds.
#[derive(Debug, Clone, Copy)]
pub struct GestureClassifier {
    pinch_distance_threshold: f32,
    two_finger_proximity_threshold: f32,
}

impl GestureClassifier {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            pinch_distance_threshold: config.pinch_distance_threshold,
            two_finger_proximity_threshold: config.two_finger_proximity_threshold,
        }
    }

    pub fn classify(&self, f: &HandFeatures) -> Classification {
        let motion_candidate = self.is_motion_candidate(f);

        let mut pointer = None;
        if is_cursor_pose(f) {
            pointer = Some(PointerGesture::Cursor);
        }
        if pointer.is_some() && f.thumb_index_distance < self.pinch_distance_threshold {
            pointer = Some(PointerGesture::Click);
        }

        Classification {
            motion_candidate,
            pointer,
        }
    }

    fn is_motion_candidate(&self, f: &HandFeatures) -> bool {
        f.index_raised
            && f.middle_raised
            && f.index_middle_distance < self.two_finger_proximity_threshold
            && f.ring_down
            && f.pinky_down
    }
}

fn is_cursor_pose(f: &HandFeatures) -> bool {
    f.thumb_up && f.index_raised && f.middle_down && f.ring_down && f.pinky_down
}
