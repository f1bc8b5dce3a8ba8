//! Gesture recognition from per-frame hand landmarks.
//!
//! Provides:
//! - `landmarks`: the 21-point hand model and detector result types
//! - `features`: pure finger-pose predicates and fingertip distances
//! - `classifier`: cursor / click / two-finger candidate precedence
//! - `stability`: session state turning two-finger motion into scroll deltas

pub mod classifier;
pub mod features;
pub mod landmarks;
pub mod stability;

pub use classifier::{Classification, GestureClassifier, PointerGesture};
pub use features::HandFeatures;
pub use landmarks::{
    Category, DetectorResult, HandLandmark, HandObservation, Landmark, Point2, LANDMARK_COUNT,
};
pub use stability::{GestureState, ScrollAxis, ScrollMotion, StabilityTracker, TrackingPhase};

// ── Test helpers ───────────────────────────────────────────

/// A hand with every landmark at the image center: no finger raised,
/// ring and pinky (and middle) count as down.
#[cfg(test)]
pub(crate) fn make_hand() -> HandObservation {
    HandObservation {
        landmarks: [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT],
        handedness: Category::new("Right", 0.96),
        gesture: Category::new("None", 0.71),
    }
}

#[cfg(test)]
pub(crate) fn set_landmark(hand: &mut HandObservation, landmark: HandLandmark, x: f32, y: f32) {
    hand.landmarks[landmark.index()] = Landmark::new(x, y, 0.0);
}

/// Thumb up, index raised at `index_tip`, middle/ring/pinky down.
/// The thumb tip sits at `thumb_tip`.
#[cfg(test)]
pub(crate) fn cursor_hand(index_tip: (f32, f32), thumb_tip: (f32, f32)) -> HandObservation {
    let mut hand = make_hand();
    set_landmark(&mut hand, HandLandmark::IndexTip, index_tip.0, index_tip.1);
    set_landmark(
        &mut hand,
        HandLandmark::INDEX_BASE,
        index_tip.0,
        index_tip.1 + 0.2,
    );
    set_landmark(&mut hand, HandLandmark::ThumbTip, thumb_tip.0, thumb_tip.1);
    set_landmark(
        &mut hand,
        HandLandmark::THUMB_BASE,
        thumb_tip.0,
        thumb_tip.1 + 0.2,
    );
    // middle tip == middle base: down
    set_landmark(&mut hand, HandLandmark::MiddleTip, 0.55, 0.5);
    set_landmark(&mut hand, HandLandmark::MIDDLE_BASE, 0.55, 0.5);
    set_landmark(&mut hand, HandLandmark::RingTip, 0.6, 0.6);
    set_landmark(&mut hand, HandLandmark::RING_BASE, 0.6, 0.5);
    set_landmark(&mut hand, HandLandmark::PinkyTip, 0.65, 0.6);
    set_landmark(&mut hand, HandLandmark::PINKY_BASE, 0.65, 0.5);
    hand
}

/// Index and middle raised at the given tips, ring and pinky down.
#[cfg(test)]
pub(crate) fn two_finger_hand(index_tip: (f32, f32), middle_tip: (f32, f32)) -> HandObservation {
    let mut hand = make_hand();
    set_landmark(&mut hand, HandLandmark::IndexTip, index_tip.0, index_tip.1);
    set_landmark(
        &mut hand,
        HandLandmark::INDEX_BASE,
        index_tip.0,
        index_tip.1 + 0.2,
    );
    set_landmark(
        &mut hand,
        HandLandmark::MiddleTip,
        middle_tip.0,
        middle_tip.1,
    );
    set_landmark(
        &mut hand,
        HandLandmark::MIDDLE_BASE,
        middle_tip.0,
        middle_tip.1 + 0.2,
    );
    set_landmark(&mut hand, HandLandmark::RingTip, 0.6, 0.7);
    set_landmark(&mut hand, HandLandmark::RING_BASE, 0.6, 0.6);
    set_landmark(&mut hand, HandLandmark::PinkyTip, 0.65, 0.7);
    set_landmark(&mut hand, HandLandmark::PINKY_BASE, 0.65, 0.6);
    hand
}
