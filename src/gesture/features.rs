//! Per-frame geometry features for one hand.
//!
//! A finger counts as raised when its tip is above its base joint in image
//! space (smaller y) and as down otherwise.  Distances are measured in the
//! image plane only; depth is ignored.

use super::landmarks::{HandLandmark, HandObservation, Point2};

/// Boolean pose predicates and fingertip distances for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandFeatures {
    pub index_raised: bool,
    pub middle_raised: bool,
    pub middle_down: bool,
    pub ring_down: bool,
    pub pinky_down: bool,
    pub thumb_up: bool,
    pub thumb_down: bool,
    /// Thumb tip to index tip.
    pub thumb_index_distance: f32,
    /// Index tip to middle tip.
    pub index_middle_distance: f32,
    pub index_tip: Point2,
    pub middle_tip: Point2,
}

impl HandFeatures {
    /// Compute all features from one observation.
    pub fn extract(hand: &HandObservation) -> Self {
        let y = |l: HandLandmark| hand.landmark(l).y;

        let thumb_tip = hand.landmark(HandLandmark::ThumbTip).xy();
        let index_tip = hand.landmark(HandLandmark::IndexTip).xy();
        let middle_tip = hand.landmark(HandLandmark::MiddleTip).xy();

        Self {
            index_raised: y(HandLandmark::IndexTip) < y(HandLandmark::INDEX_BASE),
            middle_raised: y(HandLandmark::MiddleTip) < y(HandLandmark::MIDDLE_BASE),
            middle_down: y(HandLandmark::MiddleTip) >= y(HandLandmark::MIDDLE_BASE),
            ring_down: y(HandLandmark::RingTip) >= y(HandLandmark::RING_BASE),
            pinky_down: y(HandLandmark::PinkyTip) >= y(HandLandmark::PINKY_BASE),
            thumb_up: y(HandLandmark::ThumbTip) < y(HandLandmark::THUMB_BASE),
            thumb_down: y(HandLandmark::ThumbTip) >= y(HandLandmark::THUMB_BASE),
            thumb_index_distance: thumb_tip.distance(&index_tip),
            index_middle_distance: index_tip.distance(&middle_tip),
            index_tip,
            middle_tip,
        }
    }
}
