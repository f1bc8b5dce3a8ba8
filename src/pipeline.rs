//! The per-frame pipeline:
//! features → classification → stability → planned actions.
//!
//! `GesturePipeline::process` is a pure function of the previous state and
//! one detector result.  It never touches the UI; the session applies the
//! returned actions.

use tracing::trace;

use crate::config::GestureConfig;
use crate::dispatch::{Action, ActionDispatcher, GestureLabel, Viewport};
use crate::gesture::{
    DetectorResult, GestureClassifier, GestureState, HandFeatures, Point2, PointerGesture,
    ScrollAxis, ScrollMotion, StabilityTracker,
};

/// What one frame amounted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Pointer moved to the index tip (normalized).
    Cursor(Point2),
    /// Pinch click at the index tip (normalized).
    Click(Point2),
    /// Normalized horizontal movement; positive is right.
    ScrollHorizontal(f32),
    /// Normalized vertical movement; positive is down.
    ScrollVertical(f32),
    None,
}

impl GestureEvent {
    /// Display label overriding the detector's baseline, if any.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Cursor(_) => Some(PointerGesture::Cursor.as_str()),
            Self::Click(_) => Some(PointerGesture::Click.as_str()),
            Self::ScrollHorizontal(_) => Some("horizontal scroll"),
            Self::ScrollVertical(_) => Some("vertical scroll"),
            Self::None => None,
        }
    }
}

/// Result of processing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// State to carry into the next frame.
    pub state: GestureState,
    pub event: GestureEvent,
    /// Label to display; `None` hides the display.
    pub label: Option<GestureLabel>,
    /// UI actions in application order.
    pub actions: Vec<Action>,
}

/// Classifier, tracker and dispatcher built from one config.
#[derive(Debug, Clone, Copy)]
pub struct GesturePipeline {
    classifier: GestureClassifier,
    tracker: StabilityTracker,
    dispatcher: ActionDispatcher,
}

impl GesturePipeline {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            classifier: GestureClassifier::new(config),
            tracker: StabilityTracker::new(config),
            dispatcher: ActionDispatcher::new(config.scroll_damping),
        }
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Process one frame.  Only the first hand is considered.
    pub fn process(
        &self,
        mut state: GestureState,
        result: &DetectorResult,
        viewport: Viewport,
    ) -> FrameOutput {
        let Some(hand) = result.primary_hand() else {
            // No hand: the two-finger pose cannot hold.
            state.reset();
            return FrameOutput {
                state,
                event: GestureEvent::None,
                label: None,
                actions: vec![self.dispatcher.label(None)],
            };
        };

        let features = HandFeatures::extract(hand);
        let classification = self.classifier.classify(&features);
        trace!("features {:?} -> {:?}", features, classification);

        let mut event = GestureEvent::None;
        let mut actions = Vec::new();

        // Each check may overwrite the event chosen before it.
        let scroll = self
            .tracker
            .update(&mut state, &features, classification.motion_candidate);
        if let Some(ScrollMotion { axis, movement }) = scroll {
            event = match axis {
                ScrollAxis::Horizontal => GestureEvent::ScrollHorizontal(movement),
                ScrollAxis::Vertical => GestureEvent::ScrollVertical(movement),
            };
            actions.push(self.dispatcher.scroll(viewport, axis, movement));
        }

        if let Some(pointer) = classification.pointer {
            actions.push(self.dispatcher.cursor(viewport, features.index_tip));
            event = GestureEvent::Cursor(features.index_tip);
            if pointer == PointerGesture::Click {
                actions.push(self.dispatcher.click(viewport, features.index_tip));
                event = GestureEvent::Click(features.index_tip);
            }
        }

        let label = GestureLabel {
            category_name: event
                .label()
                .map(str::to_string)
                .unwrap_or_else(|| hand.gesture.name.clone()),
            confidence_percent: hand.gesture.score * 100.0,
            handedness: hand.handedness.name.clone(),
        };
        actions.push(self.dispatcher.label(Some(label.clone())));

        FrameOutput {
            state,
            event,
            label: Some(label),
            actions,
        }
    }
}
