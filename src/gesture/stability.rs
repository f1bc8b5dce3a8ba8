//! Two-finger motion tracking.
//!
//! While the two-finger pose holds, the averaged per-frame movement of the
//! index and middle tips becomes a scroll along the dominant axis.  The
//! first qualifying frame only records a baseline.  A single frame without
//! the pose erases all history.

use tracing::{debug, trace};

use super::features::HandFeatures;
use super::landmarks::Point2;
use crate::config::GestureConfig;

/// Session-scoped tracking state, carried from one frame to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureState {
    /// Index tip on the previous qualifying frame.
    pub last_index_pos: Option<Point2>,
    /// Middle tip on the previous qualifying frame.
    pub last_middle_pos: Option<Point2>,
    /// Consecutive qualifying frames.
    pub stable_frame_count: u32,
}

/// Tracker phase derived from the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingPhase {
    /// No baseline.
    Idle,
    /// Baseline recorded; the next qualifying frame may scroll.
    Tracking,
}

impl TrackingPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Tracking => "tracking",
        }
    }
}

impl GestureState {
    pub fn phase(&self) -> TrackingPhase {
        if self.has_baseline() {
            TrackingPhase::Tracking
        } else {
            TrackingPhase::Idle
        }
    }

    fn has_baseline(&self) -> bool {
        self.last_index_pos.is_some() && self.last_middle_pos.is_some()
    }

    /// Reset all tracking state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAxis {
    Horizontal,
    Vertical,
}

impl ScrollAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

/// A scroll decision in normalized units; positive is right/down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMotion {
    pub axis: ScrollAxis,
    pub movement: f32,
}

/// Turns consecutive two-finger frames into scroll motion.
#[derive(Debug, Clone, Copy)]
pub struct StabilityTracker {
    stability_threshold: u32,
    movement_deadzone: f32,
}

impl StabilityTracker {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            stability_threshold: config.stability_threshold,
            movement_deadzone: config.movement_deadzone,
        }
    }

    /// Advance one frame.
    ///
    /// `candidate` is true when the two-finger pose holds this frame.
    pub fn update(
        &self,
        state: &mut GestureState,
        features: &HandFeatures,
        candidate: bool,
    ) -> Option<ScrollMotion> {
        if !candidate {
            if state.phase() == TrackingPhase::Tracking {
                debug!(
                    "Two-finger pose lost after {} frame(s)",
                    state.stable_frame_count
                );
            }
            state.reset();
            return None;
        }
        self.advance(state, features.index_tip, features.middle_tip)
    }

    /// Record a qualifying frame with the given fingertips.
    pub fn advance(
        &self,
        state: &mut GestureState,
        index_tip: Point2,
        middle_tip: Point2,
    ) -> Option<ScrollMotion> {
        state.stable_frame_count = state.stable_frame_count.saturating_add(1);

        let mut motion = None;
        if state.stable_frame_count >= self.stability_threshold {
            if let (Some(last_index), Some(last_middle)) =
                (state.last_index_pos, state.last_middle_pos)
            {
                let movement_x =
                    ((index_tip.x - last_index.x) + (middle_tip.x - last_middle.x)) / 2.0;
                let movement_y =
                    ((index_tip.y - last_index.y) + (middle_tip.y - last_middle.y)) / 2.0;
                trace!(
                    "two-finger movement dx={:.4} dy={:.4} (frame {})",
                    movement_x,
                    movement_y,
                    state.stable_frame_count
                );
                motion = self.dominant_axis(movement_x, movement_y);
            }
        }

        state.last_index_pos = Some(index_tip);
        state.last_middle_pos = Some(middle_tip);
        motion
    }

    /// Pick the larger axis if it clears the deadzone.  Equal magnitudes
    /// never scroll.
    fn dominant_axis(&self, movement_x: f32, movement_y: f32) -> Option<ScrollMotion> {
        let (ax, ay) = (movement_x.abs(), movement_y.abs());
        if ax > ay && ax > self.movement_deadzone {
            Some(ScrollMotion {
                axis: ScrollAxis::Horizontal,
                movement: movement_x,
            })
        } else if ay > ax && ay > self.movement_deadzone {
            Some(ScrollMotion {
                axis: ScrollAxis::Vertical,
                movement: movement_y,
            })
        } else {
            None
        }
    }
}
