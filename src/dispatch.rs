//! Action dispatch: turns a frame's gesture into UI side effects.
//!
//! Planning is pure and produces a list of `Action`s.  Applying them is the
//! only place that touches the host UI, through the `UiSurface` capability
//! trait.

use std::fmt;

use tracing::{debug, trace};

use crate::gesture::{Point2, ScrollAxis};
use crate::sexp::{escape_string, format_event};

/// Host viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Map a normalized camera point to viewport pixels, mirroring x so the
    /// indicator follows the hand as in a mirror.
    pub fn to_pixels(&self, pos: Point2) -> (f32, f32) {
        ((1.0 - pos.x) * self.width, pos.y * self.height)
    }

    fn extent(&self, axis: ScrollAxis) -> f32 {
        match axis {
            ScrollAxis::Horizontal => self.width,
            ScrollAxis::Vertical => self.height,
        }
    }
}

/// Text shown in the gesture status display.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureLabel {
    pub category_name: String,
    /// Baseline gesture score, in percent.
    pub confidence_percent: f32,
    pub handedness: String,
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GestureRecognizer: {}\n Confidence: {:.2} %\n Handedness: {}",
            self.category_name, self.confidence_percent, self.handedness
        )
    }
}

/// A UI side effect requested by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetCursorPosition { x: f32, y: f32 },
    DispatchClick { x: f32, y: f32 },
    ScrollBy { dx: f32, dy: f32 },
    SetDisplayedLabel(GestureLabel),
    ClearDisplayedLabel,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetCursorPosition { .. } => "set-cursor-position",
            Self::DispatchClick { .. } => "dispatch-click",
            Self::ScrollBy { .. } => "scroll-by",
            Self::SetDisplayedLabel(_) => "set-displayed-label",
            Self::ClearDisplayedLabel => "clear-displayed-label",
        }
    }

    /// Render as an event s-expression for hosts reading a stream.
    pub fn to_sexp(&self) -> String {
        match self {
            Self::SetCursorPosition { x, y } | Self::DispatchClick { x, y } => format_event(
                self.as_str(),
                &[("x", &format!("{:.1}", x)), ("y", &format!("{:.1}", y))],
            ),
            Self::ScrollBy { dx, dy } => format_event(
                self.as_str(),
                &[("dx", &format!("{:.1}", dx)), ("dy", &format!("{:.1}", dy))],
            ),
            Self::SetDisplayedLabel(label) => format_event(
                self.as_str(),
                &[
                    (
                        "category",
                        &format!("\"{}\"", escape_string(&label.category_name)),
                    ),
                    ("confidence", &format!("{:.2}", label.confidence_percent)),
                    (
                        "handedness",
                        &format!("\"{}\"", escape_string(&label.handedness)),
                    ),
                ],
            ),
            Self::ClearDisplayedLabel => format_event(self.as_str(), &[]),
        }
    }
}

/// Capabilities the dispatcher needs from the host UI.
pub trait UiSurface {
    /// Handle to an activatable element.
    type Element;

    fn viewport(&self) -> Viewport;
    /// Move the pointer indicator so its center sits at `(x, y)`.
    fn move_indicator(&mut self, x: f32, y: f32);
    fn element_at(&self, x: f32, y: f32) -> Option<Self::Element>;
    fn click(&mut self, element: &Self::Element);
    /// Relative scroll; positive is right/down.
    fn scroll_by(&mut self, dx: f32, dy: f32);
    fn show_label(&mut self, label: &GestureLabel);
    fn hide_label(&mut self);
}

/// What applying a frame's actions actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// A click found an element and activated it.
    pub clicked: bool,
}

/// Plans and applies UI actions.
#[derive(Debug, Clone, Copy)]
pub struct ActionDispatcher {
    scroll_damping: f32,
}

impl ActionDispatcher {
    pub fn new(scroll_damping: f32) -> Self {
        Self { scroll_damping }
    }

    /// Pointer move to the mirrored index tip.
    pub fn cursor(&self, viewport: Viewport, index_tip: Point2) -> Action {
        let (x, y) = viewport.to_pixels(index_tip);
        Action::SetCursorPosition { x, y }
    }

    /// Click at the indicator center.
    pub fn click(&self, viewport: Viewport, index_tip: Point2) -> Action {
        let (x, y) = viewport.to_pixels(index_tip);
        Action::DispatchClick { x, y }
    }

    /// Scroll by the damped pixel equivalent of `movement`.
    pub fn scroll(&self, viewport: Viewport, axis: ScrollAxis, movement: f32) -> Action {
        let amount = movement * viewport.extent(axis) * self.scroll_damping;
        match axis {
            ScrollAxis::Horizontal => Action::ScrollBy {
                dx: amount,
                dy: 0.0,
            },
            ScrollAxis::Vertical => Action::ScrollBy {
                dx: 0.0,
                dy: amount,
            },
        }
    }

    /// Show `label`, or hide the display when there is nothing to show.
    pub fn label(&self, label: Option<GestureLabel>) -> Action {
        match label {
            Some(label) => Action::SetDisplayedLabel(label),
            None => Action::ClearDisplayedLabel,
        }
    }

    /// Apply planned actions to the host, in order.
    pub fn apply<S: UiSurface>(&self, surface: &mut S, actions: &[Action]) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for action in actions {
            match action {
                Action::SetCursorPosition { x, y } => {
                    trace!("cursor -> ({:.1}, {:.1})", x, y);
                    surface.move_indicator(*x, *y);
                }
                Action::DispatchClick { x, y } => match surface.element_at(*x, *y) {
                    Some(element) => {
                        debug!("click at ({:.1}, {:.1})", x, y);
                        surface.click(&element);
                        outcome.clicked = true;
                    }
                    None => trace!("click at ({:.1}, {:.1}) hit nothing", x, y),
                },
                Action::ScrollBy { dx, dy } => {
                    if *dx != 0.0 {
                        debug!(
                            "Scrolling horizontally: {}",
                            if *dx > 0.0 { "Right" } else { "Left" }
                        );
                    } else {
                        debug!(
                            "Scrolling vertically: {}",
                            if *dy > 0.0 { "Down" } else { "Up" }
                        );
                    }
                    surface.scroll_by(*dx, *dy);
                }
                Action::SetDisplayedLabel(label) => surface.show_label(label),
                Action::ClearDisplayedLabel => surface.hide_label(),
            }
        }
        outcome
    }
}
