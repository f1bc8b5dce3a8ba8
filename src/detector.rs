//! Boundary to the external hand-landmark detector.
//!
//! The detector is a request/response collaborator: one call per frame,
//! completed before the pipeline continues.  Model loading and video
//! capture live behind this trait.

use std::fmt;

use crate::gesture::DetectorResult;

/// Detector operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningMode {
    /// Independent still images.  The detector's initial mode; a session
    /// switches to `Video` on its first admitted frame.
    Image,
    /// A timestamped video stream.
    Video,
}

impl RunningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// One video frame offered for recognition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoFrame {
    /// Media timestamp of the underlying video frame, in seconds.
    pub media_time: f64,
    /// Wall-clock timestamp in milliseconds, passed to the detector.
    pub timestamp_ms: f64,
}

/// Failure reported by the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorError {
    pub message: String,
}

impl DetectorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "detector error: {}", self.message)
    }
}

impl std::error::Error for DetectorError {}

/// An external hand-landmark detector.
pub trait LandmarkDetector {
    /// Load the model.  Failure here prevents a session from starting.
    fn initialize(&mut self) -> Result<(), DetectorError>;

    /// Whether `initialize` has completed.
    fn is_ready(&self) -> bool;

    fn set_running_mode(&mut self, mode: RunningMode) -> Result<(), DetectorError>;

    /// Run inference on one video frame.
    fn recognize_for_video(&mut self, frame: &VideoFrame) -> Result<DetectorResult, DetectorError>;
}
