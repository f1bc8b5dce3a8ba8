//! A live gesture session: owns the tracking state between frames and runs
//! one frame at a time through detector → pipeline → dispatch.
//!
//! Frames are split into `begin_frame` (admission) and `finish_frame`
//! (apply the detector's answer) so that a session deactivated while
//! inference is in flight can reject the late result.

use std::fmt;
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::config::GestureConfig;
use crate::detector::{DetectorError, LandmarkDetector, RunningMode, VideoFrame};
use crate::dispatch::{Action, UiSurface};
use crate::frame_timing::FrameTiming;
use crate::gesture::{DetectorResult, GestureState};
use crate::pipeline::{GestureEvent, GesturePipeline};
use crate::sexp::bool_sexp;

/// Why a frame produced no gesture.  None of these end the session.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// The detector has not finished initializing; try again later.
    DetectorNotReady,
    /// The result held no hands.  Tracking was reset and the label cleared.
    NoHandDetected,
    /// This video timestamp was already admitted once; the frame was skipped.
    DuplicateFrameTimestamp { media_time: f64 },
    /// The session is not running.
    Inactive,
    /// The session was deactivated while this frame was in flight.
    Cancelled,
    /// Inference failed for this frame.
    Detector(DetectorError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DetectorNotReady => write!(f, "detector is not ready, please wait"),
            Self::NoHandDetected => write!(f, "no hand detected"),
            Self::DuplicateFrameTimestamp { media_time } => {
                write!(f, "frame at {:.3}s already seen", media_time)
            }
            Self::Inactive => write!(f, "session is not running"),
            Self::Cancelled => write!(f, "frame result discarded after cancellation"),
            Self::Detector(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Detector(e) => Some(e),
            _ => None,
        }
    }
}

/// An admitted frame awaiting its detector result.
#[derive(Debug, Clone, Copy)]
pub struct FrameTicket {
    epoch: u64,
    frame: VideoFrame,
    requested_at: Instant,
}

impl FrameTicket {
    pub fn frame(&self) -> &VideoFrame {
        &self.frame
    }
}

/// Result of a fully processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub event: GestureEvent,
    /// Actions applied to the surface, in order.
    pub actions: Vec<Action>,
    /// A click activated an element.
    pub clicked: bool,
}

/// Live gesture session state.
pub struct Session {
    config: GestureConfig,
    pipeline: GesturePipeline,
    state: GestureState,
    running: bool,
    /// Bumped on deactivation; tickets from older epochs are stale.
    epoch: u64,
    mode: RunningMode,
    last_media_time: Option<f64>,
    last_gesture: Option<&'static str>,
    /// Actions applied by the most recent frame.
    last_applied: Vec<Action>,
    frames_processed: u64,
    pub timing: FrameTiming,
}

impl Session {
    /// Create a stopped session.
    pub fn new(config: GestureConfig) -> Self {
        Self {
            pipeline: GesturePipeline::new(&config),
            config,
            state: GestureState::default(),
            running: false,
            epoch: 0,
            mode: RunningMode::Image,
            last_media_time: None,
            last_gesture: None,
            last_applied: Vec::new(),
            frames_processed: 0,
            timing: FrameTiming::default(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> RunningMode {
        self.mode
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Actions the most recent frame applied to the surface.  Empty when
    /// that frame was skipped or rejected.
    pub fn last_applied(&self) -> &[Action] {
        &self.last_applied
    }

    /// Start live predictions.  Requires an initialized detector.
    pub fn activate<D: LandmarkDetector>(&mut self, detector: &D) -> Result<(), FrameError> {
        if !detector.is_ready() {
            return Err(FrameError::DetectorNotReady);
        }
        if !self.running {
            self.running = true;
            info!("Gesture session started");
        }
        Ok(())
    }

    /// Stop live predictions and forget all tracking state.  Results for
    /// frames already in flight will be discarded.
    pub fn deactivate(&mut self) {
        if self.running {
            info!(
                "Gesture session stopped after {} frame(s)",
                self.frames_processed
            );
        }
        self.running = false;
        self.epoch += 1;
        self.state.reset();
        self.last_media_time = None;
        self.last_gesture = None;
        self.last_applied.clear();
    }

    /// Flip live predictions on or off.  Returns whether the session is now
    /// running.
    pub fn toggle<D: LandmarkDetector>(&mut self, detector: &D) -> Result<bool, FrameError> {
        if self.running {
            self.deactivate();
        } else {
            self.activate(detector)?;
        }
        Ok(self.running)
    }

    /// Admit a frame for inference.
    pub fn begin_frame<D: LandmarkDetector>(
        &mut self,
        detector: &mut D,
        frame: VideoFrame,
    ) -> Result<FrameTicket, FrameError> {
        self.last_applied.clear();
        if !self.running {
            return Err(FrameError::Inactive);
        }
        if !detector.is_ready() {
            self.timing.record_skip();
            return Err(FrameError::DetectorNotReady);
        }
        if self.last_media_time == Some(frame.media_time) {
            self.timing.record_skip();
            return Err(FrameError::DuplicateFrameTimestamp {
                media_time: frame.media_time,
            });
        }
        if self.mode != RunningMode::Video {
            if let Err(e) = detector.set_running_mode(RunningMode::Video) {
                self.timing.record_skip();
                return Err(FrameError::Detector(e));
            }
            self.mode = RunningMode::Video;
            debug!("Detector switched to video mode");
        }
        self.last_media_time = Some(frame.media_time);

        Ok(FrameTicket {
            epoch: self.epoch,
            frame,
            requested_at: Instant::now(),
        })
    }

    /// Apply the detector's answer for an admitted frame.
    pub fn finish_frame<S: UiSurface>(
        &mut self,
        ticket: FrameTicket,
        result: Result<DetectorResult, DetectorError>,
        surface: &mut S,
    ) -> Result<FrameReport, FrameError> {
        if ticket.epoch != self.epoch || !self.running {
            debug!(
                "Discarding result for frame at {:.3}s (session cancelled)",
                ticket.frame.media_time
            );
            self.timing.record_skip();
            return Err(FrameError::Cancelled);
        }
        let inference_ms = ticket.requested_at.elapsed().as_secs_f64() * 1000.0;

        let result = match result {
            Ok(r) => r,
            Err(e) => {
                self.timing.record_skip();
                return Err(FrameError::Detector(e));
            }
        };

        let started = Instant::now();
        let output = self
            .pipeline
            .process(self.state, &result, surface.viewport());
        self.state = output.state;
        let outcome = self.pipeline.dispatcher().apply(surface, &output.actions);
        self.last_applied = output.actions.clone();
        let pipeline_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.timing.record_frame(inference_ms, pipeline_ms);
        self.frames_processed += 1;

        let gesture = output.event.label();
        if gesture != self.last_gesture {
            debug!(
                "Gesture {} -> {}",
                self.last_gesture.unwrap_or("none"),
                gesture.unwrap_or("none")
            );
            self.last_gesture = gesture;
        }
        trace!(
            "frame {:.3}s: {:?}, {} action(s)",
            ticket.frame.media_time,
            output.event,
            output.actions.len()
        );

        if result.hands.is_empty() {
            return Err(FrameError::NoHandDetected);
        }
        Ok(FrameReport {
            event: output.event,
            actions: output.actions,
            clicked: outcome.clicked,
        })
    }

    /// Run one complete frame: admit, infer, apply.
    pub fn tick<D: LandmarkDetector, S: UiSurface>(
        &mut self,
        detector: &mut D,
        frame: VideoFrame,
        surface: &mut S,
    ) -> Result<FrameReport, FrameError> {
        let ticket = self.begin_frame(detector, frame)?;
        let result = detector.recognize_for_video(ticket.frame());
        self.finish_frame(ticket, result, surface)
    }

    /// Generate s-expression for session status.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:running {} :mode :{} :phase :{} :stable-frames {} :processed {})",
            bool_sexp(self.running),
            self.mode.as_str(),
            self.state.phase().as_str(),
            self.state.stable_frame_count,
            self.frames_processed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessSurface;
    use crate::dispatch::Viewport;
    use crate::gesture::{cursor_hand, two_finger_hand, HandObservation, TrackingPhase};

    /// Detector returning whatever hands the test queued last.
    struct StubDetector {
        ready: bool,
        hands: Vec<HandObservation>,
        fail: bool,
        mode_switches: u32,
    }

    impl StubDetector {
        fn ready() -> Self {
            Self {
                ready: true,
                hands: Vec::new(),
                fail: false,
                mode_switches: 0,
            }
        }
    }

    impl LandmarkDetector for StubDetector {
        fn initialize(&mut self) -> Result<(), DetectorError> {
            self.ready = true;
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn set_running_mode(&mut self, _mode: RunningMode) -> Result<(), DetectorError> {
            self.mode_switches += 1;
            Ok(())
        }

        fn recognize_for_video(
            &mut self,
            _frame: &VideoFrame,
        ) -> Result<DetectorResult, DetectorError> {
            if self.fail {
                return Err(DetectorError::new("inference failed"));
            }
            Ok(DetectorResult {
                hands: self.hands.clone(),
            })
        }
    }

    fn frame(t: f64) -> VideoFrame {
        VideoFrame {
            media_time: t,
            timestamp_ms: t * 1000.0,
        }
    }

    fn surface() -> HeadlessSurface {
        HeadlessSurface::new(Viewport::new(1280.0, 720.0))
    }

    fn running_session(detector: &StubDetector) -> Session {
        let mut session = Session::new(GestureConfig::default());
        session.activate(detector).unwrap();
        session
    }

    #[test]
    fn test_new_session_is_stopped() {
        let session = Session::new(GestureConfig::default());
        assert!(!session.is_running());
        assert_eq!(session.mode(), RunningMode::Image);
        assert_eq!(*session.state(), GestureState::default());
    }

    #[test]
    fn test_activate_requires_ready_detector() {
        let mut detector = StubDetector::ready();
        detector.ready = false;
        let mut session = Session::new(GestureConfig::default());
        assert_eq!(
            session.activate(&detector),
            Err(FrameError::DetectorNotReady)
        );
        assert!(!session.is_running());

        detector.initialize().unwrap();
        assert!(session.activate(&detector).is_ok());
        assert!(session.is_running());
    }

    #[test]
    fn test_inactive_session_rejects_frames() {
        let mut detector = StubDetector::ready();
        let mut session = Session::new(GestureConfig::default());
        let err = session
            .tick(&mut detector, frame(0.1), &mut surface())
            .unwrap_err();
        assert_eq!(err, FrameError::Inactive);
    }

    #[test]
    fn test_first_frame_switches_to_video_once() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![cursor_hand((0.5, 0.3), (0.2, 0.3))];
        let mut session = running_session(&detector);
        let mut s = surface();
        session.tick(&mut detector, frame(0.1), &mut s).unwrap();
        session.tick(&mut detector, frame(0.2), &mut s).unwrap();
        assert_eq!(session.mode(), RunningMode::Video);
        assert_eq!(detector.mode_switches, 1);
    }

    #[test]
    fn test_cursor_frame_moves_indicator() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![cursor_hand((0.5, 0.3), (0.2, 0.3))];
        let mut session = running_session(&detector);
        let mut s = surface();
        let report = session.tick(&mut detector, frame(0.1), &mut s).unwrap();
        assert!(matches!(report.event, GestureEvent::Cursor(_)));
        let (x, y) = s.indicator();
        assert!((x - 640.0).abs() < 1e-3);
        assert!((y - 216.0).abs() < 1e-3);
        assert_eq!(
            s.displayed_label().map(|l| l.category_name.as_str()),
            Some("cursor")
        );
    }

    #[test]
    fn test_click_frame_activates_target() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![cursor_hand((0.5, 0.3), (0.48, 0.3))];
        let mut session = running_session(&detector);
        let mut s = surface();
        s.add_target("custom-button", 600.0, 200.0, 80.0, 40.0);
        let report = session.tick(&mut detector, frame(0.1), &mut s).unwrap();
        assert!(matches!(report.event, GestureEvent::Click(_)));
        assert!(report.clicked);
        assert_eq!(s.clicks(), ["custom-button".to_string()]);
    }

    #[test]
    fn test_duplicate_timestamp_is_skipped() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![two_finger_hand((0.40, 0.30), (0.43, 0.30))];
        let mut session = running_session(&detector);
        let mut s = surface();
        session.tick(&mut detector, frame(0.5), &mut s).unwrap();

        // Different hands, same timestamp: must not be processed.
        detector.hands = vec![two_finger_hand((0.46, 0.30), (0.49, 0.30))];
        let err = session.tick(&mut detector, frame(0.5), &mut s).unwrap_err();
        assert_eq!(err, FrameError::DuplicateFrameTimestamp { media_time: 0.5 });
        assert_eq!(session.state().stable_frame_count, 1);
        assert_eq!(s.scroll_offset(), (0.0, 0.0));
        assert_eq!(session.timing.skipped_frames, 1);
        assert_eq!(session.frames_processed(), 1);
    }

    #[test]
    fn test_scroll_across_frames() {
        let mut detector = StubDetector::ready();
        let mut session = running_session(&detector);
        let mut s = surface();

        detector.hands = vec![two_finger_hand((0.40, 0.30), (0.43, 0.30))];
        session.tick(&mut detector, frame(0.1), &mut s).unwrap();
        detector.hands = vec![two_finger_hand((0.46, 0.30), (0.49, 0.30))];
        let report = session.tick(&mut detector, frame(0.2), &mut s).unwrap();

        assert!(matches!(report.event, GestureEvent::ScrollHorizontal(_)));
        let (dx, dy) = s.scroll_offset();
        assert!((dx - 0.06 * 1280.0 * 0.8).abs() < 0.1);
        assert_eq!(dy, 0.0);
    }

    #[test]
    fn test_no_hand_resets_and_reports() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![two_finger_hand((0.40, 0.30), (0.43, 0.30))];
        let mut session = running_session(&detector);
        let mut s = surface();
        session.tick(&mut detector, frame(0.1), &mut s).unwrap();
        assert_eq!(session.state().phase(), TrackingPhase::Tracking);
        assert!(s.displayed_label().is_some());

        detector.hands.clear();
        let err = session.tick(&mut detector, frame(0.2), &mut s).unwrap_err();
        assert_eq!(err, FrameError::NoHandDetected);
        assert_eq!(*session.state(), GestureState::default());
        assert!(s.displayed_label().is_none());
    }

    #[test]
    fn test_detector_failure_is_isolated() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![two_finger_hand((0.40, 0.30), (0.43, 0.30))];
        let mut session = running_session(&detector);
        let mut s = surface();
        session.tick(&mut detector, frame(0.1), &mut s).unwrap();

        detector.fail = true;
        let err = session.tick(&mut detector, frame(0.2), &mut s).unwrap_err();
        assert!(matches!(err, FrameError::Detector(_)));
        assert_eq!(session.state().stable_frame_count, 1);
        assert!(session.is_running());

        detector.fail = false;
        assert!(session.tick(&mut detector, frame(0.3), &mut s).is_ok());
        assert_eq!(session.state().stable_frame_count, 2);
    }

    #[test]
    fn test_not_ready_midsession_skips_without_consuming_timestamp() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![two_finger_hand((0.40, 0.30), (0.43, 0.30))];
        let mut session = running_session(&detector);
        let mut s = surface();

        detector.ready = false;
        let err = session.tick(&mut detector, frame(0.1), &mut s).unwrap_err();
        assert_eq!(err, FrameError::DetectorNotReady);
        assert_eq!(session.timing.skipped_frames, 1);
        assert_eq!(*session.state(), GestureState::default());
        assert_eq!(session.mode(), RunningMode::Image);
        assert!(s.displayed_label().is_none());

        // The same timestamp is still admitted once the detector is back.
        detector.ready = true;
        assert!(session.tick(&mut detector, frame(0.1), &mut s).is_ok());
        assert_eq!(session.state().stable_frame_count, 1);
    }

    #[test]
    fn test_failed_timestamp_is_not_retried() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![two_finger_hand((0.40, 0.30), (0.43, 0.30))];
        let mut session = running_session(&detector);
        let mut s = surface();

        detector.fail = true;
        let first = session.tick(&mut detector, frame(0.1), &mut s).unwrap_err();
        assert!(matches!(first, FrameError::Detector(_)));

        detector.fail = false;
        let retry = session.tick(&mut detector, frame(0.1), &mut s).unwrap_err();
        assert_eq!(
            retry,
            FrameError::DuplicateFrameTimestamp { media_time: 0.1 }
        );
        assert_eq!(retry.to_string(), "frame at 0.100s already seen");
        assert_eq!(session.frames_processed(), 0);
    }

    #[test]
    fn test_last_applied_tracks_each_frame() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![cursor_hand((0.5, 0.3), (0.2, 0.3))];
        let mut session = running_session(&detector);
        let mut s = surface();

        let report = session.tick(&mut detector, frame(0.1), &mut s).unwrap();
        assert_eq!(session.last_applied(), report.actions.as_slice());
        assert!(matches!(
            session.last_applied()[0],
            Action::SetCursorPosition { .. }
        ));

        // No hand: the clear is recorded even though the frame reports an error.
        detector.hands.clear();
        let err = session.tick(&mut detector, frame(0.2), &mut s).unwrap_err();
        assert_eq!(err, FrameError::NoHandDetected);
        assert_eq!(session.last_applied(), [Action::ClearDisplayedLabel]);

        // A skipped frame applies nothing.
        session.tick(&mut detector, frame(0.2), &mut s).unwrap_err();
        assert!(session.last_applied().is_empty());
    }

    #[test]
    fn test_deactivate_discards_in_flight_result() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![two_finger_hand((0.40, 0.30), (0.43, 0.30))];
        let mut session = running_session(&detector);
        let mut s = surface();

        let ticket = session.begin_frame(&mut detector, frame(0.1)).unwrap();
        let result = detector.recognize_for_video(ticket.frame());
        session.deactivate();
        let err = session.finish_frame(ticket, result, &mut s).unwrap_err();

        assert_eq!(err, FrameError::Cancelled);
        assert_eq!(*session.state(), GestureState::default());
        assert!(s.displayed_label().is_none());
        assert_eq!(session.frames_processed(), 0);
    }

    #[test]
    fn test_stale_ticket_rejected_after_restart() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![two_finger_hand((0.40, 0.30), (0.43, 0.30))];
        let mut session = running_session(&detector);
        let mut s = surface();

        let stale = session.begin_frame(&mut detector, frame(0.1)).unwrap();
        assert_eq!(session.toggle(&detector), Ok(false));
        assert_eq!(session.toggle(&detector), Ok(true));

        let result = detector.recognize_for_video(stale.frame());
        assert_eq!(
            session.finish_frame(stale, result, &mut s).unwrap_err(),
            FrameError::Cancelled
        );
        assert_eq!(session.state().phase(), TrackingPhase::Idle);
    }

    #[test]
    fn test_deactivate_resets_state() {
        let mut detector = StubDetector::ready();
        detector.hands = vec![two_finger_hand((0.40, 0.30), (0.43, 0.30))];
        let mut session = running_session(&detector);
        session
            .tick(&mut detector, frame(0.1), &mut surface())
            .unwrap();
        assert_eq!(session.state().stable_frame_count, 1);

        session.deactivate();
        assert!(!session.is_running());
        assert_eq!(*session.state(), GestureState::default());
    }

    #[test]
    fn test_status_sexp() {
        let detector = StubDetector::ready();
        let session = running_session(&detector);
        let sexp = session.status_sexp();
        assert!(sexp.contains(":running t"));
        assert!(sexp.contains(":mode :image"));
        assert!(sexp.contains(":phase :idle"));
        assert!(sexp.contains(":stable-frames 0"));
        assert!(lexpr::from_str(&sexp).is_ok());
    }

    #[test]
    fn test_frame_error_display() {
        assert_eq!(FrameError::NoHandDetected.to_string(), "no hand detected");
        let e = FrameError::Detector(DetectorError::new("boom"));
        assert_eq!(e.to_string(), "detector error: boom");
        assert!(std::error::Error::source(&e).is_some());
    }
}
