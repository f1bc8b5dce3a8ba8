//! Headless backend: replays a landmark recording through a live session
//! against a recording UI surface.
//!
//! Frames are paced by a calloop timer at the configured rate.  SIGINT and
//! SIGTERM stop the loop gracefully, and a summary is logged at exit.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use tracing::{debug, info, trace, warn};

use super::replay::ReplayDetector;
use crate::config::GestureConfig;
use crate::detector::LandmarkDetector;
use crate::dispatch::{GestureLabel, UiSurface, Viewport};
use crate::frame_timing::FrameTiming;
use crate::session::{FrameError, Session};

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// A named clickable rectangle, in viewport pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickTarget {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ClickTarget {
    /// Parse "name@x,y,w,h".
    pub fn parse(s: &str) -> Option<Self> {
        let (name, rect) = s.split_once('@')?;
        if name.is_empty() {
            return None;
        }
        let parts: Vec<f32> = rect
            .split(',')
            .map(|p| p.trim().parse::<f32>().ok())
            .collect::<Option<_>>()?;
        match parts.as_slice() {
            [x, y, w, h] if *w > 0.0 && *h > 0.0 => Some(Self {
                name: name.to_string(),
                x: *x,
                y: *y,
                width: *w,
                height: *h,
            }),
            _ => None,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Headless runner configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Frame rate at which the recording is replayed.
    pub fps: u32,
    /// Virtual viewport width in pixels.
    pub width: u32,
    /// Virtual viewport height in pixels.
    pub height: u32,
    pub targets: Vec<ClickTarget>,
    /// Print each applied action as an s-expression on stdout.
    pub echo_events: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            width: 1280,
            height: 720,
            targets: Vec::new(),
            echo_events: false,
        }
    }
}

impl HeadlessConfig {
    /// Parse a "WxH" resolution string. Returns (width, height) or None.
    pub fn parse_resolution(s: &str) -> Option<(u32, u32)> {
        let (w, h) = s.split_once('x')?;
        let w = w.parse::<u32>().ok()?;
        let h = h.parse::<u32>().ok()?;
        if w > 0 && h > 0 {
            Some((w, h))
        } else {
            None
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

// ── Recording surface ──────────────────────────────────────

/// A UI surface that records what was done to it.
#[derive(Debug)]
pub struct HeadlessSurface {
    viewport: Viewport,
    indicator: (f32, f32),
    scroll_offset: (f32, f32),
    targets: Vec<ClickTarget>,
    clicks: Vec<String>,
    label: Option<GestureLabel>,
}

impl HeadlessSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            indicator: (viewport.width / 2.0, viewport.height / 2.0),
            scroll_offset: (0.0, 0.0),
            targets: Vec::new(),
            clicks: Vec::new(),
            label: None,
        }
    }

    /// Add a clickable element.  Later targets sit on top of earlier ones.
    pub fn add_target(&mut self, name: &str, x: f32, y: f32, width: f32, height: f32) {
        self.targets.push(ClickTarget {
            name: name.to_string(),
            x,
            y,
            width,
            height,
        });
    }

    /// Indicator center.
    pub fn indicator(&self) -> (f32, f32) {
        self.indicator
    }

    /// Accumulated scroll.
    pub fn scroll_offset(&self) -> (f32, f32) {
        self.scroll_offset
    }

    /// Names of activated elements, oldest first.
    pub fn clicks(&self) -> &[String] {
        &self.clicks
    }

    pub fn displayed_label(&self) -> Option<&GestureLabel> {
        self.label.as_ref()
    }
}

impl UiSurface for HeadlessSurface {
    type Element = String;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn move_indicator(&mut self, x: f32, y: f32) {
        self.indicator = (x, y);
    }

    fn element_at(&self, x: f32, y: f32) -> Option<String> {
        self.targets
            .iter()
            .rev()
            .find(|t| t.contains(x, y))
            .map(|t| t.name.clone())
    }

    fn click(&mut self, element: &String) {
        info!("Clicked {}", element);
        self.clicks.push(element.clone());
    }

    fn scroll_by(&mut self, dx: f32, dy: f32) {
        self.scroll_offset.0 += dx;
        self.scroll_offset.1 += dy;
    }

    fn show_label(&mut self, label: &GestureLabel) {
        if self.label.as_ref().map(|l| &l.category_name) != Some(&label.category_name) {
            trace!("label: {}", label.to_string().replace('\n', " |"));
        }
        self.label = Some(label.clone());
    }

    fn hide_label(&mut self) {
        self.label = None;
    }
}

// ── Runner ─────────────────────────────────────────────────

/// State owned by the event loop.
struct LoopState {
    session: Session,
    detector: ReplayDetector,
    surface: HeadlessSurface,
    echo_events: bool,
    started: Instant,
    running: bool,
}

impl LoopState {
    /// Offer the next recorded frame.  Returns false once the recording is
    /// exhausted.
    fn step(&mut self) -> bool {
        let timestamp_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let Some(frame) = self.detector.advance(timestamp_ms) else {
            return false;
        };

        let result = self
            .session
            .tick(&mut self.detector, frame, &mut self.surface);
        if self.echo_events {
            for action in self.session.last_applied() {
                println!("{}", action.to_sexp());
            }
        }

        match result {
            Ok(_) => {}
            Err(FrameError::NoHandDetected) => trace!("frame {:.3}s: no hand", frame.media_time),
            Err(FrameError::Detector(e)) => {
                warn!("Frame at {:.3}s failed: {}", frame.media_time, e);
            }
            Err(e) => debug!("Frame at {:.3}s skipped: {}", frame.media_time, e),
        }
        true
    }
}

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Replay `replay_path` through a gesture session.
///
/// Fails before the session starts if the recording cannot be loaded or
/// the detector refuses to initialize.
pub fn run(
    config: GestureConfig,
    headless: HeadlessConfig,
    replay_path: &Path,
) -> anyhow::Result<()> {
    let mut detector = ReplayDetector::load(replay_path)?;
    detector
        .initialize()
        .context("detector initialization failed")?;

    let mut surface = HeadlessSurface::new(headless.viewport());
    for target in &headless.targets {
        surface.add_target(
            &target.name,
            target.x,
            target.y,
            target.width,
            target.height,
        );
        debug!(
            "Click target {} at ({}, {}) {}x{}",
            target.name,
            target.x,
            target.y,
            target.width,
            target.height
        );
    }

    let mut session = Session::new(config);
    session.timing = FrameTiming::for_fps(headless.fps);
    session.activate(&detector)?;
    info!("Active config: {}", session.config().config_sexp());

    let mut event_loop = EventLoop::<LoopState>::try_new()?;
    let mut state = LoopState {
        session,
        detector,
        surface,
        echo_events: headless.echo_events,
        started: Instant::now(),
        running: true,
    };

    let interval = headless.frame_interval();
    event_loop
        .handle()
        .insert_source(Timer::from_duration(interval), move |_, _, state| {
            if state.step() {
                TimeoutAction::ToDuration(interval)
            } else {
                info!("Replay finished");
                state.running = false;
                TimeoutAction::Drop
            }
        })
        .map_err(|e| e.error)
        .context("failed to register frame timer")?;

    // Signal handling via libc
    install_signal_handlers();

    let mut last_status_log = Instant::now();
    let status_interval = Duration::from_secs(10);
    info!(
        "Headless replay started: {} frame(s) at {} fps on {}x{}",
        state.detector.frame_count(),
        headless.fps,
        headless.width,
        headless.height
    );

    while state.running {
        // Check global shutdown flag (set by signal handler)
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            info!("Shutdown signal received, exiting");
            state.running = false;
            break;
        }

        if last_status_log.elapsed() >= status_interval {
            info!(
                "Headless status: {} ({} frame(s) left)",
                state.session.status_sexp(),
                state.detector.remaining()
            );
            last_status_log = Instant::now();
        }

        event_loop.dispatch(Some(interval), &mut state)?;
    }

    let status = state.session.status_sexp();
    let timing = state.session.timing.stats_sexp();
    state.session.deactivate();

    let (ix, iy) = state.surface.indicator();
    let (sx, sy) = state.surface.scroll_offset();
    info!("Session: {}", status);
    info!("Frame timing: {}", timing);
    info!(
        "Headless backend shutting down (indicator ({:.1}, {:.1}), scroll ({:.1}, {:.1}), {} click(s))",
        ix,
        iy,
        sx,
        sy,
        state.surface.clicks().len()
    );
    Ok(())
}
