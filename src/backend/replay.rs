//! Landmark recordings played back as a detector.
//!
//! One s-expression frame per line; blank lines and `;` comments are
//! skipped:
//!
//! ```text
//! (:time 0.033 :hands ((:handedness "Right" :handedness-score 0.98
//!                       :gesture "None" :score 0.71
//!                       :landmarks ((0.5 0.5 0.0) ...))))
//! ```
//!
//! Each hand needs exactly 21 landmarks; `z` may be omitted.

use std::path::Path;

use anyhow::{bail, Context, Result};
use lexpr::Value;
use tracing::{debug, info};

use crate::detector::{DetectorError, LandmarkDetector, RunningMode, VideoFrame};
use crate::gesture::{Category, DetectorResult, HandObservation, Landmark, LANDMARK_COUNT};
use crate::sexp::{as_f64, get_float, get_string, get_value, list_items};

/// One recorded frame.
#[derive(Debug, Clone)]
pub struct ReplayFrame {
    /// Media time in seconds.
    pub time: f64,
    pub result: DetectorResult,
}

/// A detector answering from a recording instead of a model.
#[derive(Debug, Default)]
pub struct ReplayDetector {
    frames: Vec<ReplayFrame>,
    /// Index of the next frame to hand out.
    next: usize,
    /// Frame currently offered for recognition.
    current: Option<usize>,
    ready: bool,
    mode: Option<RunningMode>,
}

impl ReplayDetector {
    /// Read a recording file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read replay {}", path.display()))?;
        let detector =
            Self::parse(&contents).with_context(|| format!("invalid replay {}", path.display()))?;
        info!(
            "Loaded {} frame(s) from {}",
            detector.frames.len(),
            path.display()
        );
        Ok(detector)
    }

    /// Parse a recording from text.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut frames = Vec::new();
        for (n, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let frame = parse_frame(line).with_context(|| format!("line {}", n + 1))?;
            frames.push(frame);
        }
        Ok(Self {
            frames,
            ..Self::default()
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn remaining(&self) -> usize {
        self.frames.len() - self.next
    }

    pub fn mode(&self) -> Option<RunningMode> {
        self.mode
    }

    /// Offer the next recorded frame, stamped with the given wall-clock time.
    /// `None` once the recording is exhausted.
    pub fn advance(&mut self, timestamp_ms: f64) -> Option<VideoFrame> {
        let frame = self.frames.get(self.next)?;
        self.current = Some(self.next);
        self.next += 1;
        Some(VideoFrame {
            media_time: frame.time,
            timestamp_ms,
        })
    }
}

impl LandmarkDetector for ReplayDetector {
    fn initialize(&mut self) -> Result<(), DetectorError> {
        if self.frames.is_empty() {
            return Err(DetectorError::new("replay contains no frames"));
        }
        self.ready = true;
        debug!("Replay detector ready ({} frames)", self.frames.len());
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn set_running_mode(&mut self, mode: RunningMode) -> Result<(), DetectorError> {
        self.mode = Some(mode);
        Ok(())
    }

    fn recognize_for_video(
        &mut self,
        frame: &VideoFrame,
    ) -> Result<DetectorResult, DetectorError> {
        let recorded = self
            .current
            .and_then(|i| self.frames.get(i))
            .ok_or_else(|| DetectorError::new("no frame offered"))?;
        if recorded.time != frame.media_time {
            return Err(DetectorError::new(format!(
                "frame at {:.3}s is not the offered frame ({:.3}s)",
                frame.media_time, recorded.time
            )));
        }
        Ok(recorded.result.clone())
    }
}

// ── Parsing ───────────────────────────────────────────────

fn parse_frame(line: &str) -> Result<ReplayFrame> {
    let value = lexpr::from_str(line).context("malformed s-expression")?;
    let time = get_float(&value, "time").context("missing numeric :time")?;

    let hands = match get_value(&value, "hands") {
        None | Some(Value::Nil) | Some(Value::Null) => Vec::new(),
        Some(list) => list_items(list)
            .context(":hands must be a list")?
            .into_iter()
            .enumerate()
            .map(|(i, hand)| parse_hand(hand).with_context(|| format!("hand {}", i)))
            .collect::<Result<Vec<_>>>()?,
    };

    Ok(ReplayFrame {
        time,
        result: DetectorResult { hands },
    })
}

fn parse_hand(value: &Value) -> Result<HandObservation> {
    let handedness = Category::new(
        get_string(value, "handedness").unwrap_or_else(|| "Unknown".to_string()),
        get_float(value, "handedness-score").unwrap_or(0.0) as f32,
    );
    let gesture = Category::new(
        get_string(value, "gesture").unwrap_or_else(|| "None".to_string()),
        get_float(value, "score").unwrap_or(0.0) as f32,
    );

    let points = get_value(value, "landmarks")
        .and_then(list_items)
        .context("missing :landmarks list")?;
    let landmarks = points
        .into_iter()
        .map(parse_landmark)
        .collect::<Result<Vec<_>>>()?;

    match HandObservation::from_landmarks(&landmarks, handedness, gesture) {
        Some(hand) => Ok(hand),
        None => bail!(
            "expected {} landmarks, got {}",
            LANDMARK_COUNT,
            landmarks.len()
        ),
    }
}

fn parse_landmark(value: &Value) -> Result<Landmark> {
    let coords = list_items(value)
        .context("landmark must be a list")?
        .into_iter()
        .map(as_f64)
        .collect::<Option<Vec<_>>>()
        .context("landmark coordinates must be numbers")?;
    match coords.as_slice() {
        [x, y] => Ok(Landmark::new(*x as f32, *y as f32, 0.0)),
        [x, y, z] => Ok(Landmark::new(*x as f32, *y as f32, *z as f32)),
        _ => bail!(
            "landmark must have 2 or 3 coordinates, got {}",
            coords.len()
        ),
    }
}
