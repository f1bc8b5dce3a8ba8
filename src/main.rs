//! handpilot - drive a pointer with hand gestures.
//!
//! Replays recorded hand landmarks through the gesture pipeline against a
//! headless UI surface.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use handpilot::backend::headless::{self, ClickTarget, HeadlessConfig};
use handpilot::config::GestureConfig;

#[derive(Parser, Debug)]
#[command(name = "handpilot", about = "Hand-gesture pointer control")]
struct Cli {
    /// Landmark recording to replay (one s-expression frame per line)
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Config file (s-expression plist)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Consecutive two-finger frames required before scrolling
    #[arg(long)]
    stability_threshold: Option<u32>,

    /// Thumb-index distance below which a cursor pose clicks
    #[arg(long)]
    pinch_distance_threshold: Option<f32>,

    /// Index-middle distance below which two raised fingers may scroll
    #[arg(long)]
    two_finger_proximity_threshold: Option<f32>,

    /// Minimum per-frame movement before a scroll fires
    #[arg(long)]
    movement_deadzone: Option<f32>,

    /// Scale applied to scroll distances
    #[arg(long)]
    scroll_damping: Option<f32>,

    /// Replay frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Virtual viewport size (WxH)
    #[arg(long, default_value = "1280x720")]
    viewport: String,

    /// Clickable element, as name@x,y,w,h (repeatable)
    #[arg(long = "target")]
    targets: Vec<String>,

    /// Print applied actions as s-expressions on stdout
    #[arg(long)]
    events: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    fn gesture_config(&self) -> anyhow::Result<GestureConfig> {
        let mut config = match &self.config {
            Some(path) => GestureConfig::load(path)?,
            None => GestureConfig::default(),
        };
        if let Some(v) = self.stability_threshold {
            config.stability_threshold = v;
        }
        if let Some(v) = self.pinch_distance_threshold {
            config.pinch_distance_threshold = v;
        }
        if let Some(v) = self.two_finger_proximity_threshold {
            config.two_finger_proximity_threshold = v;
        }
        if let Some(v) = self.movement_deadzone {
            config.movement_deadzone = v;
        }
        if let Some(v) = self.scroll_damping {
            config.scroll_damping = v;
        }
        config.validate()?;
        Ok(config)
    }

    fn headless_config(&self) -> anyhow::Result<HeadlessConfig> {
        let (width, height) = HeadlessConfig::parse_resolution(&self.viewport)
            .with_context(|| format!("invalid --viewport {:?}, expected WxH", self.viewport))?;
        if self.fps == 0 {
            bail!("--fps must be at least 1");
        }
        let targets = self
            .targets
            .iter()
            .map(|t| {
                ClickTarget::parse(t)
                    .with_context(|| format!("invalid --target {:?}, expected name@x,y,w,h", t))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(HeadlessConfig {
            fps: self.fps,
            width,
            height,
            targets,
            echo_events: self.events,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("handpilot {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handpilot=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("handpilot v{} starting", env!("CARGO_PKG_VERSION"));

    let Some(replay) = cli.replay.clone() else {
        bail!("--replay <file> is required");
    };
    let config = cli.gesture_config()?;
    let headless = cli.headless_config()?;

    headless::run(config, headless, &replay)
}
