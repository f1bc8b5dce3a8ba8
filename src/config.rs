//! Recognition thresholds and their s-expression file format.
//!
//! A config file is a single plist; unknown keys are ignored so the same
//! file can carry host settings:
//!
//! ```text
//! (:stability-threshold 1
//!  :pinch-distance-threshold 0.04
//!  :two-finger-proximity-threshold 0.05
//!  :movement-deadzone 0.01
//!  :scroll-damping 0.8)
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use lexpr::Value;
use tracing::debug;

use crate::sexp::{get_float, get_u32, get_value};

/// Configuration for gesture recognition and dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Consecutive two-finger frames required before scrolling.
    pub stability_threshold: u32,
    /// Maximum thumb-index tip distance (normalized) for a click.
    pub pinch_distance_threshold: f32,
    /// Maximum index-middle tip distance (normalized) for the scroll pose.
    pub two_finger_proximity_threshold: f32,
    /// Minimum per-frame movement (normalized) before a scroll fires.
    pub movement_deadzone: f32,
    /// Scale applied to scroll movement after converting to pixels.
    pub scroll_damping: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            stability_threshold: 1,
            pinch_distance_threshold: 0.04,
            two_finger_proximity_threshold: 0.05,
            movement_deadzone: 0.01,
            scroll_damping: 0.8,
        }
    }
}

impl GestureConfig {
    /// Load from an s-expression file, starting from defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_sexp_str(&contents)
            .with_context(|| format!("invalid config {}", path.display()))?;
        debug!(
            "loaded config from {}: {}",
            path.display(),
            config.config_sexp()
        );
        Ok(config)
    }

    /// Parse a plist, overriding defaults with the keys present.
    pub fn from_sexp_str(raw: &str) -> Result<Self> {
        let value = lexpr::from_str(raw).context("malformed s-expression")?;
        let mut config = Self::default();
        config.apply_sexp(&value)?;
        Ok(config)
    }

    /// Override fields from the keys present in `value`.
    pub fn apply_sexp(&mut self, value: &Value) -> Result<()> {
        if get_value(value, "stability-threshold").is_some() {
            self.stability_threshold = get_u32(value, "stability-threshold")
                .context(":stability-threshold must be a non-negative integer")?;
        }
        for (key, field) in [
            (
                "pinch-distance-threshold",
                &mut self.pinch_distance_threshold,
            ),
            (
                "two-finger-proximity-threshold",
                &mut self.two_finger_proximity_threshold,
            ),
            ("movement-deadzone", &mut self.movement_deadzone),
            ("scroll-damping", &mut self.scroll_damping),
        ] {
            if get_value(value, key).is_some() {
                let v =
                    get_float(value, key).with_context(|| format!(":{} must be a number", key))?;
                *field = v as f32;
            }
        }
        self.validate()
    }

    /// Reject values that would make the predicates meaningless.
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("pinch-distance-threshold", self.pinch_distance_threshold),
            (
                "two-finger-proximity-threshold",
                self.two_finger_proximity_threshold,
            ),
            ("movement-deadzone", self.movement_deadzone),
            ("scroll-damping", self.scroll_damping),
        ] {
            if !v.is_finite() || v < 0.0 {
                bail!(":{} must be a finite non-negative number, got {}", name, v);
            }
        }
        Ok(())
    }

    /// Generate s-expression for the active config.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:stability-threshold {} :pinch-distance-threshold {:.3} :two-finger-proximity-threshold {:.3} :movement-deadzone {:.3} :scroll-damping {:.2})",
            self.stability_threshold,
            self.pinch_distance_threshold,
            self.two_finger_proximity_threshold,
            self.movement_deadzone,
            self.scroll_damping,
        )
    }
}
