use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Tunables of the live fitting pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// EMA factor applied to tracked landmarks (0-1]
    #[serde(default = "default_smoothing_alpha")]
    pub smoothing_alpha: f64,

    /// Landmarks below this visibility freeze their smoothed position
    #[serde(default = "default_min_visibility")]
    pub min_visibility: f64,

    /// Consecutive agreeing frames needed before the tracked side locks
    #[serde(default = "default_side_lock_frames")]
    pub side_lock_frames: usize,

    /// Ankle Y samples kept for bottom-dead-center detection
    #[serde(default = "default_bdc_window")]
    pub bdc_window: usize,

    /// Distance from the window maximum still treated as the lowest point
    #[serde(default = "default_bdc_epsilon")]
    pub bdc_epsilon: f64,

    /// BDC knee latches older than this never drive advice
    #[serde(default = "default_bdc_max_age_ms")]
    pub bdc_max_age_ms: u64,

    /// Stability (percent) below which biomechanical advice is withheld
    #[serde(default = "default_min_stability")]
    pub min_stability: f64,

    #[serde(default = "default_client_interval_ms")]
    pub client_interval_ms: u64,

    #[serde(default = "default_coach_hold_ms")]
    pub coach_hold_ms: u64,

    /// Smallest before/after change (degrees) worth reporting
    #[serde(default = "default_report_delta")]
    pub report_delta_deg: f64,

    /// Frame size used to bring normalized landmarks into pixel space
    #[serde(default = "default_frame_width")]
    pub frame_width: f64,

    #[serde(default = "default_frame_height")]
    pub frame_height: f64,
}

fn default_smoothing_alpha() -> f64 {
    0.35
}

fn default_min_visibility() -> f64 {
    0.65
}

fn default_side_lock_frames() -> usize {
    1
}

fn default_bdc_window() -> usize {
    20
}

fn default_bdc_epsilon() -> f64 {
    0.004
}

fn default_bdc_max_age_ms() -> u64 {
    2500
}

fn default_min_stability() -> f64 {
    55.0
}

fn default_client_interval_ms() -> u64 {
    650
}

fn default_coach_hold_ms() -> u64 {
    1800
}

fn default_report_delta() -> f64 {
    2.0
}

fn default_frame_width() -> f64 {
    1280.0
}

fn default_frame_height() -> f64 {
    720.0
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: default_smoothing_alpha(),
            min_visibility: default_min_visibility(),
            side_lock_frames: default_side_lock_frames(),
            bdc_window: default_bdc_window(),
            bdc_epsilon: default_bdc_epsilon(),
            bdc_max_age_ms: default_bdc_max_age_ms(),
            min_stability: default_min_stability(),
            client_interval_ms: default_client_interval_ms(),
            coach_hold_ms: default_coach_hold_ms(),
            report_delta_deg: default_report_delta(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
        }
    }
}

fn override_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, current: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {}={:?}", name, raw)),
        None => Ok(current),
    }
}

impl PipelineConfig {
    /// Overlay `BIKEFIT_*` environment variables on this configuration,
    /// keeping the current value of anything unset
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| env::var(name).ok())
    }

    /// Overlay named overrides; `lookup` returns the raw value for a variable name
    pub fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Self {
            smoothing_alpha: override_or(&lookup, "BIKEFIT_SMOOTHING_ALPHA", self.smoothing_alpha)?,
            min_visibility: override_or(&lookup, "BIKEFIT_MIN_VISIBILITY", self.min_visibility)?,
            side_lock_frames: override_or(&lookup, "BIKEFIT_SIDE_LOCK_FRAMES", self.side_lock_frames)?,
            bdc_window: override_or(&lookup, "BIKEFIT_BDC_WINDOW", self.bdc_window)?,
            bdc_epsilon: override_or(&lookup, "BIKEFIT_BDC_EPSILON", self.bdc_epsilon)?,
            bdc_max_age_ms: override_or(&lookup, "BIKEFIT_BDC_MAX_AGE_MS", self.bdc_max_age_ms)?,
            min_stability: override_or(&lookup, "BIKEFIT_MIN_STABILITY", self.min_stability)?,
            client_interval_ms: override_or(&lookup, "BIKEFIT_CLIENT_INTERVAL_MS", self.client_interval_ms)?,
            coach_hold_ms: override_or(&lookup, "BIKEFIT_COACH_HOLD_MS", self.coach_hold_ms)?,
            report_delta_deg: override_or(&lookup, "BIKEFIT_REPORT_DELTA_DEG", self.report_delta_deg)?,
            frame_width: override_or(&lookup, "BIKEFIT_FRAME_WIDTH", self.frame_width)?,
            frame_height: override_or(&lookup, "BIKEFIT_FRAME_HEIGHT", self.frame_height)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every setting is usable by the pipeline
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &str) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            }
        }

        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(invalid("smoothing_alpha", "must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(invalid("min_visibility", "must be in [0, 1]"));
        }
        if self.side_lock_frames == 0 {
            return Err(invalid("side_lock_frames", "must be at least 1"));
        }
        if self.bdc_window < 2 {
            return Err(invalid("bdc_window", "must hold at least 2 samples"));
        }
        if !(self.bdc_epsilon >= 0.0) {
            return Err(invalid("bdc_epsilon", "must not be negative"));
        }
        if !(0.0..=100.0).contains(&self.min_stability) {
            return Err(invalid("min_stability", "must be a percentage"));
        }
        if !(self.report_delta_deg >= 0.0) {
            return Err(invalid("report_delta_deg", "must not be negative"));
        }
        if !(self.frame_width > 0.0 && self.frame_height > 0.0) {
            return Err(invalid("frame_width/frame_height", "must be positive"));
        }
        Ok(())
    }
}
