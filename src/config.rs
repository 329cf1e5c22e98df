use crate::core::LIVE_CAPACITY;
use crate::playback::advancer::GAP_THRESHOLD;
use crate::playback::live::LIVE_WARMUP_FRAMES;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persistent playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Speed multiplier playback starts with
    pub default_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Data-seconds between frames treated as a dropout
    pub gap_threshold: f64,
    /// Frames kept per live slot
    pub live_capacity: usize,
    /// Frames a stream must deliver before live mode takes over
    pub live_warmup_frames: usize,
    /// Ticks per second for the headless driver
    pub tick_rate_hz: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            min_speed: 0.1,
            max_speed: 10.0,
            gap_threshold: GAP_THRESHOLD,
            live_capacity: LIVE_CAPACITY,
            live_warmup_frames: LIVE_WARMUP_FRAMES,
            tick_rate_hz: 60,
        }
    }
}

impl PlaybackSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("motsync").join("settings.json"))
    }

    /// Load settings from the user config dir, falling back to defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(settings.sanitized())
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("No config directory available")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Clamp a requested speed into the configured range.
    /// Returns `None` for speeds that are not a positive number.
    pub fn clamp_speed(&self, speed: f64) -> Option<f64> {
        if !speed.is_finite() || speed <= 0.0 {
            return None;
        }
        Some(speed.clamp(self.min_speed, self.max_speed))
    }

    /// Replace nonsensical values with defaults
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.min_speed.is_finite() && self.min_speed > 0.0) {
            self.min_speed = defaults.min_speed;
        }
        if !(self.max_speed.is_finite() && self.max_speed >= self.min_speed) {
            self.max_speed = defaults.max_speed.max(self.min_speed);
        }
        self.default_speed = self
            .clamp_speed(self.default_speed)
            .unwrap_or_else(|| defaults.default_speed.clamp(self.min_speed, self.max_speed));
        if !(self.gap_threshold.is_finite() && self.gap_threshold > 0.0) {
            self.gap_threshold = defaults.gap_threshold;
        }
        if self.live_capacity == 0 {
            self.live_capacity = defaults.live_capacity;
        }
        if self.tick_rate_hz == 0 {
            self.tick_rate_hz = defaults.tick_rate_hz;
        }
        self
    }
}
