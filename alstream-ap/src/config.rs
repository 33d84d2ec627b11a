//! Player configuration
//!
//! Loaded from TOML (see [`alstream_common::config`] for how the file is
//! located). Every field has a built-in default, so an empty or missing file
//! is a valid configuration.
//!
//! ```toml
//! device = "Software Renderer"
//!
//! [logging]
//! level = "debug"
//!
//! [streaming]
//! buffer_count = 4
//! initial_submit = 3
//! buffer_ms = 250
//! poll_interval_ms = 50
//!
//! [demo]
//! tick_ms = 100
//! tone_hz = 440.0
//! ```

use crate::error::{Error, Result};
use alstream_common::config::{load_toml_or_default, ConfigResolver, LoggingConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Device to open; `None` = default device
    pub device: Option<String>,
    pub logging: LoggingConfig,
    pub streaming: StreamingConfig,
    pub demo: DemoConfig,
}

/// Ring-buffer streaming settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Buffers in the ring
    pub buffer_count: usize,
    /// Buffers filled and queued before playback starts
    pub initial_submit: usize,
    /// Audio per buffer
    pub buffer_ms: u64,
    /// Delay between polls
    pub poll_interval_ms: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_count: 4,
            initial_submit: 3,
            buffer_ms: 250,
            poll_interval_ms: 50,
        }
    }
}

impl StreamingConfig {
    pub fn buffer_duration(&self) -> Duration {
        Duration::from_millis(self.buffer_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Spatial demo settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// State-poll interval
    pub tick_ms: u64,
    /// Interval between motion steps
    pub motion_step_ms: u64,
    /// Motion demo swings between -extent and +extent
    pub motion_extent: f32,
    /// Motion steps before the demo ends
    pub motion_steps: u32,
    /// Fly-by speed (units/s)
    pub doppler_speed: f32,
    pub cone_inner_deg: f32,
    pub cone_outer_deg: f32,
    pub cone_outer_gain: f32,
    /// Generated tone when no WAV file is given
    pub tone_hz: f32,
    pub tone_secs: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            motion_step_ms: 1000,
            motion_extent: 10.0,
            motion_steps: 40,
            doppler_speed: 30.0,
            cone_inner_deg: 60.0,
            cone_outer_deg: 180.0,
            cone_outer_gain: 0.25,
            tone_hz: 440.0,
            tone_secs: 2.0,
        }
    }
}

impl DemoConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn motion_step(&self) -> Duration {
        Duration::from_millis(self.motion_step_ms)
    }

    pub fn tone_duration(&self) -> Duration {
        Duration::from_secs_f32(self.tone_secs)
    }
}

impl PlayerConfig {
    /// Resolve, load and validate the configuration
    ///
    /// Returns the config and the file it came from (if any).
    pub fn load(cli_path: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = ConfigResolver::new().resolve(cli_path);
        let config: Self = load_toml_or_default(path.as_deref())?;
        config.validate()?;
        if let Some(p) = &path {
            info!("Loaded configuration from {}", p.display());
        }
        Ok((config, path))
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.streaming;
        if s.buffer_count == 0 {
            return Err(Error::Config("streaming.buffer_count must be at least 1".into()));
        }
        if s.initial_submit > s.buffer_count {
            return Err(Error::Config(format!(
                "streaming.initial_submit ({}) exceeds buffer_count ({})",
                s.initial_submit, s.buffer_count
            )));
        }
        if s.buffer_ms == 0 || s.poll_interval_ms == 0 {
            return Err(Error::Config(
                "streaming.buffer_ms and poll_interval_ms must be non-zero".into(),
            ));
        }

        let d = &self.demo;
        if d.tick_ms == 0 || d.motion_step_ms == 0 {
            return Err(Error::Config(
                "demo.tick_ms and motion_step_ms must be non-zero".into(),
            ));
        }
        if !(d.tone_hz > 0.0) || !(d.tone_secs > 0.0) || !d.tone_secs.is_finite() {
            return Err(Error::Config(
                "demo.tone_hz and tone_secs must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&d.cone_outer_gain) {
            return Err(Error::Config("demo.cone_outer_gain must be within 0..=1".into()));
        }
        if !(0.0..=360.0).contains(&d.cone_inner_deg)
            || !(0.0..=360.0).contains(&d.cone_outer_deg)
        {
            return Err(Error::Config("demo cone angles must be within 0..=360".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PlayerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.streaming.buffer_count, 4);
        assert_eq!(config.logging.level, "info");
        assert!(config.device.is_none());
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        assert_eq!(PlayerConfig::from_toml_str("").unwrap(), PlayerConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = PlayerConfig::from_toml_str(
            r#"
            device = "Null Output"

            [streaming]
            buffer_count = 8

            [demo]
            tone_hz = 220.0
            "#,
        )
        .unwrap();
        assert_eq!(config.device.as_deref(), Some("Null Output"));
        assert_eq!(config.streaming.buffer_count, 8);
        assert_eq!(config.streaming.initial_submit, 3);
        assert_eq!(config.demo.tone_hz, 220.0);
        assert_eq!(config.demo.tick_ms, 100);
    }

    #[test]
    fn test_initial_submit_above_pool_rejected() {
        let err = PlayerConfig::from_toml_str(
            "[streaming]\nbuffer_count = 2\ninitial_submit = 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = PlayerConfig::from_toml_str("[streaming]\npoll_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = PlayerConfig::from_toml_str("[demo]\ntick_ms = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = PlayerConfig::from_toml_str("[streaming\nbuffer_count = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
