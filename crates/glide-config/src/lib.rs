//! Glide configuration system
//!
//! This crate loads motion settings from `glide.toml`, lets environment
//! variables override them, and turns the result into transition settings
//! for the engine.

use std::path::{Path, PathBuf};

use glide_motion::presets::{resolve_timing, TimingPreset, TimingRef};
use glide_motion::transition::TransitionConfig;
use glide_motion::MotionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File read by [`GlideConfig::load_or_default`].
pub const DEFAULT_CONFIG_FILE: &str = "glide.toml";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Motion(#[from] MotionError),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GlideConfig {
    /// Accessibility and motion preferences
    pub motion: MotionConfig,
    /// Default transition timing
    pub timing: TimingConfig,
}

/// Motion preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Force reduced motion regardless of the platform signal
    pub reduced_motion: bool,
    /// Honour reduced-motion requests at all (default: true)
    pub respect_reduced_motion: bool,
    /// Enforce a minimum duration for every transition
    pub epilepsy_safe: bool,
    /// Minimum duration applied when `epilepsy_safe` is set
    pub min_safe_duration_ms: u32,
}

/// Default transition timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Named timing preset
    pub preset: String,
    /// Enter duration override
    pub enter_ms: Option<u32>,
    /// Exit duration override
    pub exit_ms: Option<u32>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            respect_reduced_motion: true,
            epilepsy_safe: false,
            min_safe_duration_ms: 300,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            preset: "default".to_string(),
            enter_ms: None,
            exit_ms: None,
        }
    }
}

impl MotionConfig {
    /// Whether motion should be reduced given the platform's preference.
    pub fn effective_reduced_motion(&self, platform_prefers_reduced: bool) -> bool {
        self.respect_reduced_motion && (platform_prefers_reduced || self.reduced_motion)
    }

    /// Minimum duration to enforce, if any.
    pub fn min_duration_ms(&self) -> Option<u32> {
        self.epilepsy_safe.then_some(self.min_safe_duration_ms)
    }
}

impl TimingConfig {
    /// Resolve the named preset. Unknown names are an error.
    pub fn resolve(&self) -> Result<TimingPreset, ConfigError> {
        Ok(resolve_timing(&TimingRef::Named(self.preset.clone()))?)
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl GlideConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `glide.toml` in the current directory, or
    /// return defaults if the file is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_path_or_default(DEFAULT_CONFIG_FILE)
    }

    /// Load from `path`, falling back to defaults. A missing file is
    /// silent; an unreadable or malformed one is logged.
    pub fn load_from_path_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(error) => {
                tracing::warn!(%error, "invalid configuration; using defaults");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        // Motion settings
        if let Ok(val) = std::env::var("GLIDE_REDUCED_MOTION") {
            self.motion.reduced_motion = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("GLIDE_RESPECT_REDUCED_MOTION") {
            self.motion.respect_reduced_motion = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("GLIDE_EPILEPSY_SAFE") {
            self.motion.epilepsy_safe = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("GLIDE_MIN_SAFE_DURATION_MS") {
            match val.parse::<u32>() {
                Ok(ms) => self.motion.min_safe_duration_ms = ms,
                Err(error) => tracing::warn!(%error, value = %val, "ignoring GLIDE_MIN_SAFE_DURATION_MS"),
            }
        }

        // Timing settings
        if let Ok(preset) = std::env::var("GLIDE_TIMING_PRESET") {
            self.timing.preset = preset;
        }
        if let Ok(val) = std::env::var("GLIDE_ENTER_MS") {
            if let Ok(ms) = val.parse::<u32>() {
                self.timing.enter_ms = Some(ms);
            }
        }
        if let Ok(val) = std::env::var("GLIDE_EXIT_MS") {
            if let Ok(ms) = val.parse::<u32>() {
                self.timing.exit_ms = Some(ms);
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from glide.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }

    /// Transition settings for a new session.
    ///
    /// The preset supplies both durations; `enter_ms`/`exit_ms` override
    /// them individually, in which case the split form is used.
    pub fn transition_config(
        &self,
        visible: bool,
        platform_prefers_reduced: bool,
    ) -> Result<TransitionConfig, ConfigError> {
        let preset = self.timing.resolve()?;
        let base = preset.delay_ms.saturating_add(preset.duration_ms);

        let mut config = TransitionConfig::new(visible)
            .with_timeout(base)
            .with_reduced_motion(self.motion.effective_reduced_motion(platform_prefers_reduced));
        if self.timing.enter_ms.is_some() || self.timing.exit_ms.is_some() {
            config = config.with_split_timeout(
                self.timing.enter_ms.unwrap_or(base),
                self.timing.exit_ms.unwrap_or(base),
            );
        }
        if let Some(min) = self.motion.min_duration_ms() {
            config = config.with_min_duration(min);
        }
        Ok(config)
    }
}
