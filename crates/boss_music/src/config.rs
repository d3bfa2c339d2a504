use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PROXIMITY_RADIUS: f64 = 30.0;
pub const FADE_IN_TICKS: u32 = 40;
pub const FADE_OUT_TICKS: u32 = 40;
pub const KEEP_SILENT_TICKS: u32 = 20 * 60;
pub const RELEASE_BUFFER_TICKS: u32 = 20;
pub const AUDIBLE_VOLUME_THRESHOLD: f32 = 0.01;
pub const AMBIENT_MUTE_FADE_TICKS: u32 = 8;
pub const AMBIENT_RESTORE_FADE_TICKS: u32 = 40;

/// Tuning for the arbitrator. Every field defaults to the built-in constant,
/// so a config file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArbiterConfig {
    pub proximity_radius: f64,
    pub fade_in_ticks: u32,
    pub fade_out_ticks: u32,
    pub keep_silent_ticks: u32,
    pub release_buffer_ticks: u32,
    pub audible_volume_threshold: f32,
    pub ambient_mute_fade_ticks: u32,
    pub ambient_restore_fade_ticks: u32,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            proximity_radius: PROXIMITY_RADIUS,
            fade_in_ticks: FADE_IN_TICKS,
            fade_out_ticks: FADE_OUT_TICKS,
            keep_silent_ticks: KEEP_SILENT_TICKS,
            release_buffer_ticks: RELEASE_BUFFER_TICKS,
            audible_volume_threshold: AUDIBLE_VOLUME_THRESHOLD,
            ambient_mute_fade_ticks: AMBIENT_MUTE_FADE_TICKS,
            ambient_restore_fade_ticks: AMBIENT_RESTORE_FADE_TICKS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config json at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid config value for {field}: expected {expected}, got {actual}")]
    Invalid {
        field: &'static str,
        expected: &'static str,
        actual: String,
    },
}

impl ArbiterConfig {
    pub fn proximity_radius_sq(&self) -> f64 {
        self.proximity_radius * self.proximity_radius
    }

    pub fn release_after_ticks(&self) -> u32 {
        self.keep_silent_ticks
            .saturating_add(self.fade_out_ticks)
            .saturating_add(self.release_buffer_ticks)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = match serde_path_to_error::deserialize::<_, ArbiterConfig>(&mut deserializer)
        {
            Ok(config) => config,
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                return Err(ConfigError::Parse {
                    path: if path.is_empty() { ".".to_string() } else { path },
                    message: source.to_string(),
                });
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.proximity_radius.is_finite() || self.proximity_radius <= 0.0 {
            return Err(invalid(
                "proximity_radius",
                "finite number > 0",
                self.proximity_radius,
            ));
        }
        for (field, value) in [
            ("fade_in_ticks", self.fade_in_ticks),
            ("fade_out_ticks", self.fade_out_ticks),
            ("ambient_mute_fade_ticks", self.ambient_mute_fade_ticks),
            ("ambient_restore_fade_ticks", self.ambient_restore_fade_ticks),
        ] {
            if value == 0 {
                return Err(invalid(field, "at least 1 tick", value));
            }
        }
        if !(0.0..1.0).contains(&self.audible_volume_threshold) {
            return Err(invalid(
                "audible_volume_threshold",
                "value in [0, 1)",
                self.audible_volume_threshold,
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, expected: &'static str, actual: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        field,
        expected,
        actual: actual.to_string(),
    }
}
