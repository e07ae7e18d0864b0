//! Session configuration
//!
//! Everything a playback session needs is carried in one [`SessionConfig`]
//! record handed to [`crate::PlaybackController::start_session`]. It can be
//! built in code, or loaded from a JSON file where missing keys fall back to
//! the defaults below.

use crate::resampler::ResamplerKind;
use crate::{ResyncError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Frequency used until the emulated machine programs its own DAC rate
pub const DEFAULT_FREQUENCY: u32 = 33_600;

/// Default ring size, in equivalent output samples
pub const PRIMARY_BUFFER_SIZE: usize = 16_384;

/// Default ring fullness target, in equivalent output samples.
/// 2048 samples is a ~46ms worst-case A/V delay at 44.1kHz.
pub const PRIMARY_BUFFER_TARGET: usize = 2_048;

/// Default device chunk size, in output samples
pub const SECONDARY_BUFFER_SIZE: usize = 1_024;

/// Where volume changes are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeBackend {
    /// Samples are scaled in the drain callback
    #[default]
    Software,
    /// Samples pass through unscaled; an external mixer owns the volume
    System,
}

/// Configuration for one playback session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Input frequency used before the source reports its own
    pub default_frequency: u32,
    /// Swap the two 16-bit channels of every pushed frame
    pub swap_channels: bool,
    /// Ring size in equivalent output samples
    pub primary_buffer_size: usize,
    /// Ring fullness target in equivalent output samples
    pub primary_buffer_target: usize,
    /// Requested device chunk size in output samples
    pub secondary_buffer_size: usize,
    /// Resampler identifier (see [`ResamplerKind`])
    pub resampler: String,
    /// Volume backend selector
    pub volume_control: VolumeBackend,
    /// Percentage step for volume up/down
    pub volume_adjust: u32,
    /// Volume at session start (0–100)
    pub volume_default: u32,
    /// Throttle the producer when it runs ahead of playback
    pub audio_sync: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_frequency: DEFAULT_FREQUENCY,
            swap_channels: false,
            primary_buffer_size: PRIMARY_BUFFER_SIZE,
            primary_buffer_target: PRIMARY_BUFFER_TARGET,
            secondary_buffer_size: SECONDARY_BUFFER_SIZE,
            resampler: ResamplerKind::default().id().to_string(),
            volume_control: VolumeBackend::Software,
            volume_adjust: 5,
            volume_default: 80,
            audio_sync: false,
        }
    }
}

impl SessionConfig {
    /// Decode a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the controller cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.default_frequency == 0 {
            return Err(ResyncError::ConfigError(
                "default_frequency must be greater than 0".into(),
            ));
        }
        if self.secondary_buffer_size == 0 {
            return Err(ResyncError::ConfigError(
                "secondary_buffer_size must be greater than 0".into(),
            ));
        }
        if self.primary_buffer_size == 0 {
            return Err(ResyncError::ConfigError(
                "primary_buffer_size must be greater than 0".into(),
            ));
        }
        if self.volume_default > 100 {
            return Err(ResyncError::ConfigError(format!(
                "volume_default {} exceeds 100",
                self.volume_default
            )));
        }
        if ResamplerKind::from_id(&self.resampler).is_none() {
            return Err(ResyncError::UnknownResampler(self.resampler.clone()));
        }
        Ok(())
    }

    /// Set the input frequency used before the source reports one
    pub fn default_frequency(mut self, hz: u32) -> Self {
        self.default_frequency = hz;
        self
    }

    /// Swap left and right on push
    pub fn swap_channels(mut self, enabled: bool) -> Self {
        self.swap_channels = enabled;
        self
    }

    /// Set the ring size in output samples
    pub fn primary_buffer_size(mut self, samples: usize) -> Self {
        self.primary_buffer_size = samples;
        self
    }

    /// Set the fullness target in output samples
    pub fn primary_buffer_target(mut self, samples: usize) -> Self {
        self.primary_buffer_target = samples;
        self
    }

    /// Set the requested device chunk size
    pub fn secondary_buffer_size(mut self, samples: usize) -> Self {
        self.secondary_buffer_size = samples;
        self
    }

    /// Select the resampler by identifier
    pub fn resampler(mut self, id: impl Into<String>) -> Self {
        self.resampler = id.into();
        self
    }

    /// Select the volume backend
    pub fn volume_control(mut self, backend: VolumeBackend) -> Self {
        self.volume_control = backend;
        self
    }

    /// Set the starting volume
    pub fn volume_default(mut self, level: u32) -> Self {
        self.volume_default = level;
        self
    }

    /// Enable producer throttling
    pub fn audio_sync(mut self, enabled: bool) -> Self {
        self.audio_sync = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_plugin_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.default_frequency, 33_600);
        assert_eq!(config.primary_buffer_size, 16_384);
        assert_eq!(config.primary_buffer_target, 2_048);
        assert_eq!(config.secondary_buffer_size, 1_024);
        assert_eq!(config.resampler, "trivial");
        assert_eq!(config.volume_default, 80);
        assert!(!config.audio_sync);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            SessionConfig::from_json_str(r#"{ "audio_sync": true, "volume_control": "system" }"#)
                .unwrap();
        assert!(config.audio_sync);
        assert_eq!(config.volume_control, VolumeBackend::System);
        assert_eq!(config.secondary_buffer_size, SECONDARY_BUFFER_SIZE);
    }

    #[test]
    fn test_unknown_resampler_rejected() {
        let result = SessionConfig::from_json_str(r#"{ "resampler": "speex-fixed-4" }"#);
        assert!(matches!(result, Err(ResyncError::UnknownResampler(id)) if id == "speex-fixed-4"));
    }

    #[test]
    fn test_zero_chunk_rejected() {
        let config = SessionConfig::default().secondary_buffer_size(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("secondary_buffer_size"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "default_frequency": 22050, "swap_channels": true }}"#).unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.default_frequency, 22_050);
        assert!(config.swap_channels);
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let result = SessionConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ResyncError::Json(_))));
    }
}
