//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::error::{ConfigError, InvalidEncoderError};
use crate::domain::recording::{AudioEncoder, Duration, InputDevice, RecorderConfiguration};

/// Recorder defaults section (`[recorder]` table).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderSection {
    pub encoder: Option<String>,
    pub channels: Option<u16>,
    pub sample_rate: Option<u32>,
    pub bit_rate: Option<u32>,
    pub suppress_noise: Option<bool>,
    pub cancel_echo: Option<bool>,
    pub auto_gain: Option<bool>,
}

impl RecorderSection {
    /// Merge sections, where other takes precedence
    fn merge(self, other: Self) -> Self {
        Self {
            encoder: other.encoder.or(self.encoder),
            channels: other.channels.or(self.channels),
            sample_rate: other.sample_rate.or(self.sample_rate),
            bit_rate: other.bit_rate.or(self.bit_rate),
            suppress_noise: other.suppress_noise.or(self.suppress_noise),
            cancel_echo: other.cancel_echo.or(self.cancel_echo),
            auto_gain: other.auto_gain.or(self.auto_gain),
        }
    }
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub output_dir: Option<String>,
    pub duration: Option<String>,
    pub timeout: Option<String>,
    pub device: Option<String>,
    pub recorder: Option<RecorderSection>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        let recorder = RecorderConfiguration::default();
        Self {
            output_dir: Some(".".to_string()),
            duration: Some(Duration::default_duration().to_string()),
            timeout: Some(Duration::default_timeout().to_string()),
            device: None,
            recorder: Some(RecorderSection {
                encoder: Some(recorder.encoder().to_string()),
                channels: Some(recorder.channels()),
                sample_rate: Some(recorder.sample_rate()),
                bit_rate: Some(recorder.bit_rate()),
                suppress_noise: Some(recorder.suppress_noise()),
                cancel_echo: Some(recorder.cancel_echo()),
                auto_gain: Some(recorder.auto_gain()),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        let recorder = match (self.recorder, other.recorder) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(b.merge(o)),
        };
        Self {
            output_dir: other.output_dir.or(self.output_dir),
            duration: other.duration.or(self.duration),
            timeout: other.timeout.or(self.timeout),
            device: other.device.or(self.device),
            recorder,
        }
    }

    /// Get duration as parsed Duration, or default if not set/invalid
    pub fn duration_or_default(&self) -> Duration {
        self.duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_duration)
    }

    /// Get timeout as parsed Duration, or default if not set/invalid
    pub fn timeout_or_default(&self) -> Duration {
        self.timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_timeout)
    }

    /// Get output directory, or the current directory if not set
    pub fn output_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.output_dir.as_deref().unwrap_or("."))
    }

    /// Build the recorder configuration described by this config.
    ///
    /// Unset values fall back to the recorder defaults.
    pub fn recorder_configuration(&self) -> Result<RecorderConfiguration, ConfigError> {
        let mut config = RecorderConfiguration::default();
        if let Some(section) = &self.recorder {
            if let Some(encoder) = &section.encoder {
                let encoder: AudioEncoder =
                    encoder.parse().map_err(|e: InvalidEncoderError| {
                        ConfigError::ValidationError {
                            key: "recorder.encoder".to_string(),
                            message: e.to_string(),
                        }
                    })?;
                config = config.with_encoder(encoder);
            }
            if let Some(channels) = section.channels {
                config = config.with_channels(channels);
            }
            if let Some(sample_rate) = section.sample_rate {
                config = config.with_sample_rate(sample_rate);
            }
            if let Some(bit_rate) = section.bit_rate {
                config = config.with_bit_rate(bit_rate);
            }
            if let Some(enabled) = section.suppress_noise {
                config = config.with_suppress_noise(enabled);
            }
            if let Some(enabled) = section.cancel_echo {
                config = config.with_cancel_echo(enabled);
            }
            if let Some(enabled) = section.auto_gain {
                config = config.with_auto_gain(enabled);
            }
        }
        if let Some(device) = &self.device {
            config = config.with_device(Some(InputDevice::new(device.clone(), device.clone())));
        }

        config
            .validate()
            .map_err(|e| ConfigError::ValidationError {
                key: "recorder".to_string(),
                message: e.to_string(),
            })?;
        Ok(config)
    }
}
