//! Recorder configuration value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::artifact::AudioMimeType;
use crate::domain::error::{ConfigurationError, InvalidEncoderError};
use crate::domain::platform::Platform;

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default number of channels (stereo)
pub const DEFAULT_CHANNELS: u16 = 2;

/// Default bit rate in bits per second
pub const DEFAULT_BIT_RATE: u32 = 128_000;

/// Audio encoders a recording can be produced with.
///
/// - `AacLc`: AAC Low Complexity, general purpose recording and streaming.
/// - `AacEld`: AAC Enhanced Low Delay, low-latency use such as VoIP.
/// - `AacHe`: AAC High Efficiency, good quality at low bit rates.
/// - `AmrNb` / `AmrWb`: Adaptive Multi-Rate narrow/wide band speech codecs.
/// - `Opus`: speech and music codec.
/// - `Flac`: lossless compression.
/// - `Wav`: uncompressed PCM in a RIFF container.
/// - `Pcm16bits`: raw 16-bit PCM with no container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioEncoder {
    AacLc,
    AacEld,
    AacHe,
    AmrNb,
    AmrWb,
    Opus,
    Flac,
    #[default]
    Wav,
    Pcm16bits,
}

impl AudioEncoder {
    /// All encoders, in declaration order
    pub const ALL: [AudioEncoder; 9] = [
        Self::AacLc,
        Self::AacEld,
        Self::AacHe,
        Self::AmrNb,
        Self::AmrWb,
        Self::Opus,
        Self::Flac,
        Self::Wav,
        Self::Pcm16bits,
    ];

    /// Get the wire name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AacLc => "aacLc",
            Self::AacEld => "aacEld",
            Self::AacHe => "aacHe",
            Self::AmrNb => "amrNb",
            Self::AmrWb => "amrWb",
            Self::Opus => "opus",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm16bits => "pcm16bits",
        }
    }

    /// File extension of the produced artifact
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::AacLc | Self::AacEld | Self::AacHe => "m4a",
            Self::AmrNb | Self::AmrWb => "amr",
            Self::Opus => "opus",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm16bits => "pcm",
        }
    }

    /// MIME type of the produced artifact
    pub const fn mime_type(&self) -> AudioMimeType {
        match self {
            Self::AacLc | Self::AacEld | Self::AacHe => AudioMimeType::Mp4,
            Self::AmrNb => AudioMimeType::Amr,
            Self::AmrWb => AudioMimeType::AmrWb,
            Self::Opus => AudioMimeType::Ogg,
            Self::Flac => AudioMimeType::Flac,
            Self::Wav => AudioMimeType::Wav,
            Self::Pcm16bits => AudioMimeType::Pcm,
        }
    }

    /// Whether the encoder is only reachable through an external transcoder
    pub const fn requires_transcoder(&self) -> bool {
        matches!(
            self,
            Self::AacLc | Self::AacEld | Self::AacHe | Self::AmrNb | Self::AmrWb
        )
    }
}

impl fmt::Display for AudioEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AudioEncoder {
    type Err = InvalidEncoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        Self::ALL
            .into_iter()
            .find(|encoder| encoder.as_str().eq_ignore_ascii_case(input))
            .ok_or_else(|| InvalidEncoderError {
                input: s.to_string(),
            })
    }
}

/// Android audio source selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AndroidAudioSource {
    #[default]
    DefaultSource,
    Mic,
    VoiceUplink,
    VoiceDownlink,
    VoiceCall,
    Camcorder,
    VoiceRecognition,
    VoiceCommunication,
    #[serde(rename = "remoteSubMix")]
    RemoteSubmix,
    Unprocessed,
    VoicePerformance,
}

/// Android-specific recording options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidRecordConfiguration {
    pub use_legacy: bool,
    pub mute_audio: bool,
    pub manage_bluetooth: bool,
    pub audio_source: AndroidAudioSource,
}

impl Default for AndroidRecordConfiguration {
    fn default() -> Self {
        Self {
            use_legacy: false,
            mute_audio: false,
            manage_bluetooth: true,
            audio_source: AndroidAudioSource::DefaultSource,
        }
    }
}

/// iOS audio session category options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IosAudioCategoryOption {
    MixWithOthers,
    DuckOthers,
    AllowBluetooth,
    DefaultToSpeaker,
    InterruptSpokenAudioAndMixWithOthers,
    #[serde(rename = "allowBluetoothA2DP")]
    AllowBluetoothA2dp,
    AllowAirPlay,
    OverrideMutedMicrophoneInterruption,
}

/// iOS-specific recording options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IosRecordConfiguration {
    pub options: Vec<IosAudioCategoryOption>,
    pub manage_audio_session: bool,
}

impl Default for IosRecordConfiguration {
    fn default() -> Self {
        Self {
            options: vec![
                IosAudioCategoryOption::DefaultToSpeaker,
                IosAudioCategoryOption::AllowBluetooth,
                IosAudioCategoryOption::AllowBluetoothA2dp,
            ],
            manage_audio_session: true,
        }
    }
}

/// The platform-specific section that applies on a given host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformConfiguration<'a> {
    Android(&'a AndroidRecordConfiguration),
    Ios(&'a IosRecordConfiguration),
}

/// An available recording device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputDevice {
    /// Opaque platform identifier
    pub id: String,
    /// Human-readable label
    pub label: String,
}

impl InputDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Recorder configuration.
///
/// Immutable value object: the `with_*` methods return a modified copy.
/// A recording captures its configuration by value when it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfiguration {
    encoder: AudioEncoder,
    suppress_noise: bool,
    cancel_echo: bool,
    auto_gain: bool,
    channels: u16,
    sample_rate: u32,
    bit_rate: u32,
    device: Option<InputDevice>,
    android: AndroidRecordConfiguration,
    ios: IosRecordConfiguration,
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            encoder: AudioEncoder::default(),
            suppress_noise: false,
            cancel_echo: false,
            auto_gain: false,
            channels: DEFAULT_CHANNELS,
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_rate: DEFAULT_BIT_RATE,
            device: None,
            android: AndroidRecordConfiguration::default(),
            ios: IosRecordConfiguration::default(),
        }
    }
}

impl RecorderConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoder(mut self, encoder: AudioEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_suppress_noise(mut self, enabled: bool) -> Self {
        self.suppress_noise = enabled;
        self
    }

    pub fn with_cancel_echo(mut self, enabled: bool) -> Self {
        self.cancel_echo = enabled;
        self
    }

    pub fn with_auto_gain(mut self, enabled: bool) -> Self {
        self.auto_gain = enabled;
        self
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    pub fn with_device(mut self, device: Option<InputDevice>) -> Self {
        self.device = device;
        self
    }

    pub fn with_android(mut self, android: AndroidRecordConfiguration) -> Self {
        self.android = android;
        self
    }

    pub fn with_ios(mut self, ios: IosRecordConfiguration) -> Self {
        self.ios = ios;
        self
    }

    pub fn encoder(&self) -> AudioEncoder {
        self.encoder
    }

    pub fn suppress_noise(&self) -> bool {
        self.suppress_noise
    }

    pub fn cancel_echo(&self) -> bool {
        self.cancel_echo
    }

    pub fn auto_gain(&self) -> bool {
        self.auto_gain
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bit_rate(&self) -> u32 {
        self.bit_rate
    }

    pub fn device(&self) -> Option<&InputDevice> {
        self.device.as_ref()
    }

    pub fn android(&self) -> &AndroidRecordConfiguration {
        &self.android
    }

    pub fn ios(&self) -> &IosRecordConfiguration {
        &self.ios
    }

    /// Get the platform-specific section for `platform`, if it has one
    pub fn platform_options(&self, platform: Platform) -> Option<PlatformConfiguration<'_>> {
        match platform {
            Platform::Android => Some(PlatformConfiguration::Android(&self.android)),
            Platform::Ios => Some(PlatformConfiguration::Ios(&self.ios)),
            _ => None,
        }
    }

    /// Check the value invariants
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(1..=2).contains(&self.channels) {
            return Err(ConfigurationError::InvalidChannels(self.channels));
        }
        if self.sample_rate == 0 {
            return Err(ConfigurationError::InvalidSampleRate);
        }
        if self.bit_rate == 0 {
            return Err(ConfigurationError::InvalidBitRate);
        }
        Ok(())
    }
}
