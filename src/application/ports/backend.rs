//! Recorder backend port interface

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::application::state_relay::StateReporter;
use crate::domain::recording::{AudioEncoder, InputDevice, RecorderConfiguration, RecordingArtifact};

/// Backend errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Encoder {0} is not supported on this platform")]
    UnsupportedEncoder(AudioEncoder),

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("No audio device available")]
    NoAudioDevice,

    #[error("Input device not found: {0}")]
    DeviceNotFound(String),

    #[error("No recording in progress")]
    NotRecording,

    #[error("Recording already in progress")]
    AlreadyRecording,

    #[error("Failed to start recording: {0}")]
    StartFailed(String),

    #[error("Recording failed: {0}")]
    RecordingFailed(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Failed to write recording: {0}")]
    WriteFailed(String),

    #[error("FFmpeg not found. Install it to use AAC and AMR encoders")]
    FfmpegNotFound,
}

/// Parameters of a recording start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    /// Where the artifact is written. `None` keeps it in memory.
    pub output_path: Option<PathBuf>,
    /// Configuration captured for the whole session
    pub configuration: RecorderConfiguration,
}

/// Port for a native recording implementation.
///
/// The backend owns the session. It reports every state transition it
/// goes through to the attached [`StateReporter`].
///
/// Mutating calls run on their own task and may outlive the caller's
/// deadline, so they always run to completion.
#[async_trait]
pub trait RecorderBackend: Send + Sync + 'static {
    /// Attach the reporter that receives state transitions.
    fn attach(&self, reporter: StateReporter);

    /// Begin a recording session.
    async fn start(&self, request: StartRequest) -> Result<(), BackendError>;

    /// End the session and return the produced artifact, if any.
    async fn stop(&self) -> Result<Option<RecordingArtifact>, BackendError>;

    /// Abort the session and discard the artifact.
    async fn cancel(&self) -> Result<(), BackendError>;

    async fn pause(&self) -> Result<(), BackendError>;

    async fn resume(&self) -> Result<(), BackendError>;

    async fn is_recording(&self) -> Result<bool, BackendError>;

    async fn is_paused(&self) -> Result<bool, BackendError>;

    /// Capability probe for `encoder`.
    async fn is_supported_encoder(&self, encoder: AudioEncoder) -> Result<bool, BackendError>;

    /// Enumerate the available input devices.
    async fn list_input_devices(&self) -> Result<Vec<InputDevice>, BackendError>;

    /// Query microphone permission without prompting where the platform allows.
    async fn has_permission(&self) -> Result<bool, BackendError>;
}
