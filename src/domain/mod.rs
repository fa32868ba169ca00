//! Domain layer - Core recording values and rules
//!
//! Contains value objects, the session state machine, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod platform;
pub mod recording;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use platform::Platform;
pub use recording::{
    AudioData, AudioEncoder, AudioMimeType, Duration, InputDevice, RecorderConfiguration,
    RecorderState, RecordingArtifact, RecordingSession, StateChangeEvent,
};
