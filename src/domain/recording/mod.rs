//! Recording domain: configuration, session state and artifacts

pub mod artifact;
pub mod configuration;
pub mod duration;
pub mod state;

pub use artifact::{AudioData, AudioMimeType, RecordingArtifact};
pub use configuration::{
    AndroidAudioSource, AndroidRecordConfiguration, AudioEncoder, InputDevice,
    IosAudioCategoryOption, IosRecordConfiguration, PlatformConfiguration, RecorderConfiguration,
};
pub use duration::Duration;
pub use state::{
    InvalidStateTransition, RecorderState, RecordingSession, SessionCommand, StateChangeEvent,
};
