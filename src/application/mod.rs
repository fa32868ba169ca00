//! Application layer - The recorder service and port interfaces
//!
//! Contains the recorder adapter, the service registry it mounts into,
//! and trait definitions for external system interactions.

pub mod ports;
pub mod recorder;
pub mod services;
pub mod state_relay;

// Re-export the service surface
pub use recorder::{AudioRecorder, RecorderError, DEFAULT_TIMEOUT};
pub use services::{Service, ServiceCollection, ServiceContext};
pub use state_relay::{StateObserver, StateRelay, StateReporter};
