//! audio-recorder - audio recording service with pluggable backends
//!
//! An [`AudioRecorder`](application::AudioRecorder) is a non-visual service.
//! Registered in a [`ServiceCollection`](application::ServiceCollection), it
//! forwards recording commands to a backend and relays the states that
//! backend reports.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: recording configuration, session states, artifacts and errors
//! - **Application**: the recorder service, state relay and port interfaces (traits)
//! - **Infrastructure**: cpal and simulated backends, encoders, FFmpeg, config file
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
