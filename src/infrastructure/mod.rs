//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces: recording backends
//! over cpal or simulated input, and the XDG config file store.

pub mod config;
pub mod recording;

pub use config::XdgConfigStore;
pub use recording::{create_backend, CpalBackend, SimulatedBackend};
