//! Recording backends and encoders
//!
//! [`CpalBackend`] records from real input devices through cpal.
//! [`SimulatedBackend`] produces generated silence for tests and hosts
//! without audio hardware.

mod cpal_backend;
mod encoding;
mod ffmpeg;
mod flac_encoder;
#[cfg(feature = "opus")]
mod opus_encoder;
mod processing;
mod simulated;
mod wav_encoder;

use std::sync::{Mutex, MutexGuard};

pub use cpal_backend::CpalBackend;
pub use encoding::{encode_pcm, in_process_supported, EncodingError};
pub use ffmpeg::FfmpegTranscoder;
pub use flac_encoder::encode_to_flac;
#[cfg(feature = "opus")]
pub use opus_encoder::OpusEncoder;
pub use simulated::SimulatedBackend;
pub use wav_encoder::{encode_to_pcm16, encode_to_wav};

/// Create the backend for the current host
pub fn create_backend() -> CpalBackend {
    CpalBackend::new()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
