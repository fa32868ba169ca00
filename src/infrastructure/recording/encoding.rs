//! Encoder dispatch for captured PCM audio

use std::path::PathBuf;

use thiserror::Error;
use tokio::fs;

use super::ffmpeg::FfmpegTranscoder;
use super::flac_encoder::encode_to_flac;
use super::wav_encoder::{encode_to_pcm16, encode_to_wav};
use crate::application::ports::BackendError;
use crate::domain::recording::{AudioData, AudioEncoder, RecorderConfiguration, RecordingArtifact};

/// Encoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("{0}")]
    Unsupported(String),

    #[error("WAV encoding failed: {0}")]
    Wav(String),

    #[error("FLAC config error: {0}")]
    FlacConfig(String),

    #[error("FLAC encode error: {0}")]
    FlacEncode(String),

    #[error("FLAC write error: {0}")]
    FlacWrite(String),

    #[cfg(feature = "opus")]
    #[error("Opus encode error: {0}")]
    OpusEncode(String),

    #[cfg(feature = "opus")]
    #[error("Ogg write error: {0}")]
    OggWrite(String),

    #[error("FFmpeg not found")]
    FfmpegNotFound,

    #[error("Transcoding failed: {0}")]
    Transcode(String),
}

impl From<EncodingError> for BackendError {
    fn from(err: EncodingError) -> Self {
        match err {
            EncodingError::Unsupported(message) => BackendError::UnsupportedConfiguration(message),
            EncodingError::FfmpegNotFound => BackendError::FfmpegNotFound,
            other => BackendError::EncodingFailed(other.to_string()),
        }
    }
}

/// Whether `encoder` is produced without an external transcoder
pub fn in_process_supported(encoder: AudioEncoder) -> bool {
    match encoder {
        AudioEncoder::Wav | AudioEncoder::Pcm16bits | AudioEncoder::Flac => true,
        AudioEncoder::Opus => cfg!(feature = "opus"),
        _ => false,
    }
}

/// Reject options the configured encoder cannot honor.
///
/// Runs at start so a take is never captured only to fail on stop.
pub fn check_options(configuration: &RecorderConfiguration) -> Result<(), EncodingError> {
    match configuration.encoder() {
        #[cfg(feature = "opus")]
        AudioEncoder::Opus => super::opus_encoder::check_format(
            configuration.sample_rate(),
            configuration.channels(),
        ),
        _ => Ok(()),
    }
}

/// Encode interleaved samples with an in-process encoder
#[cfg_attr(not(feature = "opus"), allow(unused_variables))]
pub fn encode_pcm(
    encoder: AudioEncoder,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
    bit_rate: u32,
) -> Result<Vec<u8>, EncodingError> {
    match encoder {
        AudioEncoder::Wav => encode_to_wav(samples, sample_rate, channels),
        AudioEncoder::Pcm16bits => Ok(encode_to_pcm16(samples)),
        AudioEncoder::Flac => encode_to_flac(samples, sample_rate, channels),
        #[cfg(feature = "opus")]
        AudioEncoder::Opus => {
            super::opus_encoder::OpusEncoder::new(sample_rate, channels, bit_rate)?
                .encode_to_ogg(samples)
        }
        other => Err(EncodingError::Unsupported(format!(
            "{} needs an external transcoder",
            other
        ))),
    }
}

/// Encode interleaved samples, going through FFmpeg for AAC and AMR
pub async fn encode(
    encoder: AudioEncoder,
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
    bit_rate: u32,
    transcoder: &FfmpegTranscoder,
) -> Result<Vec<u8>, BackendError> {
    if encoder.requires_transcoder() {
        let wav = encode_to_wav(&samples, sample_rate, channels)?;
        return Ok(transcoder.transcode(&wav, encoder, bit_rate).await?);
    }

    tokio::task::spawn_blocking(move || {
        encode_pcm(encoder, &samples, sample_rate, channels, bit_rate)
    })
    .await
    .map_err(|e| BackendError::EncodingFailed(format!("Encode task error: {}", e)))?
    .map_err(BackendError::from)
}

/// Write encoded audio to `output_path`, or keep it in memory when there is none
pub async fn write_artifact(
    bytes: Vec<u8>,
    encoder: AudioEncoder,
    output_path: Option<PathBuf>,
) -> Result<RecordingArtifact, BackendError> {
    let Some(path) = output_path else {
        return Ok(RecordingArtifact::Bytes(AudioData::new(
            bytes,
            encoder.mime_type(),
        )));
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| BackendError::WriteFailed(e.to_string()))?;
    }
    fs::write(&path, &bytes)
        .await
        .map_err(|e| BackendError::WriteFailed(format!("{}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), size = bytes.len(), "recording written");
    Ok(RecordingArtifact::File(path))
}
