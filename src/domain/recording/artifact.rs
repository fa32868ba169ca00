//! Recorded audio artifact value objects

use std::fmt;
use std::path::{Path, PathBuf};

/// Supported audio MIME types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioMimeType {
    Ogg,
    #[default]
    Wav,
    Flac,
    Mp4,
    Amr,
    AmrWb,
    Pcm,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ogg => "audio/ogg",
            Self::Wav => "audio/wav",
            Self::Flac => "audio/flac",
            Self::Mp4 => "audio/mp4",
            Self::Amr => "audio/amr",
            Self::AmrWb => "audio/amr-wb",
            Self::Pcm => "audio/L16",
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value object representing encoded audio held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioData {
    data: Vec<u8>,
    mime_type: AudioMimeType,
}

impl AudioData {
    /// Create AudioData from raw bytes
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self { data, mime_type }
    }

    /// Create AudioData from a byte slice
    pub fn from_bytes(data: &[u8], mime_type: AudioMimeType) -> Self {
        Self {
            data: data.to_vec(),
            mime_type,
        }
    }

    /// Get the raw audio data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the raw audio data
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Get the MIME type
    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        human_readable_size(self.size_bytes() as u64)
    }

    /// Encode the audio data as base64
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Encode the audio data as a `data:` URL
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Reference to the audio produced by a finished recording.
///
/// Desktop and mobile backends write a file; in-memory hosts hand back the
/// encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingArtifact {
    File(PathBuf),
    Bytes(AudioData),
}

impl RecordingArtifact {
    /// Path of the recording, if it was written to disk
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Bytes(_) => None,
        }
    }

    /// In-memory audio, if the recording was not written to disk
    pub fn audio(&self) -> Option<&AudioData> {
        match self {
            Self::File(_) => None,
            Self::Bytes(audio) => Some(audio),
        }
    }

    /// Whether the artifact holds no audio.
    ///
    /// For files this checks the size on disk; a missing file is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::File(path) => std::fs::metadata(path)
                .map(|m| m.len() == 0)
                .unwrap_or(true),
            Self::Bytes(audio) => audio.size_bytes() == 0,
        }
    }
}

impl fmt::Display for RecordingArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Bytes(audio) => write!(
                f,
                "<{} in memory, {}>",
                audio.mime_type(),
                audio.human_readable_size()
            ),
        }
    }
}

/// Format a byte count for humans
pub fn human_readable_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
