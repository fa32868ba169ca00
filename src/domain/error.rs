//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>s, <number>m, or <number>m<number>s (e.g., 30s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when an unknown encoder name is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid encoder: \"{input}\". Valid encoders are: aacLc, aacEld, aacHe, amrNb, amrWb, opus, flac, wav, pcm16bits")]
pub struct InvalidEncoderError {
    pub input: String,
}

/// Error when a recorder configuration violates its invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("channels can either be 1 or 2, got {0}")]
    InvalidChannels(u16),

    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,

    #[error("bit rate must be greater than zero")]
    InvalidBitRate,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
