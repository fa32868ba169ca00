//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::recording::AudioEncoder;

/// audio-recorder - record audio from an input device
#[derive(Parser, Debug)]
#[command(name = "audio-recorder")]
#[command(version)]
#[command(about = "Record audio from the microphone into WAV, FLAC, Opus, AAC or AMR")]
#[command(long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Timeout for each recorder operation (e.g., 10s, 500ms)
    #[arg(long, value_name = "TIME", global = true)]
    pub timeout: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record until the duration elapses or Ctrl+C is pressed
    Record(RecordArgs),
    /// List input devices
    Devices,
    /// Check microphone permission
    Permission,
    /// List encoders and whether they are supported here
    Encoders,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options of the `record` subcommand
#[derive(Args, Debug, Default)]
pub struct RecordArgs {
    /// Output file (defaults to a timestamped file in the output dir)
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Recording duration (e.g., 10s, 1m, 2m30s)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Encoder (aacLc, aacEld, aacHe, amrNb, amrWb, opus, flac, wav, pcm16bits)
    #[arg(short = 'e', long, value_name = "ENCODER")]
    pub encoder: Option<AudioEncoder>,

    /// Number of channels (1 or 2)
    #[arg(long, value_name = "N")]
    pub channels: Option<u16>,

    /// Sample rate in Hz
    #[arg(long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Bit rate in bits per second
    #[arg(long, value_name = "BPS")]
    pub bit_rate: Option<u32>,

    /// Input device id (see `devices`)
    #[arg(long, value_name = "ID")]
    pub device: Option<String>,

    /// Silence input below the noise floor
    #[arg(long)]
    pub suppress_noise: bool,

    /// Normalize the recording level
    #[arg(long)]
    pub auto_gain: bool,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "output_dir",
    "duration",
    "timeout",
    "device",
    "recorder.encoder",
    "recorder.channels",
    "recorder.sample_rate",
    "recorder.bit_rate",
    "recorder.suppress_noise",
    "recorder.cancel_echo",
    "recorder.auto_gain",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn record_parses_defaults() {
        let cli = Cli::parse_from(["audio-recorder", "record"]);
        assert!(!cli.verbose);
        let Commands::Record(args) = cli.command else {
            panic!("Expected Record command");
        };
        assert!(args.output.is_none());
        assert!(args.duration.is_none());
        assert!(args.encoder.is_none());
        assert!(!args.suppress_noise);
        assert!(!args.auto_gain);
    }

    #[test]
    fn record_parses_options() {
        let cli = Cli::parse_from([
            "audio-recorder",
            "record",
            "-o",
            "take.flac",
            "-d",
            "30s",
            "-e",
            "flac",
            "--channels",
            "1",
            "--sample-rate",
            "16000",
            "--auto-gain",
        ]);
        let Commands::Record(args) = cli.command else {
            panic!("Expected Record command");
        };
        assert_eq!(args.output, Some(PathBuf::from("take.flac")));
        assert_eq!(args.duration, Some("30s".to_string()));
        assert_eq!(args.encoder, Some(AudioEncoder::Flac));
        assert_eq!(args.channels, Some(1));
        assert_eq!(args.sample_rate, Some(16000));
        assert!(args.auto_gain);
    }

    #[test]
    fn encoder_accepts_wire_names() {
        let cli = Cli::parse_from(["audio-recorder", "record", "-e", "aacLc"]);
        let Commands::Record(args) = cli.command else {
            panic!("Expected Record command");
        };
        assert_eq!(args.encoder, Some(AudioEncoder::AacLc));
    }

    #[test]
    fn unknown_encoder_is_rejected() {
        assert!(Cli::try_parse_from(["audio-recorder", "record", "-e", "mp3"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["audio-recorder", "devices", "-v", "--timeout", "2s"]);
        assert!(cli.verbose);
        assert_eq!(cli.timeout, Some("2s".to_string()));
        assert!(matches!(cli.command, Commands::Devices));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["audio-recorder", "config", "set", "recorder.encoder", "opus"]);
        if let Commands::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "recorder.encoder");
            assert_eq!(value, "opus");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("duration"));
        assert!(is_valid_config_key("recorder.sample_rate"));
        assert!(!is_valid_config_key("recorder"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
