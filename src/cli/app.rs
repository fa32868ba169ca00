//! Command runners
//!
//! Each runner mounts an [`AudioRecorder`] over the host backend in a
//! fresh [`ServiceCollection`] and drives it for one command.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use crate::application::ports::{ConfigStore, RecorderBackend};
use crate::application::{AudioRecorder, RecorderError, ServiceCollection};
use crate::domain::config::{AppConfig, RecorderSection};
use crate::domain::error::DurationParseError;
use crate::domain::platform::Platform;
use crate::domain::recording::{AudioEncoder, Duration, RecorderConfiguration};
use crate::infrastructure::{create_backend, XdgConfigStore};

use super::args::RecordArgs;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding `output_dir`
pub const ENV_OUTPUT_DIR: &str = "AUDIO_RECORDER_OUTPUT_DIR";
/// Environment variable overriding `device`
pub const ENV_DEVICE: &str = "AUDIO_RECORDER_DEVICE";

/// How often the recording spinner refreshes
const PROGRESS_TICK: StdDuration = StdDuration::from_millis(100);

/// Register a recorder over `backend` in a new collection for this host
pub fn mount_recorder<B: RecorderBackend + 'static>(
    backend: B,
    configuration: RecorderConfiguration,
) -> (ServiceCollection, Arc<AudioRecorder<B>>) {
    let mut services = ServiceCollection::new(Platform::current());
    let recorder = Arc::new(AudioRecorder::with_configuration(backend, configuration));
    services.register(Arc::clone(&recorder));
    (services, recorder)
}

/// Build the config layer contributed by `record` flags
pub fn record_args_config(args: &RecordArgs) -> AppConfig {
    let recorder = RecorderSection {
        encoder: args.encoder.map(|e| e.to_string()),
        channels: args.channels,
        sample_rate: args.sample_rate,
        bit_rate: args.bit_rate,
        suppress_noise: args.suppress_noise.then_some(true),
        cancel_echo: None,
        auto_gain: args.auto_gain.then_some(true),
    };
    AppConfig {
        duration: args.duration.clone(),
        device: args.device.clone(),
        recorder: (recorder != RecorderSection::default()).then_some(recorder),
        ..Default::default()
    }
}

/// Resolve the per-operation timeout from the flag or the config
pub fn resolve_timeout(
    flag: Option<&str>,
    config: &AppConfig,
) -> Result<StdDuration, DurationParseError> {
    match flag {
        Some(value) => value.parse::<Duration>().map(|d| d.as_std()),
        None => Ok(config.timeout_or_default().as_std()),
    }
}

/// Default output file: `recording-<unix millis>.<ext>` under `dir`
pub fn default_output_path(dir: &Path, encoder: AudioEncoder) -> PathBuf {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    dir.join(format!("recording-{}.{}", timestamp, encoder.extension()))
}

/// Run the `record` command
pub async fn run_record(args: RecordArgs, config: AppConfig, timeout: StdDuration) -> ExitCode {
    let mut presenter = Presenter::new();

    let configuration = match config.recorder_configuration() {
        Ok(c) => c,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };
    let duration = match config.duration.as_deref().map(str::parse::<Duration>) {
        Some(Ok(d)) => d,
        Some(Err(e)) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        None => Duration::default_duration(),
    };
    let output = args.output.unwrap_or_else(|| {
        default_output_path(&config.output_dir_or_default(), configuration.encoder())
    });

    let shutdown = ShutdownSignal::new();
    shutdown.setup();

    let (_services, recorder) = mount_recorder(create_backend(), configuration);

    if let Err(e) = recorder
        .start_recording(Some(output), None, Some(timeout))
        .await
    {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let total_ms = duration.as_millis();
    let started = Instant::now();
    presenter.start_spinner("Recording...");

    let mut ticker = tokio::time::interval(PROGRESS_TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.wait() => break,
        }
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if elapsed_ms >= total_ms {
            break;
        }
        presenter.update_recording_progress(recorder.state(), elapsed_ms, total_ms);
    }

    presenter.update_spinner("Saving...");
    match recorder.stop_recording(Some(timeout)).await {
        Ok(Some(artifact)) => {
            presenter.spinner_success(&format!("Recording saved ({})", artifact));
            presenter.artifact(&artifact);
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(None) => {
            presenter.spinner_fail("Recording produced no audio");
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            presenter.spinner_fail(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the `devices` command
pub async fn run_devices(timeout: StdDuration) -> ExitCode {
    let presenter = Presenter::new();
    let (_services, recorder) = mount_recorder(create_backend(), RecorderConfiguration::default());

    match recorder.get_input_devices(Some(timeout)).await {
        Ok(devices) if devices.is_empty() => {
            presenter.warn("No input devices found");
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(devices) => {
            for device in devices {
                presenter.output(&format!("{}\t{}", device.id, device.label));
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => fail(&presenter, &e),
    }
}

/// Run the `permission` command
pub async fn run_permission(timeout: StdDuration) -> ExitCode {
    let presenter = Presenter::new();
    let (_services, recorder) = mount_recorder(create_backend(), RecorderConfiguration::default());

    match recorder.has_permission(Some(timeout)).await {
        Ok(granted) => {
            presenter.output(&granted.to_string());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => fail(&presenter, &e),
    }
}

/// Run the `encoders` command
pub async fn run_encoders(timeout: StdDuration) -> ExitCode {
    let presenter = Presenter::new();
    let (_services, recorder) = mount_recorder(create_backend(), RecorderConfiguration::default());

    for encoder in AudioEncoder::ALL {
        match recorder.is_supported_encoder(encoder, Some(timeout)).await {
            Ok(supported) => presenter.key_value(
                encoder.as_str(),
                if supported { "supported" } else { "unsupported" },
            ),
            Err(e) => return fail(&presenter, &e),
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}

fn fail(presenter: &Presenter, error: &RecorderError) -> ExitCode {
    presenter.error(&error.to_string());
    ExitCode::from(EXIT_ERROR)
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config<S: ConfigStore>(store: &S, cli_config: AppConfig) -> AppConfig {
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, path = %store.path().display(), "ignoring config file");
            AppConfig::empty()
        }
    };

    let env_config = AppConfig {
        output_dir: env::var(ENV_OUTPUT_DIR).ok().filter(|s| !s.is_empty()),
        device: env::var(ENV_DEVICE).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Load the merged config from the default XDG location
pub async fn load_config(cli_config: AppConfig) -> AppConfig {
    load_merged_config(&XdgConfigStore::new(), cli_config).await
}
