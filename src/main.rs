//! audio-recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use audio_recorder::cli::{
    app::{
        load_config, record_args_config, resolve_timeout, run_devices, run_encoders,
        run_permission, run_record, EXIT_ERROR, EXIT_USAGE_ERROR,
    },
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    logging,
    presenter::Presenter,
};
use audio_recorder::domain::config::AppConfig;
use audio_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let presenter = Presenter::new();

    let cli_config = match &cli.command {
        Commands::Record(args) => record_args_config(args),
        _ => AppConfig::empty(),
    };

    let command = match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        other => other,
    };

    let config = load_config(cli_config).await;
    let timeout = match resolve_timeout(cli.timeout.as_deref(), &config) {
        Ok(t) => t,
        Err(e) => {
            presenter.error(&format!("Invalid timeout: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    match command {
        Commands::Record(args) => run_record(args, config, timeout).await,
        Commands::Devices => run_devices(timeout).await,
        Commands::Permission => run_permission(timeout).await,
        Commands::Encoders => run_encoders(timeout).await,
        Commands::Config { .. } => ExitCode::SUCCESS,
    }
}
