use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};

use jsonmemo::{report_error, App, Cli, Config, NoteStore};

pub fn initialize_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    debug!("Logger initialized");
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            report_error(&err);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = cli.notes_file {
        config.notes_path = path;
    }
    info!("Using notes file {}", config.notes_path.display());

    let store = NoteStore::new(config.notes_path.clone(), config.validator());
    let app = App::new(store, config);

    match app.run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}
