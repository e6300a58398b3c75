mod cli;
mod commands;
mod wizard;

use clap::Parser;
use std::process::ExitCode;
use summerlog_config::ConfigStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr so scheduler captures keep stdout for results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let store = match cli.config_dir {
        Some(dir) => ConfigStore::new(dir),
        None => ConfigStore::from_default_location(),
    };

    let result = match cli.command {
        cli::Commands::Run { dry_run } => commands::run::handle(&store, dry_run).await,
        cli::Commands::Configure { no_gui } => commands::configure::handle(&store, no_gui),
        cli::Commands::Status => commands::status::handle(&store),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(commands::exit_code_for(&e))
        }
    }
}
