use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "summerlog")]
#[command(about = "Summarize container logs with an LLM and email the digest", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding config.toml and state.toml
    #[arg(long, global = true, env = "SUMMERLOG_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect, redact, summarize and email (what the schedule invokes)
    Run {
        /// Collect and redact only; report what would be sent
        #[arg(long)]
        dry_run: bool,
    },

    /// Interactive setup: credentials, mail, schedule
    Configure {
        /// Use the terminal prompts even when a desktop is available
        #[arg(long)]
        no_gui: bool,
    },

    /// Show configuration and run state
    Status,
}
