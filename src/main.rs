//! pertgnn CLI
//!
//! # Usage
//!
//! ```bash
//! # Train from config
//! pertgnn train run.yaml
//!
//! # Train with overrides
//! pertgnn train run.yaml --epochs 10 --lr 0.001 --output-dir runs/norman
//!
//! # Validate config
//! pertgnn validate run.yaml --detailed
//!
//! # Show config info
//! pertgnn info run.yaml --format yaml
//! ```
//!
//! Training progress goes through `log`; set `RUST_LOG` to override the
//! level chosen by `--quiet` / `--verbose`.

use clap::Parser;
use pertgnn::cli::{run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = LogLevel::from_flags(cli.quiet, cli.verbose);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.default_filter()))
        .format_timestamp_secs()
        .init();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
