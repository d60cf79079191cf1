//! dfixxer-hook - pre-commit hook for the dfixxer Delphi/Pascal formatter
//!
//! dfixxer-hook provides:
//! - Lookup of dfixxer on PATH or in the local cache
//! - Download of the pinned platform release from GitHub
//! - A single `dfixxer update` run over the staged files

use clap::Parser;
use std::process::ExitCode;

mod backends;
mod cache;
mod cli;
mod core;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    cli::init_logging(&cli);
    match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
