//! # foodie
//!
//! Terminal front end for the recipe collection.
//!
//! ```text
//! foodie [--config PATH] [--recipes PATH] [--json] <command>
//!
//!   recipes      list, filter, search and sort
//!   categories   list categories with counts
//!   favorite     toggle a favorite
//!   favorites    list favorites
//!   subscribe    join the newsletter
//!   config       print the effective configuration
//! ```

mod cli;
mod commands;
mod config;
mod context;
mod error;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::error::CliResult;

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,foodie_cli=info,foodie_core=info,foodie_db=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> CliResult<String> {
    let config = AppConfig::for_run(cli.config.clone())?;
    commands::run(cli, config).await
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(output) => {
            if output.ends_with('\n') {
                print!("{}", output);
            } else {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
