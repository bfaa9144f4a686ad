// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wicket - queue coordination and notification dispatch for walk-in service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod config_cmd;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wicket_config::{ConfigError, WicketConfig};

/// Wicket - queue coordination and notification dispatch for walk-in service.
#[derive(Parser, Debug)]
#[command(name = "wicket", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the queue engine, delivery loop and HTTP gateway.
    Serve,
    /// Inspect Wicket configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate the configuration and print a summary.
    Check,
    /// Print the effective configuration as TOML, secrets redacted.
    Show,
}

fn load(path: Option<&PathBuf>) -> Result<WicketConfig, Vec<ConfigError>> {
    match path {
        Some(path) => wicket_config::load_and_validate_path(path),
        None => wicket_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            wicket_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Config { action }) => match action {
            ConfigCommands::Check => {
                config_cmd::run_check(&config);
                Ok(())
            }
            ConfigCommands::Show => config_cmd::run_show(&config),
        },
        None => {
            println!("wicket: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
