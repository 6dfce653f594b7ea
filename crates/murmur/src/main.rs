// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Murmur - answers Slack mentions with OpenAI chat completions.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Murmur - answers Slack mentions with OpenAI chat completions.
#[derive(Parser, Debug)]
#[command(name = "murmur", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the standard lookup hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll continuously and expire old state in the background.
    Serve,
    /// Run exactly one poll cycle and exit.
    Poll,
    /// Validate the configuration and print the effective settings.
    CheckConfig {
        /// Also build the Slack and OpenAI adapters and report their health.
        #[arg(long)]
        health: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => murmur_config::load_and_validate_path(path),
        None => murmur_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            murmur_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Poll) => serve::run_poll(config).await,
        Some(Commands::CheckConfig { health }) => check::run_check_config(&config, health).await,
        None => {
            println!("murmur: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn config_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["murmur", "poll", "--config", "/tmp/murmur.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Poll)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/murmur.toml")));
    }

    #[test]
    fn check_config_subcommand_is_kebab_case() {
        let cli = Cli::try_parse_from(["murmur", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig { health: false })));

        let cli = Cli::try_parse_from(["murmur", "check-config", "--health"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig { health: true })));
    }
}
