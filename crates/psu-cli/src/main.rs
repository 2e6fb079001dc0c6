//! # psu — Portainer stack utility
//!
//! Deploys, inspects and removes stacks, and manages resource access
//! control, through the Portainer API.

#![allow(clippy::print_stdout)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod commands;
mod env_file;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::{Cli, GlobalArgs};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.global);
    commands::execute(cli)
}

/// Logs go to stderr; `RUST_LOG` wins over the verbosity flags.
fn init_tracing(global: &GlobalArgs) {
    let default_level = if global.debug {
        "debug"
    } else if global.verbose {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
