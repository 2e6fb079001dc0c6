//! `psu status` — Show server status.

use clap::Args;
use psu_client::PortainerApi;

use super::GlobalArgs;
use crate::output::{self, OutputFormat};

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format.
    #[arg(long, default_value = "table", help = output::FORMAT_HELP)]
    pub format: OutputFormat,
}

/// Executes the `status` command.
///
/// # Errors
///
/// Returns an error if the status call fails.
pub fn execute(global: &GlobalArgs, args: &StatusArgs) -> anyhow::Result<()> {
    let client = global.client()?;
    let status = client.status()?;
    output::emit(&args.format, &status, || output::status_details(&status))
}
