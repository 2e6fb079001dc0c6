//! `psu endpoint` — List and inspect endpoints.

use clap::{Args, Subcommand};
use psu_client::PortainerApi;
use psu_deploy::resolver;

use super::GlobalArgs;
use crate::output::{self, OutputFormat};

/// Arguments for the `endpoint` command.
#[derive(Args, Debug)]
pub struct EndpointArgs {
    /// Endpoint action.
    #[command(subcommand)]
    pub command: EndpointCommand,
}

/// Endpoint actions.
#[derive(Subcommand, Debug)]
pub enum EndpointCommand {
    /// List endpoints.
    #[command(alias = "ls")]
    List {
        /// Output format.
        #[arg(long, default_value = "table", help = output::FORMAT_HELP)]
        format: OutputFormat,
    },
    /// Inspect an endpoint; without a name, the only endpoint.
    Inspect {
        /// Endpoint name.
        name: Option<String>,
        /// Output format.
        #[arg(long, default_value = "table", help = output::FORMAT_HELP)]
        format: OutputFormat,
    },
}

/// Executes the `endpoint` command.
///
/// # Errors
///
/// Returns an error if the endpoint cannot be resolved or a call fails.
pub fn execute(global: &GlobalArgs, args: EndpointArgs) -> anyhow::Result<()> {
    let client = global.client()?;
    match args.command {
        EndpointCommand::List { format } => {
            let endpoints = client.endpoint_list()?;
            output::emit(&format, &endpoints, || output::endpoints_table(&endpoints))
        }
        EndpointCommand::Inspect { name, format } => {
            let endpoint = resolver::endpoint_or_default(&client, name.as_deref())?;
            output::emit(&format, &endpoint, || {
                output::endpoints_table(std::slice::from_ref(&endpoint))
            })
        }
    }
}
