//! `psu endpoint-group` — List and inspect endpoint groups.

use clap::{Args, Subcommand};
use psu_client::PortainerApi;
use psu_deploy::resolver;

use super::GlobalArgs;
use crate::output::{self, OutputFormat};

/// Arguments for the `endpoint-group` command.
#[derive(Args, Debug)]
pub struct EndpointGroupArgs {
    /// Endpoint group action.
    #[command(subcommand)]
    pub command: EndpointGroupCommand,
}

/// Endpoint group actions.
#[derive(Subcommand, Debug)]
pub enum EndpointGroupCommand {
    /// List endpoint groups.
    #[command(alias = "ls")]
    List {
        /// Output format.
        #[arg(long, default_value = "table", help = output::FORMAT_HELP)]
        format: OutputFormat,
    },
    /// Inspect an endpoint group.
    Inspect {
        /// Group name.
        name: String,
        /// Output format.
        #[arg(long, default_value = "table", help = output::FORMAT_HELP)]
        format: OutputFormat,
    },
}

/// Executes the `endpoint-group` command.
///
/// # Errors
///
/// Returns an error if the group cannot be found or a call fails.
pub fn execute(global: &GlobalArgs, args: EndpointGroupArgs) -> anyhow::Result<()> {
    let client = global.client()?;
    match args.command {
        EndpointGroupCommand::List { format } => {
            let groups = client.endpoint_group_list()?;
            output::emit(&format, &groups, || output::endpoint_groups_table(&groups))
        }
        EndpointGroupCommand::Inspect { name, format } => {
            let group = resolver::endpoint_group_by_name(&client, &name)?;
            output::emit(&format, &group, || {
                output::endpoint_groups_table(std::slice::from_ref(&group))
            })
        }
    }
}
