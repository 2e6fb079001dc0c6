//! `psu stack` — Deploy, list, inspect, remove stacks and set their access.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use psu_client::PortainerApi;
use psu_client::api::StackListFilter;
use psu_common::types::ResourceType;
use psu_deploy::resolver;
use psu_deploy::{DeployOutcome, DeployRequest, Deployer, EnvPolicy, RemoveOutcome};

use super::GlobalArgs;
use super::access::{self, AccessArgs};
use crate::env_file::load_env_file;
use crate::output::{self, OutputFormat};

/// Arguments for the `stack` command.
#[derive(Args, Debug)]
pub struct StackArgs {
    /// Stack action.
    #[command(subcommand)]
    pub command: StackCommand,
}

/// Stack actions.
#[derive(Subcommand, Debug)]
pub enum StackCommand {
    /// List stacks, all of them or those of one endpoint.
    #[command(alias = "ls")]
    List(ListArgs),
    /// Inspect a stack.
    Inspect(InspectArgs),
    /// Deploy a new stack or update an existing one.
    #[command(aliases = ["up", "create"])]
    Deploy(DeployArgs),
    /// Remove a stack.
    #[command(aliases = ["rm", "down"])]
    Remove(RemoveArgs),
    /// Set stack access control.
    Access(AccessArgs),
}

/// Arguments for `stack list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only stacks of this endpoint.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Output format.
    #[arg(long, default_value = "table", help = output::FORMAT_HELP)]
    pub format: OutputFormat,
}

/// Arguments for `stack inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Stack name.
    pub name: String,
    /// Endpoint name; required when more than one endpoint exists.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Output format.
    #[arg(long, default_value = "table", help = output::FORMAT_HELP)]
    pub format: OutputFormat,
}

/// Arguments for `stack deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Stack name.
    pub name: String,
    /// Stack file; required when the stack does not exist yet.
    #[arg(short = 'c', long)]
    pub stack_file: Option<PathBuf>,
    /// Dotenv file with the stack's environment variables.
    #[arg(short, long)]
    pub env_file: Option<PathBuf>,
    /// Replace the stack's environment variables instead of merging.
    #[arg(long)]
    pub replace_env: bool,
    /// Prune services no longer referenced (swarm stacks only).
    #[arg(short = 'r', long)]
    pub prune: bool,
    /// Endpoint name; required when more than one endpoint exists.
    #[arg(long)]
    pub endpoint: Option<String>,
}

/// Arguments for `stack remove`.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Stack name.
    pub name: String,
    /// Fail if the stack does not exist.
    #[arg(long)]
    pub strict: bool,
    /// Endpoint name; required when more than one endpoint exists.
    #[arg(long)]
    pub endpoint: Option<String>,
}

/// Executes the `stack` command.
///
/// # Errors
///
/// Returns an error if the action fails.
pub fn execute(global: &GlobalArgs, args: StackArgs) -> anyhow::Result<()> {
    match args.command {
        StackCommand::List(list) => execute_list(global, &list),
        StackCommand::Inspect(inspect) => execute_inspect(global, &inspect),
        StackCommand::Deploy(deploy) => execute_deploy(global, deploy),
        StackCommand::Remove(remove) => execute_remove(global, &remove),
        StackCommand::Access(access) => access::set_access(global, ResourceType::Stack, &access),
    }
}

fn execute_list(global: &GlobalArgs, args: &ListArgs) -> anyhow::Result<()> {
    let client = global.client()?;
    let stacks = match args.endpoint.as_deref() {
        Some(name) => {
            let endpoint = resolver::endpoint_by_name(&client, name)?;
            Deployer::new(&client).list(endpoint.id)?
        }
        None => client.stack_list(&StackListFilter::default())?,
    };
    output::emit(&args.format, &stacks, || output::stacks_table(&stacks))
}

fn execute_inspect(global: &GlobalArgs, args: &InspectArgs) -> anyhow::Result<()> {
    let client = global.client()?;
    let endpoint = resolver::endpoint_or_default(&client, args.endpoint.as_deref())?;
    let stack = Deployer::new(&client).find(&args.name, endpoint.id)?;
    output::emit(&args.format, &stack, || output::stack_details(&stack))
}

fn execute_deploy(global: &GlobalArgs, args: DeployArgs) -> anyhow::Result<()> {
    let env = match &args.env_file {
        Some(path) => load_env_file(path)?,
        None => Vec::new(),
    };
    let stack_file_content = match &args.stack_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read stack file {}", path.display()))?,
        ),
        None => None,
    };

    let client = global.client()?;
    let endpoint = resolver::endpoint_or_default(&client, args.endpoint.as_deref())?;
    let request = DeployRequest {
        name: args.name,
        endpoint_id: endpoint.id,
        stack_file_content,
        env,
        env_policy: EnvPolicy::from_replace_flag(args.replace_env),
        prune: args.prune,
    };

    match Deployer::new(&client).deploy(&request)? {
        DeployOutcome::Created(stack) => {
            tracing::debug!(stack = %stack.name, id = %stack.id, endpoint = %endpoint.name, "deployed");
        }
        DeployOutcome::Updated { id } => {
            tracing::debug!(stack = %request.name, %id, endpoint = %endpoint.name, "deployed");
        }
    }
    Ok(())
}

fn execute_remove(global: &GlobalArgs, args: &RemoveArgs) -> anyhow::Result<()> {
    let client = global.client()?;
    let endpoint = resolver::endpoint_or_default(&client, args.endpoint.as_deref())?;
    match Deployer::new(&client).remove(&args.name, endpoint.id, args.strict)? {
        RemoveOutcome::Removed { id } => tracing::debug!(stack = %args.name, %id, "removed"),
        RemoveOutcome::Absent => tracing::debug!(stack = %args.name, "nothing removed"),
    }
    Ok(())
}
