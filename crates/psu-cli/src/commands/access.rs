//! `psu <resource> access` — Set resource access control.

use clap::{Args, Subcommand};
use psu_common::types::ResourceType;
use psu_deploy::access::{self, AccessOutcome, AccessRequest, Visibility};
use psu_deploy::resolver;

use super::GlobalArgs;

/// Access flags shared by stacks and Docker resources.
#[derive(Args, Debug)]
pub struct AccessArgs {
    /// Stack name, or Docker resource id or name.
    pub resource: String,

    /// Endpoint name; required when more than one endpoint exists.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Restrict access to administrators.
    #[arg(long)]
    pub admins: bool,

    /// Restrict access to the current user.
    #[arg(long)]
    pub private: bool,

    /// Allow access to every user.
    #[arg(long)]
    pub public: bool,
}

/// Arguments for a Docker resource command.
#[derive(Args, Debug)]
pub struct DockerResourceArgs {
    /// Resource action.
    #[command(subcommand)]
    pub command: DockerResourceCommand,
}

/// Docker resource actions.
#[derive(Subcommand, Debug)]
pub enum DockerResourceCommand {
    /// Set access control.
    Access(AccessArgs),
}

/// Executes a Docker resource command.
///
/// # Errors
///
/// Returns an error if the flags conflict or reconciliation fails.
pub fn execute(
    global: &GlobalArgs,
    resource_type: ResourceType,
    args: DockerResourceArgs,
) -> anyhow::Result<()> {
    match args.command {
        DockerResourceCommand::Access(access) => set_access(global, resource_type, &access),
    }
}

/// Validates the flags, then reconciles the resource's access control.
///
/// # Errors
///
/// Returns an error if the flags conflict, the endpoint or resource cannot
/// be resolved, or a call fails.
pub fn set_access(
    global: &GlobalArgs,
    resource_type: ResourceType,
    args: &AccessArgs,
) -> anyhow::Result<()> {
    let visibility = Visibility::from_flags(args.admins, args.private, args.public)?;
    let client = global.client()?;
    let endpoint = resolver::endpoint_or_default(&client, args.endpoint.as_deref())?;

    let outcome = access::set_access(
        &client,
        &AccessRequest {
            resource_type,
            resource_id: args.resource.clone(),
            endpoint_id: endpoint.id,
            visibility,
        },
    )?;
    match outcome {
        AccessOutcome::Created(control) | AccessOutcome::Updated(control) => {
            tracing::debug!(control = %control.id, "access control stored");
        }
        AccessOutcome::Removed(id) => tracing::debug!(control = %id, "access control removed"),
        AccessOutcome::Unchanged => tracing::debug!("no access control to change"),
    }
    Ok(())
}
