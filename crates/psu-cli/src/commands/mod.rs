//! CLI command definitions and dispatch.

pub mod access;
pub mod endpoint;
pub mod endpoint_group;
pub mod login;
pub mod proxy;
pub mod setting;
pub mod stack;
pub mod status;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use psu_client::PortainerClient;
use psu_client::hooks::install_debug_hooks;
use psu_common::config::PsuConfig;
use psu_common::types::ResourceType;

/// psu — deploy and manage Portainer stacks.
#[derive(Parser, Debug)]
#[command(name = "psu", version, about, long_about = None)]
pub struct Cli {
    /// Connection and logging flags shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to the settings file (default: $HOME/.psu.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log progress information.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log every request and response.
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Skip TLS certificate verification.
    #[arg(short, long, global = true, env = "PSU_INSECURE")]
    pub insecure: bool,

    /// Portainer URL, without the /api suffix.
    #[arg(short = 'l', long, global = true, env = "PSU_URL")]
    pub url: Option<String>,

    /// Username.
    #[arg(short, long, global = true, env = "PSU_USER")]
    pub user: Option<String>,

    /// Password.
    #[arg(short, long, global = true, env = "PSU_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Previously obtained auth token; skips authentication.
    #[arg(
        short = 'A',
        long,
        global = true,
        env = "PSU_AUTH_TOKEN",
        hide_env_values = true
    )]
    pub auth_token: Option<String>,

    /// Request timeout, like 100ms, 30s or 1h20m (0s waits forever).
    #[arg(
        short,
        long,
        global = true,
        env = "PSU_TIMEOUT",
        value_parser = humantime::parse_duration
    )]
    pub timeout: Option<Duration>,
}

impl GlobalArgs {
    /// Settings file location.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(psu_common::constants::default_config_file)
    }

    /// Settings given on the command line or through `PSU_*` variables.
    pub fn overrides(&self) -> PsuConfig {
        PsuConfig {
            url: self.url.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            auth_token: self.auth_token.clone(),
            insecure: self.insecure.then_some(true),
            timeout: self.timeout,
        }
    }

    /// Effective settings: flags and env over the settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read.
    pub fn settings(&self) -> anyhow::Result<PsuConfig> {
        let path = self.config_path();
        let file = PsuConfig::load(&path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?;
        Ok(file.merge(self.overrides()))
    }

    /// Builds an API client from the effective settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are incomplete or the client cannot
    /// be initialized.
    pub fn client(&self) -> anyhow::Result<PortainerClient> {
        let config = self.settings()?.client_config()?;
        let mut client = PortainerClient::new(&config)?;
        if self.debug {
            install_debug_hooks(client.transport_mut());
        }
        Ok(client)
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the auth token in the settings file.
    Login(login::LoginArgs),
    /// Show server status.
    Status(status::StatusArgs),
    /// Inspect endpoints.
    Endpoint(endpoint::EndpointArgs),
    /// Inspect endpoint groups.
    EndpointGroup(endpoint_group::EndpointGroupArgs),
    /// Deploy, inspect and remove stacks.
    Stack(stack::StackArgs),
    /// Manage container access control.
    Container(access::DockerResourceArgs),
    /// Manage service access control.
    Service(access::DockerResourceArgs),
    /// Manage volume access control.
    Volume(access::DockerResourceArgs),
    /// Manage network access control.
    Network(access::DockerResourceArgs),
    /// Manage secret access control.
    Secret(access::DockerResourceArgs),
    /// Manage Docker config access control.
    Config(access::DockerResourceArgs),
    /// Start an HTTP proxy to an endpoint's Docker API.
    Proxy(proxy::ProxyArgs),
    /// Read and write the settings file.
    Setting(setting::SettingArgs),
    /// Print a shell completion script.
    Completion(CompletionArgs),
}

/// Arguments for the `completion` command.
#[derive(Args, Debug)]
#[command(after_help = "Load it in bash with: source <(psu completion bash)")]
pub struct CompletionArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let global = cli.global;
    match cli.command {
        Command::Login(args) => login::execute(&global, &args),
        Command::Status(args) => status::execute(&global, &args),
        Command::Endpoint(args) => endpoint::execute(&global, args),
        Command::EndpointGroup(args) => endpoint_group::execute(&global, args),
        Command::Stack(args) => stack::execute(&global, args),
        Command::Container(args) => access::execute(&global, ResourceType::Container, args),
        Command::Service(args) => access::execute(&global, ResourceType::Service, args),
        Command::Volume(args) => access::execute(&global, ResourceType::Volume, args),
        Command::Network(args) => access::execute(&global, ResourceType::Network, args),
        Command::Secret(args) => access::execute(&global, ResourceType::Secret, args),
        Command::Config(args) => access::execute(&global, ResourceType::Config, args),
        Command::Proxy(args) => proxy::execute(&global, &args),
        Command::Setting(args) => setting::execute(&global, args),
        Command::Completion(args) => {
            completion(args.shell, &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Writes the completion script for `shell`.
pub fn completion(shell: Shell, out: &mut dyn Write) {
    let mut command = Cli::command();
    clap_complete::generate(shell, &mut command, "psu", out);
}
