//! `psu login` — Authenticate and store the token in the settings file.

use anyhow::Context;
use clap::Args;
use psu_common::config::PsuConfig;

use super::GlobalArgs;

/// Arguments for the `login` command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Also print the token to stdout.
    #[arg(long)]
    pub print: bool,
}

/// Executes the `login` command.
///
/// Always requests a fresh token, even when one is already configured, and
/// writes it to the settings file as `auth-token`.
///
/// # Errors
///
/// Returns an error if authentication fails or the settings file cannot be
/// written.
pub fn execute(global: &GlobalArgs, args: &LoginArgs) -> anyhow::Result<()> {
    let client = global.client()?;
    let token = client.authenticate().context("login failed")?;

    let path = global.config_path();
    let mut settings = PsuConfig::load(&path)?;
    settings.set("auth-token", &token)?;
    settings
        .save(&path)
        .with_context(|| format!("failed to save settings to {}", path.display()))?;
    tracing::info!(path = %path.display(), "auth token saved");

    if args.print {
        println!("{token}");
    }
    Ok(())
}
