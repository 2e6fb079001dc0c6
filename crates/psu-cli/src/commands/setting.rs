//! `psu setting` — Read and write the settings file.

use clap::{Args, Subcommand};
use psu_common::config::PsuConfig;

use super::GlobalArgs;
use crate::output;

const MASKED_KEYS: [&str; 2] = ["password", "auth-token"];

/// Arguments for the `setting` command.
#[derive(Args, Debug)]
pub struct SettingArgs {
    /// Setting action.
    #[command(subcommand)]
    pub command: SettingCommand,
}

/// Setting actions.
#[derive(Subcommand, Debug)]
pub enum SettingCommand {
    /// List every setting; secrets are masked.
    #[command(alias = "ls")]
    List,
    /// Print one setting.
    Get {
        /// Setting key, e.g. `url`.
        key: String,
    },
    /// Change one setting.
    Set {
        /// Setting key, e.g. `url`.
        key: String,
        /// New value.
        value: String,
    },
}

/// Executes the `setting` command.
///
/// Reads and writes the settings file only; flags and `PSU_*` variables are
/// not applied.
///
/// # Errors
///
/// Returns an error for unknown keys, invalid values, or file failures.
pub fn execute(global: &GlobalArgs, args: SettingArgs) -> anyhow::Result<()> {
    let path = global.config_path();
    let mut settings = PsuConfig::load(&path)?;
    match args.command {
        SettingCommand::List => {
            let rows: Vec<Vec<String>> = settings
                .list()
                .into_iter()
                .map(|(key, value)| vec![key.to_string(), display_value(key, value)])
                .collect();
            println!("{}", output::render_table(&["KEY", "VALUE"], &rows));
        }
        SettingCommand::Get { key } => {
            println!("{}", settings.get(&key)?.unwrap_or_default());
        }
        SettingCommand::Set { key, value } => {
            settings.set(&key, &value)?;
            settings.save(&path)?;
            tracing::info!(key = %key, path = %path.display(), "setting saved");
        }
    }
    Ok(())
}

fn display_value(key: &str, value: Option<String>) -> String {
    match value {
        None => "-".to_string(),
        Some(_) if MASKED_KEYS.contains(&key) => "********".to_string(),
        Some(value) => value,
    }
}
