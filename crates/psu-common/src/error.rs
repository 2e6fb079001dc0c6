//! Unified error types for the local side of the workspace.
//!
//! Remote failures are modeled by `psu-client`; reconciliation sentinels by
//! `psu-deploy`. This enum covers what happens on this machine: files,
//! settings and (de)serialization.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum PsuError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid or missing.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A settings key that the settings file does not know about.
    #[error("unknown configuration key: {key} (try `psu setting list`)")]
    UnknownConfigKey {
        /// The rejected key.
        key: String,
    },

    /// The settings file is not valid YAML.
    #[error("settings file {path} is invalid: {source}")]
    Yaml {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PsuError>;
