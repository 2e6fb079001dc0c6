//! System-wide constants and default paths.

use std::path::PathBuf;

/// `User-Agent` header sent with every request.
pub const USER_AGENT: &str = concat!("psu/", env!("CARGO_PKG_VERSION"));

/// Path segment appended to the configured server URL.
pub const API_PREFIX: &str = "api/";

/// Authentication path, relative to the API prefix.
pub const AUTH_PATH: &str = "auth";

/// Name of the settings file looked up in the home directory.
pub const CONFIG_FILE_NAME: &str = ".psu.yaml";

/// Key path of the swarm cluster id inside a Docker `info` payload.
pub const SWARM_CLUSTER_ID_PATH: [&str; 3] = ["Swarm", "Cluster", "ID"];

/// Stack type discriminant for swarm stacks on the create endpoint.
pub const STACK_TYPE_SWARM: u8 = 1;

/// Stack type discriminant for compose stacks on the create endpoint.
pub const STACK_TYPE_COMPOSE: u8 = 2;

/// Returns the default settings file path: `$HOME/.psu.yaml`.
///
/// Falls back to the current directory when no home directory is known.
pub fn default_config_file() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
        .join(CONFIG_FILE_NAME)
}
