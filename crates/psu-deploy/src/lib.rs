//! # psu-deploy
//!
//! Reconcilers that turn a named request ("deploy stack `web` with this
//! file", "make `web` private") into the right sequence of remote calls.
//!
//! - [`resolver`]: find stacks, endpoints and groups by name; detect swarm.
//! - [`env`]: environment merge policy.
//! - [`deploy`]: create-or-update stack deployment, and stack removal.
//! - [`access`]: resource-control reconciliation.
//!
//! Everything is written against [`psu_client::PortainerApi`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod access;
pub mod deploy;
pub mod env;
pub mod error;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use access::{AccessOutcome, AccessRequest, Visibility};
pub use deploy::{DeployOutcome, DeployRequest, Deployer, RemoveOutcome};
pub use env::EnvPolicy;
pub use error::{AccessError, DeployError, ResolveError};
