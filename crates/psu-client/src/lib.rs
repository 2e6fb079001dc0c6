//! # psu-client
//!
//! Blocking client for the Portainer REST API.
//!
//! Layers, leaf first:
//! - **Transport**: one HTTP round trip with before/after hooks and uniform
//!   error classification ([`transport::Transport`]).
//! - **Client**: bearer-token session on top of the transport, plus one typed
//!   method per remote capability ([`client::PortainerClient`]).
//! - **Api**: the [`api::PortainerApi`] trait the reconcilers are written
//!   against.
//! - **Hooks**: ready-made tracing hooks.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod api;
pub mod client;
pub mod error;
pub mod hooks;
pub mod transport;

pub use api::PortainerApi;
pub use client::PortainerClient;
pub use error::ClientError;
