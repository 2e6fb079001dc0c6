//! # psu-common
//!
//! Shared types, error definitions, settings and constants used across the
//! Portainer Stack Utils workspace.
//!
//! This crate is the leaf of the dependency graph. It knows nothing about
//! HTTP; it only describes the remote resources and the local settings file.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
