//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`activate`] - Activate an identity and start tracking
//! - [`classify`] - One-off zone lookup for a coordinate
//! - [`config`] - Configuration management (path, show, init)
//! - [`reset`] - Forget the stored identity
//! - [`run`] - Resume tracking for the stored identity
//! - [`tracking`] - Foreground loop shared by `activate` and `run`

pub mod activate;
pub mod classify;
pub mod common;
pub mod config;
pub mod reset;
pub mod run;
pub mod tracking;
