//! mojo: a command-line client and thin library for Jojo script servers
//!
//! Configuration layers are merged and resolved into connection targets, and
//! each target is driven through a [`client::RemoteClient`] that lists,
//! inspects, runs or reloads the scripts the server hosts.

pub mod cli;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod render;
pub mod utils;
