//! mojo: command-line client for Jojo script servers
//!
//! Resolves layered configuration into one or more endpoints and lists,
//! shows, runs or reloads the scripts each one hosts.

use anyhow::Result;

fn main() -> Result<()> {
    mojo::cli::run()
}
