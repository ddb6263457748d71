//! Configuration loading, merging and target resolution
//!
//! Layers are read system-wide, then from the user's home, then from
//! `--config`, deep-merged in that order, and resolved into concrete targets
//! with CLI flags taking precedence over file values (CLI > File > Defaults).

pub mod loader;
pub mod merge;
pub mod resolve;

pub use loader::{config_sources, load_config, ConfigSource};
pub use merge::{deep_merge, merge_cli_with_config, CliOverrides};
pub use resolve::{resolve_targets, EndpointSelector, ResolveError, Selector};
