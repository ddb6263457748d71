//! Config file loading

use crate::config::merge::deep_merge;
use crate::domain::Config;
use crate::utils::paths::{expand_home, home_dir};
use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/mojo.yml";
pub const USER_CONFIG_NAME: &str = ".mojo.yml";

/// One configuration layer to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// Supplied by the user with `--config`. Parse errors in explicit
    /// sources are fatal; in implicit ones they are skipped with a warning.
    pub explicit: bool,
}

impl ConfigSource {
    pub fn implicit(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), explicit: false }
    }

    pub fn explicit(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), explicit: true }
    }
}

/// Sources in increasing precedence: system, user home, then `--config`.
pub fn config_sources(user_supplied: Option<&Path>) -> Vec<ConfigSource> {
    let mut sources = vec![ConfigSource::implicit(SYSTEM_CONFIG_PATH)];
    if let Some(home) = home_dir() {
        sources.push(ConfigSource::implicit(home.join(USER_CONFIG_NAME)));
    }
    if let Some(path) = user_supplied {
        sources.push(ConfigSource::explicit(expand_home(path)));
    }
    sources
}

/// Load and deep-merge `sources` in order. Missing files are skipped.
pub fn load_config(sources: &[ConfigSource]) -> Result<Config> {
    let mut merged = base_tree();

    for source in sources {
        match load_layer(source) {
            Ok(Some(layer)) => {
                tracing::debug!("Loaded config layer {}", source.path.display());
                merged = deep_merge(merged, layer);
            }
            Ok(None) => {
                tracing::debug!("Config layer {} not present, skipping", source.path.display());
            }
            Err(e) => {
                if source.explicit {
                    return Err(e);
                }
                tracing::warn!("Skipping unreadable config {}: {:#}", source.path.display(), e);
            }
        }
    }

    serde_yaml::from_value(merged).context("Invalid merged configuration")
}

/// `{environments: {}, default_environment: null}`
fn base_tree() -> Value {
    let mut base = Mapping::new();
    base.insert(Value::from("environments"), Value::Mapping(Mapping::new()));
    base.insert(Value::from("default_environment"), Value::Null);
    Value::Mapping(base)
}

/// Read one layer. `Ok(None)` means the file does not exist.
fn load_layer(source: &ConfigSource) -> Result<Option<Value>> {
    let path = &source.path;
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed reading config file: {}", path.display()))
        }
    };

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let layer = match ext.as_str() {
        "toml" => parse_toml_layer(&content, path)?,
        _ => parse_yaml_layer(&content, path)?,
    };

    match layer {
        // An empty file is an empty layer.
        Value::Null => Ok(Some(Value::Mapping(Mapping::new()))),
        Value::Mapping(_) => Ok(Some(layer)),
        _ => anyhow::bail!("Config file is not a mapping: {}", path.display()),
    }
}

fn parse_yaml_layer(content: &str, config_file: &Path) -> Result<Value> {
    serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))
}

fn parse_toml_layer(content: &str, config_file: &Path) -> Result<Value> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;
    serde_yaml::to_value(raw)
        .with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}
