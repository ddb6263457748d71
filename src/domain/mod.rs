//! Core data types shared by config resolution, the remote client and the CLI.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;

pub mod script;

pub use script::{Lock, Script, ScriptParam};

pub const DEFAULT_ENDPOINT: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_USE_SSL: bool = false;
pub const DEFAULT_VERIFY: bool = true;

/// Merged configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Environment name -> endpoint name -> connection profile
    #[serde(default, deserialize_with = "null_as_default")]
    pub environments: BTreeMap<String, BTreeMap<String, ConnectionProfile>>,

    /// Group name -> environment names, in declaration order
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub default_environment: Option<String>,

    #[serde(default)]
    pub default_endpoint: Option<String>,
}

/// One endpoint as written in a config file. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionProfile {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub use_ssl: Option<bool>,
    #[serde(default)]
    pub verify: Option<bool>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A connection profile with every field decided.
///
/// Produced by [`crate::config::CliOverrides::apply`]; `user` and `password`
/// stay optional because "no credentials" is their documented default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub endpoint: String,
    pub port: u16,
    pub use_ssl: bool,
    pub verify: bool,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            port: DEFAULT_PORT,
            use_ssl: DEFAULT_USE_SSL,
            verify: DEFAULT_VERIFY,
            user: None,
            password: None,
        }
    }
}

impl ConnectionSettings {
    /// `scheme://endpoint:port`, https only when `use_ssl` is set.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.endpoint, self.port)
    }

    /// Credentials are sent only when both user and password are non-empty.
    pub fn auth_enabled(&self) -> bool {
        matches!((&self.user, &self.password), (Some(u), Some(p)) if !u.is_empty() && !p.is_empty())
    }
}

/// One endpoint selected for this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// `None` for the ad-hoc target built purely from CLI flags
    pub environment: Option<String>,
    pub name: String,
    pub settings: ConnectionSettings,
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.environment {
            Some(env) => write!(f, "{}/{}", env, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
