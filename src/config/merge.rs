//! Layer merging and CLI override application

use crate::domain::{ConnectionProfile, ConnectionSettings};
use serde_yaml::Value;

/// Deep-merge `overlay` onto `base`, returning the merged tree.
///
/// Mappings present on both sides merge key by key; for anything else the
/// overlay value replaces the base value, including explicit nulls.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Connection fields given explicitly on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub endpoint: Option<String>,
    pub port: Option<u16>,
    pub use_ssl: Option<bool>,
    pub verify: Option<bool>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl CliOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply these overrides onto `profile`, then fill what is still unset
    /// from [`ConnectionSettings::default`]. CLI values always win.
    pub fn apply(&self, profile: &ConnectionProfile) -> ConnectionSettings {
        let merged = merge_cli_with_config(profile.clone(), self.clone());
        let defaults = ConnectionSettings::default();
        ConnectionSettings {
            endpoint: merged.endpoint.unwrap_or(defaults.endpoint),
            port: merged.port.unwrap_or(defaults.port),
            use_ssl: merged.use_ssl.unwrap_or(defaults.use_ssl),
            verify: merged.verify.unwrap_or(defaults.verify),
            user: merged.user.or(defaults.user),
            password: merged.password.or(defaults.password),
        }
    }
}

/// Field-by-field override of a config profile with CLI values.
pub fn merge_cli_with_config(profile: ConnectionProfile, cli: CliOverrides) -> ConnectionProfile {
    ConnectionProfile {
        endpoint: cli.endpoint.or(profile.endpoint),
        port: cli.port.or(profile.port),
        use_ssl: cli.use_ssl.or(profile.use_ssl),
        verify: cli.verify.or(profile.verify),
        user: cli.user.or(profile.user),
        password: cli.password.or(profile.password),
    }
}
