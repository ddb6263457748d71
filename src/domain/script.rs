//! Script records as published by the server.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_HTTP_METHOD: &str = "POST";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    /// Older servers omit this; see [`Script::http_method`].
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub params: Option<Vec<ScriptParam>>,
    #[serde(default)]
    pub filtered_params: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub lock: Option<Lock>,
}

impl Script {
    /// Upper-cased HTTP method used to run this script.
    pub fn http_method(&self) -> String {
        self.http_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_HTTP_METHOD)
            .to_ascii_uppercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptParam {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Server lock setting; published either as a flag or as a lock name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Lock {
    Flag(bool),
    Named(String),
}

impl fmt::Display for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{}", b),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Body of `GET /scripts`.
#[derive(Debug, Deserialize)]
pub(crate) struct ScriptListing {
    #[serde(default)]
    pub scripts: BTreeMap<String, Script>,
}

impl ScriptListing {
    /// Scripts keyed by name, with missing `name` fields filled from the key.
    pub(crate) fn into_scripts(self) -> BTreeMap<String, Script> {
        self.scripts
            .into_iter()
            .map(|(key, mut script)| {
                if script.name.is_empty() {
                    script.name = key.clone();
                }
                (key, script)
            })
            .collect()
    }
}

/// Body of `OPTIONS /scripts/{name}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ScriptDetail {
    pub script: Script,
}
