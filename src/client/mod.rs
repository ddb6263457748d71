//! Remote client for a single Jojo server
//!
//! A [`RemoteClient`] owns one session: the base URL, credentials, the
//! `unauthorized` flag and the cached script lexicon. Clients share nothing.

use crate::domain::script::{ScriptDetail, ScriptListing};
use crate::domain::{ConnectionSettings, Script};
use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::ValueEnum;
use reqwest::Method;
use std::collections::BTreeMap;
use thiserror::Error;

#[cfg(test)]
pub(crate) mod scripted;
pub mod transport;

pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No script named {0} exists on the server")]
    ScriptNotFound(String),

    #[error("Malformed response from {path}")]
    MalformedResponse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Script {script} declares an invalid HTTP method: {method}")]
    InvalidMethod { script: String, method: String },
}

/// Boolean operator for a server-side tag filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TagMode {
    /// Scripts carrying every tag
    And,
    /// Scripts carrying any of the tags
    Or,
    /// Scripts carrying none of the tags
    Not,
}

impl TagMode {
    pub fn query_key(self) -> &'static str {
        match self {
            Self::And => "tags",
            Self::Or => "any_tags",
            Self::Not => "not_tags",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub mode: TagMode,
    pub tags: Vec<String>,
}

/// Result of `POST /reload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Reloaded,
    Unauthorized,
    UnexpectedStatus(u16),
}

pub struct RemoteClient<T: Transport = HttpTransport> {
    base_url: String,
    auth_header: Option<String>,
    unauthorized: bool,
    scripts: BTreeMap<String, Script>,
    transport: T,
}

impl RemoteClient<HttpTransport> {
    /// Connect over HTTP(S) and fetch the script lexicon.
    pub fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let transport = HttpTransport::new(settings.verify)?;
        Self::with_transport(settings, transport)
    }
}

impl<T: Transport> RemoteClient<T> {
    /// Build a client over `transport` and fetch the script lexicon.
    ///
    /// A 401 or any other non-200 answer leaves the cache empty; only
    /// transport failures and undecodable bodies are errors.
    pub fn with_transport(settings: &ConnectionSettings, transport: T) -> Result<Self> {
        let auth_header = settings.auth_enabled().then(|| {
            let user = settings.user.as_deref().unwrap_or_default();
            let password = settings.password.as_deref().unwrap_or_default();
            format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
        });

        let mut client = Self {
            base_url: settings.base_url(),
            auth_header,
            unauthorized: false,
            scripts: BTreeMap::new(),
            transport,
        };
        client.scripts = client.fetch_scripts(None)?;
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth_header.is_some()
    }

    /// True once any response with status 401 has been seen. Never resets.
    pub fn is_unauthorized(&self) -> bool {
        self.unauthorized
    }

    pub fn scripts(&self) -> &BTreeMap<String, Script> {
        &self.scripts
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Script names: all cached names, or the server's answer to a tag filter.
    pub fn list(&mut self, filter: Option<&TagFilter>) -> Result<Vec<String>> {
        match filter {
            None => Ok(self.scripts.keys().cloned().collect()),
            Some(filter) => Ok(self.fetch_scripts(Some(filter))?.into_keys().collect()),
        }
    }

    /// Look a script up in the cache, or ask the server when `use_cache` is
    /// false. A live answer replaces the cached entry.
    pub fn get_script(&mut self, name: &str, use_cache: bool) -> Result<Option<&Script>> {
        if use_cache {
            return Ok(self.scripts.get(name));
        }

        let path = format!("/scripts/{}", name);
        let response = self.call(Method::OPTIONS, &path, None)?;
        if !response.is_success() {
            tracing::debug!("Live lookup of {} returned {}", name, response.status);
            return Ok(None);
        }

        let detail: ScriptDetail = response
            .json()
            .map_err(|source| ClientError::MalformedResponse { path: path.clone(), source })?;
        let mut script = detail.script;
        if script.name.is_empty() {
            script.name = name.to_string();
        }
        self.scripts.insert(name.to_string(), script);
        Ok(self.scripts.get(name))
    }

    /// Run a script with `params` as a JSON object body (no body when empty).
    ///
    /// Unknown scripts are looked up live first to learn their HTTP method.
    /// The raw response is returned whatever its status.
    pub fn run(&mut self, name: &str, params: &BTreeMap<String, String>) -> Result<HttpResponse> {
        if !self.scripts.contains_key(name) && self.get_script(name, false)?.is_none() {
            return Err(ClientError::ScriptNotFound(name.to_string()).into());
        }
        let method_name = self
            .scripts
            .get(name)
            .map(Script::http_method)
            .ok_or_else(|| ClientError::ScriptNotFound(name.to_string()))?;
        let method = Method::from_bytes(method_name.as_bytes()).map_err(|_| {
            ClientError::InvalidMethod { script: name.to_string(), method: method_name.clone() }
        })?;

        let body = if params.is_empty() { None } else { Some(serde_json::to_string(params)?) };
        self.call(method, &format!("/scripts/{}", name), body)
    }

    /// Ask the server to rescan its scripts; on success the cache is
    /// replaced with a fresh lexicon.
    pub fn reload(&mut self) -> Result<ReloadOutcome> {
        let response = self.call(Method::POST, "/reload", None)?;
        match response.status {
            200 => {
                self.scripts = self.fetch_scripts(None)?;
                Ok(ReloadOutcome::Reloaded)
            }
            401 => Ok(ReloadOutcome::Unauthorized),
            status => Ok(ReloadOutcome::UnexpectedStatus(status)),
        }
    }

    fn fetch_scripts(&mut self, filter: Option<&TagFilter>) -> Result<BTreeMap<String, Script>> {
        let path = match filter {
            Some(filter) => {
                format!("/scripts?{}={}", filter.mode.query_key(), filter.tags.join(","))
            }
            None => "/scripts".to_string(),
        };

        let response = self.call(Method::GET, &path, None)?;
        if !response.is_success() {
            tracing::debug!("{} returned {}; no scripts", path, response.status);
            return Ok(BTreeMap::new());
        }

        let listing: ScriptListing = response
            .json()
            .map_err(|source| ClientError::MalformedResponse { path, source })?;
        Ok(listing.into_scripts())
    }

    fn call(&mut self, method: Method, path: &str, body: Option<String>) -> Result<HttpResponse> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(auth) = &self.auth_header {
            headers.push(("Authorization".to_string(), auth.clone()));
        }
        let request =
            HttpRequest { method, url: format!("{}{}", self.base_url, path), headers, body };

        tracing::debug!("{} {}", request.method, request.url);
        let response = self.transport.send(&request)?;
        if response.is_unauthorized() {
            tracing::debug!("{} rejected our credentials", self.base_url);
            self.unauthorized = true;
        }
        Ok(response)
    }
}
