//! HTTP transport
//!
//! [`Transport`] is the seam between [`RemoteClient`](super::RemoteClient) and
//! the network. [`HttpTransport`] sends requests with a blocking reqwest client.

use anyhow::{Context, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::time::Instant;

/// A fully built request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// A raw response, returned to callers for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

pub trait Transport {
    /// Send one request. Only transport failures are errors; any HTTP status
    /// is a successful exchange.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport; reqwest's default request timeout applies.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// `verify = false` disables TLS certificate validation.
    pub fn new(verify: bool) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(!verify)
            .build()
            .context("Failed building HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let started = Instant::now();
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .with_context(|| format!("{} {} failed", request.method, request.url))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned())
            })
            .collect();
        let body = response
            .text()
            .with_context(|| format!("Failed reading response body from {}", request.url))?;

        tracing::debug!(
            "{} {} -> {} in {}ms",
            request.method,
            request.url,
            status,
            started.elapsed().as_millis()
        );
        Ok(HttpResponse { status, headers, body })
    }
}
