//! In-memory transport for tests.

use super::transport::{HttpRequest, HttpResponse, Transport};
use anyhow::Result;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

enum Reply {
    Respond(HttpResponse),
    Fail(String),
}

/// Replies per `"METHOD /path?query"` route, recording every request.
///
/// Queued replies are consumed in order; the last one repeats. Unrouted
/// requests get an empty 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: RefCell<HashMap<String, VecDeque<Reply>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.push(method, path, Reply::Respond(HttpResponse::new(status, body)));
        self
    }

    pub(crate) fn fail(self, method: &str, path: &str, message: &str) -> Self {
        self.push(method, path, Reply::Fail(message.to_string()));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// Requests as `"METHOD /path"` strings.
    pub(crate) fn routes_hit(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|r| route_key(r.method.as_str(), path_of(&r.url)))
            .collect()
    }

    fn push(&self, method: &str, path: &str, reply: Reply) {
        self.routes.borrow_mut().entry(route_key(method, path)).or_default().push_back(reply);
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());
        let key = route_key(request.method.as_str(), path_of(&request.url));

        let mut routes = self.routes.borrow_mut();
        let Some(queue) = routes.get_mut(&key) else {
            return Ok(HttpResponse::new(404, ""));
        };
        let reply = if queue.len() > 1 { queue.pop_front() } else { None };
        match reply.as_ref().or(queue.front()) {
            Some(Reply::Respond(response)) => Ok(response.clone()),
            Some(Reply::Fail(message)) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method, path)
}

/// Strip `scheme://host:port` from a URL.
fn path_of(url: &str) -> &str {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    match after_scheme.find('/') {
        Some(idx) => &after_scheme[idx..],
        None => "/",
    }
}
