//! The host's view of an incoming request.
//!
//! The HTTP layer itself is a host collaborator; the kernel only needs a
//! stable, cheap-to-share description of the request to hand to plugins.

use std::collections::BTreeMap;

use super::actor::Actor;

/// An incoming request as seen by hook implementations.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method, upper case.
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Decoded query string pairs in their original order.
    pub query: Vec<(String, String)>,
    /// Headers keyed by lower-cased name.
    pub headers: BTreeMap<String, String>,
    /// Cookies keyed by name.
    pub cookies: BTreeMap<String, String>,
    /// Named captures from the matched route pattern.
    pub url_vars: BTreeMap<String, String>,
    /// Actor placed on the request by an upstream layer, if any.
    pub actor: Option<Actor>,
    /// HTTP version string, e.g. `"1.1"`.
    pub http_version: String,
}

impl Request {
    /// Creates a request for `method` and a path that may carry a query string.
    pub fn new(method: &str, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, parse_query(q)),
            None => (path_and_query, Vec::new()),
        };
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            query,
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            url_vars: BTreeMap::new(),
            actor: None,
            http_version: "1.1".to_string(),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(path_and_query: &str) -> Self {
        Self::new("GET", path_and_query)
    }

    /// Adds a header (name is lower-cased).
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Adds a cookie.
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    /// Places an actor on the request, as an upstream layer would.
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// First query value for `name`.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All query values for `name`.
    pub fn args(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Path plus the re-encoded query string.
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

fn parse_query(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), decode(v))
        })
        .collect()
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}
