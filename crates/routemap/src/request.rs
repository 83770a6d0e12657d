//! Per-request routing context
//!
//! Each worker thread owns one [`RequestConfig`]. Before handling a request
//! the server calls [`RequestConfig::load_environ`]; handlers further down
//! the stack read the matched variables, the route and the resolved host
//! and scheme from the same thread without threading them through every
//! call.

use std::cell::RefCell;
use std::collections::hash_map;
use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use crate::route::Route;
use crate::Mapper;

thread_local! {
    static REQUEST_CONFIG: RefCell<RequestConfig> = RefCell::new(RequestConfig::default());
}

/// Request metadata in CGI naming (`PATH_INFO`, `HTTP_HOST`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environ(HashMap<String, String>);

impl Environ {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn path_info(&self) -> Option<&str> {
        self.get("PATH_INFO")
    }

    /// `REQUEST_METHOD`, defaulting to `GET` when absent or malformed
    pub fn request_method(&self) -> Method {
        self.get("REQUEST_METHOD")
            .and_then(|m| Method::from_bytes(m.as_bytes()).ok())
            .unwrap_or(Method::GET)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Builds an environ from an `http` request
    ///
    /// Headers become `HTTP_*` keys (`X-Forwarded-Host` becomes
    /// `HTTP_X_FORWARDED_HOST`); headers that are not valid visible ASCII are
    /// skipped.
    ///
    /// ```
    /// use routemap::Environ;
    ///
    /// let request = http::Request::builder()
    ///     .method("POST")
    ///     .uri("https://example.com/messages?page=2")
    ///     .header("X-Forwarded-Proto", "https")
    ///     .body(())
    ///     .unwrap();
    /// let environ = Environ::from_request(&request);
    ///
    /// assert_eq!(environ.path_info(), Some("/messages"));
    /// assert_eq!(environ.get("QUERY_STRING"), Some("page=2"));
    /// assert_eq!(environ.get("HTTP_X_FORWARDED_PROTO"), Some("https"));
    /// assert_eq!(environ.get("SERVER_PORT"), Some("443"));
    /// ```
    pub fn from_request<B>(request: &http::Request<B>) -> Self {
        let uri = request.uri();
        let scheme = uri.scheme_str().unwrap_or("http");
        let default_port = if scheme == "https" { 443 } else { 80 };

        let mut environ = Environ::new()
            .with("PATH_INFO", uri.path())
            .with("REQUEST_METHOD", request.method().as_str())
            .with("wsgi.url_scheme", scheme)
            .with(
                "SERVER_PORT",
                uri.port_u16().unwrap_or(default_port).to_string(),
            );

        if let Some(query) = uri.query() {
            environ.insert("QUERY_STRING", query);
        }
        if let Some(host) = uri.host() {
            environ.insert("SERVER_NAME", host);
        }

        for (name, value) in request.headers() {
            if let Ok(value) = value.to_str() {
                let key = format!("HTTP_{}", name.as_str().to_ascii_uppercase().replace('-', "_"));
                environ.insert(key, value);
            }
        }

        environ
    }
}

impl<K, V> FromIterator<(K, V)> for Environ
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Environ(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<HashMap<String, String>> for Environ {
    fn from(map: HashMap<String, String>) -> Self {
        Environ(map)
    }
}

/// `https` if the request arrived over TLS directly or via a proxy
pub fn resolve_protocol(environ: &Environ) -> &'static str {
    if environ.contains("HTTPS")
        || environ.get("wsgi.url_scheme") == Some("https")
        || environ.get("HTTP_X_FORWARDED_PROTO") == Some("https")
    {
        "https"
    } else {
        "http"
    }
}

/// Host the client addressed, including a non-default port
///
/// Precedence: first `X-Forwarded-Host` entry, then `Host`, then
/// `SERVER_NAME` with `:SERVER_PORT` unless the port is the scheme default.
pub fn resolve_host(environ: &Environ) -> Option<String> {
    if let Some(forwarded) = environ.get("HTTP_X_FORWARDED_HOST") {
        // Proxies chain their hosts as "a, b"
        let first = forwarded.split(", ").next().unwrap_or(forwarded);
        return Some(first.to_string());
    }
    if let Some(host) = environ.get("HTTP_HOST") {
        return Some(host.to_string());
    }

    let Some(server) = environ.get("SERVER_NAME") else {
        tracing::warn!("Cannot resolve request host: no forwarded host, Host header or SERVER_NAME");
        return None;
    };

    let default_port = if environ.get("wsgi.url_scheme") == Some("https") {
        "443"
    } else {
        "80"
    };
    match environ.get("SERVER_PORT") {
        Some(port) if port != default_port => Some(format!("{}:{}", server, port)),
        _ => Some(server.to_string()),
    }
}

/// Routing state for the request the current thread is handling
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Mapper used by [`load_environ`](Self::load_environ)
    pub mapper: Option<Arc<Mapper>>,
    /// Variables of the current match
    pub mapper_dict: Option<HashMap<String, String>>,
    /// Route of the current match
    pub route: Option<Arc<Route>>,
    pub host: Option<String>,
    pub protocol: Option<String>,
    pub environ: Option<Environ>,
}

impl RequestConfig {
    /// Reads the current thread's context
    ///
    /// # Example
    ///
    /// ```
    /// use routemap::RequestConfig;
    ///
    /// let has_match = RequestConfig::with(|config| config.mapper_dict.is_some());
    /// assert!(!has_match);
    /// ```
    pub fn with<F, R>(f: F) -> R
    where
        F: FnOnce(&RequestConfig) -> R,
    {
        REQUEST_CONFIG.with(|config| f(&*config.borrow()))
    }

    /// Mutates the current thread's context
    pub fn with_mut<F, R>(f: F) -> R
    where
        F: FnOnce(&mut RequestConfig) -> R,
    {
        REQUEST_CONFIG.with(|config| f(&mut *config.borrow_mut()))
    }

    /// Copy of the current thread's context
    pub fn snapshot() -> RequestConfig {
        Self::with(RequestConfig::clone)
    }

    /// Attaches `mapper` to this context
    pub fn set_mapper(&mut self, mapper: Arc<Mapper>) {
        self.mapper = Some(mapper);
    }

    /// Loads a request's environ: matches its path and resolves host and scheme
    ///
    /// Match state is reset when the environ has no `PATH_INFO` or no mapper
    /// is attached, so a previous request's match never leaks into this one.
    pub fn load_environ(&mut self, environ: Environ) {
        self.protocol = Some(resolve_protocol(&environ).to_string());

        let matched = match (&self.mapper, environ.path_info()) {
            (Some(mapper), Some(path)) => mapper.match_route(path, &environ.request_method()),
            _ => None,
        };
        let (mapper_dict, route) = matched.map(|m| m.into_parts()).unzip();
        self.mapper_dict = mapper_dict;
        self.route = route;

        self.host = resolve_host(&environ);

        tracing::debug!(
            path = environ.path_info().unwrap_or(""),
            matched = self.route.is_some(),
            host = self.host.as_deref().unwrap_or(""),
            "Loaded request environ"
        );

        self.environ = Some(environ);
    }

    /// Absolute URL for `path` on the current request's host
    ///
    /// `None` until a host has been resolved.
    pub fn qualified_url(&self, path: &str) -> Option<String> {
        let host = self.host.as_deref()?;
        let protocol = self.protocol.as_deref().unwrap_or("http");
        Some(format!("{}://{}{}", protocol, host, path))
    }

    /// Clears all per-request state, keeping the mapper
    pub fn reset(&mut self) {
        *self = RequestConfig {
            mapper: self.mapper.take(),
            ..RequestConfig::default()
        };
    }
}
