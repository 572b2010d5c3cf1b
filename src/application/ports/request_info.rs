use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, MatchedPath, Request};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};

/// Metrics label for requests no route matched
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

/// Snapshot of the inbound request taken before the handler runs
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub method: Method,
    /// Path plus query string
    pub url: String,
    pub headers: HeaderMap,
    /// Route template that matched (`/v1/users/{id}`), absent for the fallback
    pub route: Option<String>,
    /// Peer address recorded by the connection (`ConnectInfo`)
    pub remote_addr: Option<IpAddr>,
    /// Peer address recorded on the raw socket
    ///
    /// `axum::serve` never sets this. Custom accept loops and middleware
    /// (a proxy-protocol decoder, a hand-rolled hyper server) provide it by
    /// inserting a plain `SocketAddr` into the request extensions.
    pub socket_addr: Option<IpAddr>,
}

impl RequestInfo {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }

    /// Add a header, ignoring names or values that are not valid HTTP
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_socket_addr(mut self, addr: IpAddr) -> Self {
        self.socket_addr = Some(addr);
        self
    }

    pub fn from_request(request: &Request) -> Self {
        let uri = request.uri();
        let url = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        let extensions = request.extensions();

        Self {
            method: request.method().clone(),
            url,
            headers: request.headers().clone(),
            route: extensions
                .get::<MatchedPath>()
                .map(|matched| matched.as_str().to_string()),
            remote_addr: extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip()),
            socket_addr: extensions.get::<SocketAddr>().map(SocketAddr::ip),
        }
    }

    /// The URL without its query string
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    /// Bounded label for per-route counters: the route template, never the raw path
    pub fn route_label(&self) -> &str {
        self.route.as_deref().unwrap_or(UNMATCHED_ROUTE)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }
}
