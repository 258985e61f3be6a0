//! Host extraction from HTTP requests.

use axum::http::{HeaderMap, Uri, header};

/// Extracts `host[:port]` of a request, lowercased.
///
/// Reads the `Host` header and falls back to the URI authority (HTTP/2
/// requests carry the host there). Unlike a plain domain lookup the port is
/// kept, because redirect rules are stored per `host:port`.
///
/// Returns `None` if neither source yields a valid UTF-8 host.
pub fn extract_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))?;

    // Strip userinfo if an authority slipped through.
    let host = host.rsplit_once('@').map_or(host, |(_, host)| host);
    Some(host.to_ascii_lowercase())
}

/// Returns the host without its port, handling IPv6 literals.
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.split(':').next().unwrap_or(host)
}
