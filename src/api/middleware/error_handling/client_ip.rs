use crate::application::ports::RequestInfo;

pub const UNKNOWN_CLIENT_IP: &str = "unknown";

/// Best-effort client address for logging and rate-limit tracking
///
/// Checks `x-forwarded-for` (first entry only), then `x-real-ip`, then the
/// connection and socket peer addresses.
pub fn resolve_client_ip(request: &RequestInfo) -> String {
    // Take the first IP in case of multiple proxies
    if let Some(first) = request
        .header("x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = request
        .header("x-real-ip")
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return real_ip.to_string();
    }

    request
        .remote_addr
        .or(request.socket_addr)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT_IP.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use std::net::IpAddr;

    fn request() -> RequestInfo {
        RequestInfo::new(Method::GET, "/")
    }

    #[test]
    fn test_forwarded_for_uses_first_entry() {
        let info = request().with_header("x-forwarded-for", "203.0.113.1, 70.41.3.18");
        assert_eq!(resolve_client_ip(&info), "203.0.113.1");
    }

    #[test]
    fn test_real_ip_when_no_forwarded_for() {
        let info = request()
            .with_header("x-real-ip", "198.51.100.4")
            .with_remote_addr(IpAddr::from([10, 0, 0, 1]));
        assert_eq!(resolve_client_ip(&info), "198.51.100.4");
    }

    #[test]
    fn test_connection_then_socket_address() {
        let both = request()
            .with_remote_addr(IpAddr::from([10, 0, 0, 1]))
            .with_socket_addr(IpAddr::from([10, 0, 0, 2]));
        assert_eq!(resolve_client_ip(&both), "10.0.0.1");

        let socket_only = request().with_socket_addr(IpAddr::from([10, 0, 0, 2]));
        assert_eq!(resolve_client_ip(&socket_only), "10.0.0.2");
    }

    #[test]
    fn test_unknown_without_any_source() {
        assert_eq!(resolve_client_ip(&request()), "unknown");
    }

    #[test]
    fn test_empty_forwarded_for_falls_through() {
        let info = request()
            .with_header("x-forwarded-for", " , 70.41.3.18")
            .with_header("x-real-ip", "198.51.100.4");
        assert_eq!(resolve_client_ip(&info), "198.51.100.4");
    }
}
