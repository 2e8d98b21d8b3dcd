//! Client address resolution

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::ConnectInfo,
    http::{Extensions, HeaderMap},
};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the caller's IP
///
/// The left-most `X-Forwarded-For` entry wins when `trust_forwarded_for` is
/// set; otherwise the peer address recorded by the server is used.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());

        if forwarded.is_some() {
            return forwarded;
        }
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(ip: &str) -> Extensions {
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::new(ip.parse().unwrap(), 40000)));
        extensions
    }

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_peer_address_by_default() {
        let ip = client_ip(&forwarded("203.0.113.9"), &peer("10.0.0.5"), false);
        assert_eq!(ip, Some("10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn test_trusted_forwarded_for() {
        let ip = client_ip(&forwarded("203.0.113.9, 10.0.0.1"), &peer("10.0.0.5"), true);
        assert_eq!(ip, Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn test_garbage_forwarded_for_falls_back() {
        let ip = client_ip(&forwarded("unknown"), &peer("::1"), true);
        assert_eq!(ip, Some("::1".parse().unwrap()));
    }

    #[test]
    fn test_unknown_without_connect_info() {
        assert_eq!(client_ip(&HeaderMap::new(), &Extensions::new(), true), None);
    }
}
