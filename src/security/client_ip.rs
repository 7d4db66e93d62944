//! Client identity for quota purposes.
//!
//! Precedence, first match wins:
//! 1. first entry of `X-Forwarded-For`, if it parses as an IP address
//! 2. `X-Real-IP`, if it parses as an IP address
//! 3. the TCP peer, with `::1` mapped to `127.0.0.1` and `::ffff:a.b.c.d` to `a.b.c.d`
//! 4. [`FALLBACK_CLIENT_KEY`]
//!
//! Both headers are caller-controlled. Unless the gate sits behind a proxy
//! that overwrites them, any client can pick its own key.

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};

pub const FALLBACK_CLIENT_KEY: &str = "127.0.0.1";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Derive the quota key for a caller.
pub fn resolve_client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    forwarded_for(headers)
        .or_else(|| header_ip(headers, X_REAL_IP))
        .or_else(|| peer.map(|addr| normalize_peer(addr.ip())))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| FALLBACK_CLIENT_KEY.to_string())
}

/// Resolve from a request's headers and the `ConnectInfo` extension, if present.
pub fn client_key_from_parts(headers: &HeaderMap, extensions: &Extensions) -> String {
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    resolve_client_key(headers, peer)
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    value.split(',').next()?.trim().parse().ok()
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn normalize_peer(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) if v6.is_loopback() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(IpAddr::V6(v6), IpAddr::V4),
        v4 => v4,
    }
}

/// Extractor yielding the caller's resolved key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientKey(client_key_from_parts(&parts.headers, &parts.extensions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    fn peer(s: &str) -> Option<SocketAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn forwarded_for_first_entry_wins() {
        let h = headers(&[
            ("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(resolve_client_key(&h, peer("10.1.1.1:5000")), "203.0.113.7");
    }

    #[test]
    fn invalid_forwarded_for_falls_through_to_real_ip() {
        let h = headers(&[
            ("x-forwarded-for", "unknown, 203.0.113.7"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(resolve_client_key(&h, None), "198.51.100.2");
    }

    #[test]
    fn invalid_headers_fall_through_to_peer() {
        let h = headers(&[("x-forwarded-for", ""), ("x-real-ip", "not-an-ip")]);
        assert_eq!(resolve_client_key(&h, peer("192.0.2.9:443")), "192.0.2.9");
    }

    #[test]
    fn ipv6_header_is_canonicalised() {
        let h = headers(&[("x-real-ip", "2001:DB8:0:0::1")]);
        assert_eq!(resolve_client_key(&h, None), "2001:db8::1");
    }

    #[test]
    fn ipv6_loopback_peer_maps_to_ipv4_loopback() {
        assert_eq!(resolve_client_key(&HeaderMap::new(), peer("[::1]:8000")), "127.0.0.1");
    }

    #[test]
    fn ipv4_mapped_peer_is_unwrapped() {
        assert_eq!(
            resolve_client_key(&HeaderMap::new(), peer("[::ffff:192.0.2.33]:8000")),
            "192.0.2.33"
        );
    }

    #[test]
    fn plain_ipv6_peer_is_kept() {
        assert_eq!(
            resolve_client_key(&HeaderMap::new(), peer("[2001:db8::5]:8000")),
            "2001:db8::5"
        );
    }

    #[test]
    fn nothing_available_uses_fallback() {
        assert_eq!(resolve_client_key(&HeaderMap::new(), None), FALLBACK_CLIENT_KEY);
    }

    #[test]
    fn connect_info_extension_is_used() {
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo("198.51.100.40:1234".parse::<SocketAddr>().unwrap()));
        assert_eq!(client_key_from_parts(&HeaderMap::new(), &extensions), "198.51.100.40");
    }
}
