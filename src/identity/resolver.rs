use std::fmt;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// The address the server treats as the host, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAddress {
    Ip(IpAddr),
    /// Configured value that is neither an address literal nor resolvable.
    /// Compared textually against callers.
    Unresolved(String),
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostAddress::Ip(ip) => write!(f, "{ip}"),
            HostAddress::Unresolved(raw) => f.write_str(raw),
        }
    }
}

/// Collapse IPv4-mapped IPv6 (`::ffff:192.168.1.10`) to plain IPv4.
pub fn normalize(ip: IpAddr) -> IpAddr {
    ip.to_canonical()
}

/// Canonical address of the caller.
///
/// `X-Forwarded-For` is only consulted when `trust_proxy` is set, and then only its
/// left-most (originating client) entry. Without it the transport peer is the sole
/// source, otherwise any guest could claim to be the host.
pub fn resolve_caller_address(peer: SocketAddr, headers: &HeaderMap, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        if let Some(ip) = forwarded_client(headers) {
            return normalize(ip);
        }
    }
    normalize(peer.ip())
}

fn forwarded_client(headers: &HeaderMap) -> Option<IpAddr> {
    let raw = headers.get(FORWARDED_FOR)?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    first.parse().ok()
}

/// Resolve the configured host value using the system resolver.
pub async fn resolve_host_address(configured: &str) -> HostAddress {
    resolve_host_address_with(configured, system_lookup).await
}

/// Resolve the configured host value with a caller-supplied lookup.
///
/// Address literals are used directly. Anything else goes through `lookup` and the
/// first returned address wins. A failed or empty lookup is not fatal: the raw value
/// is kept and a warning logged.
pub async fn resolve_host_address_with<F, Fut>(configured: &str, lookup: F) -> HostAddress
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = io::Result<Vec<IpAddr>>>,
{
    let configured = configured.trim();
    if let Ok(ip) = configured.parse::<IpAddr>() {
        return HostAddress::Ip(normalize(ip));
    }

    match lookup(configured.to_string()).await {
        Ok(addrs) => match addrs.into_iter().next() {
            Some(ip) => {
                let ip = normalize(ip);
                tracing::info!("Resolved host name \"{}\" to {}", configured, ip);
                HostAddress::Ip(ip)
            }
            None => {
                tracing::warn!(
                    "Host name \"{}\" resolved to no addresses; comparing callers against it as-is",
                    configured
                );
                HostAddress::Unresolved(configured.to_string())
            }
        },
        Err(e) => {
            tracing::warn!(
                "Could not resolve host name \"{}\": {}; comparing callers against it as-is",
                configured,
                e
            );
            HostAddress::Unresolved(configured.to_string())
        }
    }
}

async fn system_lookup(name: String) -> io::Result<Vec<IpAddr>> {
    let addrs = tokio::net::lookup_host((name.as_str(), 0)).await?;
    Ok(addrs.map(|a| a.ip()).collect())
}
