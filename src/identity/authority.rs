use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::identity::resolver::{normalize, HostAddress};

/// Addresses that always count as the host, for same-machine administration.
pub const LOOPBACK: [IpAddr; 2] = [
    IpAddr::V4(Ipv4Addr::LOCALHOST),
    IpAddr::V6(Ipv6Addr::LOCALHOST),
];

/// Whether `caller` may control playback.
///
/// Pure and stateless: evaluated on every privileged request, nothing cached per caller.
pub fn is_host(caller: IpAddr, host: &HostAddress) -> bool {
    let caller = normalize(caller);
    if LOOPBACK.contains(&caller) {
        return true;
    }
    match host {
        HostAddress::Ip(ip) => normalize(*ip) == caller,
        HostAddress::Unresolved(raw) => caller.to_string() == *raw,
    }
}
