// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Selection of the public address advertised for relayed allocations.

use std::net::{IpAddr, Ipv4Addr};

use tracing::{debug, trace};

/// Errors that can occur while selecting a relay address.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// The configured address is not an IP address.
    #[error("Invalid IP address: {0:?}")]
    InvalidAddress(String),
    /// None of the local interfaces has a public address.
    #[error("Could not detect a public IP address")]
    NoPublicAddress,
    /// The local interfaces could not be listed.
    #[error("Could not list network interfaces: {0}")]
    Interfaces(#[from] std::io::Error),
}

fn is_link_local_multicast(ip: Ipv4Addr) -> bool {
    // 224.0.0.0/24
    matches!(ip.octets(), [224, 0, 0, _])
}

/// Whether `ip` is a public IPv4 address.
///
/// Loopback, link-local and the private ranges `10.0.0.0/8`, `172.16.0.0/12` and
/// `192.168.0.0/16` are not public.  IPv4-mapped IPv6 addresses are treated as the mapped IPv4
/// address, and any other IPv6 address is never considered public.
///
/// # Examples
/// ```
/// # use turn_auth_server::net::is_public_address;
/// assert!(is_public_address("8.8.8.8".parse().unwrap()));
/// assert!(!is_public_address("192.168.1.1".parse().unwrap()));
/// ```
pub fn is_public_address(ip: IpAddr) -> bool {
    let ip = match ip {
        IpAddr::V4(ip) => ip,
        IpAddr::V6(ip) => match ip.to_ipv4_mapped() {
            Some(ip) => ip,
            None => return false,
        },
    };
    !(ip.is_loopback() || ip.is_link_local() || is_link_local_multicast(ip) || ip.is_private())
}

/// The first public address in `addresses`.
pub fn first_public_address(addresses: impl IntoIterator<Item = IpAddr>) -> Option<IpAddr> {
    addresses.into_iter().find(|ip| {
        let public = is_public_address(*ip);
        trace!("address {ip} public: {public}");
        public
    })
}

/// Find the first public address bound to a local network interface, in the order the
/// interfaces are listed by the operating system.
pub fn detect_external_address() -> Result<Option<IpAddr>, NetError> {
    let interfaces = if_addrs::get_if_addrs()?;
    Ok(first_public_address(interfaces.iter().map(|interface| {
        trace!("interface {} has address {}", interface.name, interface.ip());
        interface.ip()
    })))
}

/// Select the address advertised for relayed allocations.
///
/// A configured address is used as is, otherwise the address is detected with
/// [`detect_external_address`].
///
/// # Errors
///
/// - [`NetError::InvalidAddress`] if `configured` is not an IP address.
/// - [`NetError::NoPublicAddress`] if nothing is configured and no public address is found.
/// - [`NetError::Interfaces`] if the local interfaces could not be listed.
pub fn resolve_relay_address(configured: Option<&str>) -> Result<IpAddr, NetError> {
    match configured.map(str::trim).filter(|addr| !addr.is_empty()) {
        Some(addr) => addr
            .parse()
            .map_err(|_| NetError::InvalidAddress(addr.to_string())),
        None => {
            let ip = detect_external_address()?.ok_or(NetError::NoPublicAddress)?;
            debug!("detected public address {ip}");
            Ok(ip)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn private_addresses() {
        let _log = crate::tests::test_init_log();
        for addr in [
            "127.0.0.1",
            "127.1.2.3",
            "10.1.2.3",
            "172.16.0.1",
            "172.20.0.1",
            "172.31.255.255",
            "192.168.1.1",
            "169.254.10.10",
            "224.0.0.251",
        ] {
            assert!(!is_public_address(ip(addr)), "{addr}");
        }
    }

    #[test]
    fn public_addresses() {
        let _log = crate::tests::test_init_log();
        for addr in [
            "8.8.8.8",
            "1.1.1.1",
            "172.15.0.1",
            "172.32.0.1",
            "192.169.0.1",
            "11.0.0.1",
            "224.0.1.1",
        ] {
            assert!(is_public_address(ip(addr)), "{addr}");
        }
    }

    #[test]
    fn ipv6_addresses() {
        let _log = crate::tests::test_init_log();
        assert!(!is_public_address(ip("::1")));
        assert!(!is_public_address(ip("fe80::1")));
        assert!(!is_public_address(ip("2001:4860:4860::8888")));
        assert!(is_public_address(ip("::ffff:8.8.8.8")));
        assert!(!is_public_address(ip("::ffff:192.168.1.1")));
        assert!(!is_public_address(ip("::ffff:127.0.0.1")));
    }

    #[test]
    fn first_public() {
        let _log = crate::tests::test_init_log();
        let addresses = [
            ip("127.0.0.1"),
            ip("::1"),
            ip("192.168.1.10"),
            ip("203.0.113.5"),
            ip("8.8.8.8"),
        ];
        assert_eq!(first_public_address(addresses), Some(ip("203.0.113.5")));
        assert_eq!(first_public_address(addresses[..3].to_vec()), None);
        assert_eq!(first_public_address(Vec::<IpAddr>::new()), None);
    }

    #[test]
    fn detect() {
        let _log = crate::tests::test_init_log();
        if let Some(ip) = detect_external_address().unwrap() {
            assert!(is_public_address(ip));
        }
    }

    #[test]
    fn configured_relay_address() {
        let _log = crate::tests::test_init_log();
        assert_eq!(
            resolve_relay_address(Some("203.0.113.5")).unwrap(),
            ip("203.0.113.5")
        );
        assert_eq!(
            resolve_relay_address(Some(" 2001:db8::1 ")).unwrap(),
            ip("2001:db8::1")
        );
        assert!(matches!(
            resolve_relay_address(Some("not-an-ip")),
            Err(NetError::InvalidAddress(addr)) if addr == "not-an-ip"
        ));
    }

    #[test]
    fn detected_relay_address() {
        let _log = crate::tests::test_init_log();
        for configured in [None, Some(""), Some("  ")] {
            match resolve_relay_address(configured) {
                Ok(ip) => assert!(is_public_address(ip)),
                Err(NetError::NoPublicAddress) => (),
                Err(e) => panic!("unexpected error {e}"),
            }
        }
    }
}
