//! Field-scoped input validation
//!
//! Every validator checks one field and returns a typed error the caller can
//! use to re-prompt for that field alone. The `is_valid_*` forms are for
//! callers that only need a yes/no answer.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};
use crate::net::{self, Netmask};

/// Interface name used when none is given
pub const DEFAULT_INTERFACE: &str = "wg0";

/// Highest interface index accepted after the `wg` prefix
pub const MAX_INTERFACE_INDEX: u16 = 255;

/// Validate a tunnel, endpoint or local-network address
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr> {
    net::parse_ipv4(text)
}

/// Validate a netmask in dotted or prefix form
pub fn parse_netmask(text: &str) -> Result<Netmask> {
    Netmask::from_text(text)
}

/// Validate a UDP listen port given as text
pub fn parse_listen_port(text: &str) -> Result<u16> {
    let value: u32 = text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidPort(text.to_string()))?;
    check_listen_port(value)
}

/// Validate a numeric UDP listen port (1-65535)
pub fn check_listen_port(value: u32) -> Result<u16> {
    match u16::try_from(value) {
        Ok(port) if port >= 1 => Ok(port),
        _ => Err(Error::InvalidPort(value.to_string())),
    }
}

/// Validate a keepalive interval given as text
pub fn parse_keepalive(text: &str) -> Result<u16> {
    let value: u32 = text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidKeepalive(text.to_string()))?;
    check_keepalive(value)
}

/// Validate a numeric keepalive interval in seconds (1-65535)
pub fn check_keepalive(value: u32) -> Result<u16> {
    match u16::try_from(value) {
        Ok(secs) if secs >= 1 => Ok(secs),
        _ => Err(Error::InvalidKeepalive(value.to_string())),
    }
}

/// Validate a WireGuard interface name: `wg0` through `wg255`
pub fn parse_interface_name(text: &str) -> Result<String> {
    let invalid = || Error::InvalidInterfaceName(text.to_string());

    let index = text.strip_prefix("wg").ok_or_else(invalid)?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match index.parse::<u16>() {
        Ok(n) if n <= MAX_INTERFACE_INDEX => Ok(text.to_string()),
        _ => Err(invalid()),
    }
}

/// Longest DNS name accepted as an endpoint
pub const MAX_HOSTNAME_LENGTH: usize = 253;

/// Validate the public host other peers dial.
///
/// Accepts a DNS name, a dotted-quad IPv4 address or an IPv6 address, with
/// or without brackets. Returns the host as it must appear before `:port`
/// in an `Endpoint =` line: IPv4 normalized, IPv6 bracketed.
pub fn parse_endpoint(text: &str) -> Result<String> {
    let invalid = || Error::InvalidEndpoint(text.escape_debug().to_string());

    if text.is_empty() || text.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }

    let bracketed = text.strip_prefix('[').and_then(|h| h.strip_suffix(']'));
    if let Some(inner) = bracketed {
        let addr: Ipv6Addr = inner.parse().map_err(|_| invalid())?;
        return Ok(format!("[{}]", addr));
    }
    if let Ok(addr) = text.parse::<Ipv6Addr>() {
        return Ok(format!("[{}]", addr));
    }

    if text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return parse_ipv4(text)
            .map(|addr| addr.to_string())
            .map_err(|_| invalid());
    }

    if text.len() > MAX_HOSTNAME_LENGTH || !text.split('.').all(is_hostname_label) {
        return Err(invalid());
    }
    Ok(text.to_string())
}

fn is_hostname_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Validate a peer name. Names become file names (`<name>.conf`).
pub fn parse_peer_name(text: &str) -> Result<String> {
    let valid = !text.is_empty()
        && !text.starts_with('.')
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(text.to_string())
    } else {
        Err(Error::InvalidPeerName(text.to_string()))
    }
}

pub fn is_valid_ipv4(text: &str) -> bool {
    parse_ipv4(text).is_ok()
}

pub fn is_valid_netmask(text: &str) -> bool {
    parse_netmask(text).is_ok()
}

pub fn is_valid_listen_port(text: &str) -> bool {
    parse_listen_port(text).is_ok()
}

pub fn is_valid_keepalive(text: &str) -> bool {
    parse_keepalive(text).is_ok()
}

pub fn is_valid_interface_name(text: &str) -> bool {
    parse_interface_name(text).is_ok()
}

pub fn is_valid_endpoint(text: &str) -> bool {
    parse_endpoint(text).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_port() {
        assert!(is_valid_listen_port("10000"));
        assert!(is_valid_listen_port("1"));
        assert!(is_valid_listen_port("65535"));
        assert!(is_valid_listen_port("9999"));

        assert!(!is_valid_listen_port("0"));
        assert!(!is_valid_listen_port("65536"));
        assert!(!is_valid_listen_port("999999"));
        assert!(!is_valid_listen_port("-1"));
        assert!(!is_valid_listen_port("port"));
        assert!(matches!(check_listen_port(70000), Err(Error::InvalidPort(_))));
    }

    #[test]
    fn test_interface_name() {
        assert!(is_valid_interface_name("wg0"));
        assert!(is_valid_interface_name("wg10"));
        assert!(is_valid_interface_name("wg200"));
        assert!(is_valid_interface_name("wg255"));

        assert!(!is_valid_interface_name("wg"));
        assert!(!is_valid_interface_name("wg256"));
        assert!(!is_valid_interface_name("wg999"));
        assert!(!is_valid_interface_name("eth0"));
        assert!(!is_valid_interface_name("wg-1"));
        assert!(!is_valid_interface_name("wg+1"));
    }

    #[test]
    fn test_keepalive() {
        assert!(is_valid_keepalive("1"));
        assert!(is_valid_keepalive("120"));
        assert!(is_valid_keepalive("65535"));

        assert!(!is_valid_keepalive("0"));
        assert!(!is_valid_keepalive("-1"));
        assert!(!is_valid_keepalive("65536"));
        assert!(!is_valid_keepalive("99999"));
        assert!(matches!(parse_keepalive("x"), Err(Error::InvalidKeepalive(_))));
    }

    #[test]
    fn test_netmask_either_form() {
        assert!(is_valid_netmask("255.255.255.0"));
        assert!(is_valid_netmask("255.0.0.0"));
        assert!(is_valid_netmask("255.255.255.252"));
        assert!(is_valid_netmask("8"));
        assert!(is_valid_netmask("16"));

        assert!(!is_valid_netmask("0.0.0.0"));
        assert!(!is_valid_netmask("255.255.256.0"));
        assert!(!is_valid_netmask("255.255.a.0"));
        assert!(!is_valid_netmask(""));
        assert!(!is_valid_netmask("128.0.0.0"));
        assert!(!is_valid_netmask("1.1.1.1"));
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(parse_endpoint("198.51.100.2").unwrap(), "198.51.100.2");
        assert_eq!(parse_endpoint("010.0.0.1").unwrap(), "10.0.0.1");
        assert_eq!(parse_endpoint("vpn.example.net").unwrap(), "vpn.example.net");
        assert_eq!(parse_endpoint("gw-1").unwrap(), "gw-1");
        assert_eq!(parse_endpoint("2001:db8::1").unwrap(), "[2001:db8::1]");
        assert_eq!(parse_endpoint("[2001:db8::1]").unwrap(), "[2001:db8::1]");

        assert!(!is_valid_endpoint(""));
        assert!(!is_valid_endpoint("198.51.100.2\nAllowedIPs = 0.0.0.0/0\n#"));
        assert!(!is_valid_endpoint("vpn example"));
        assert!(!is_valid_endpoint("vpn.example.net:51820"));
        assert!(!is_valid_endpoint("198.51.100.256"));
        assert!(!is_valid_endpoint("[vpn.example.net]"));
        assert!(!is_valid_endpoint("-bad.example"));
        assert!(!is_valid_endpoint("a..b"));
        assert!(matches!(parse_endpoint("a\tb"), Err(Error::InvalidEndpoint(_))));
    }

    #[test]
    fn test_peer_name() {
        assert_eq!(parse_peer_name("site1").unwrap(), "site1");
        assert!(parse_peer_name("client-1").is_ok());
        assert!(parse_peer_name("office_gw.v2").is_ok());

        assert!(parse_peer_name("").is_err());
        assert!(parse_peer_name(".hidden").is_err());
        assert!(parse_peer_name("../etc").is_err());
        assert!(parse_peer_name("a b").is_err());
    }

    #[test]
    fn test_ipv4_field() {
        assert!(is_valid_ipv4("172.16.10.0"));
        assert!(!is_valid_ipv4("172.16.10"));
    }
}
