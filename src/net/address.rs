//! IPv4 address parsing and network-address arithmetic

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use crate::error::{Error, Result};
use crate::net::Netmask;

/// Parse a dotted-quad IPv4 address.
///
/// Exactly four octets of one to three digits each. Leading zeros are
/// accepted ("010" is 10), trailing dots and fifth octets are not.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr> {
    let invalid = || Error::InvalidIpv4(text.to_string());

    let mut octets = [0u8; 4];
    let mut count = 0;
    for part in text.split('.') {
        if count == 4 || part.is_empty() || part.len() > 3 {
            return Err(invalid());
        }
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: u16 = part.parse().map_err(|_| invalid())?;
        octets[count] = u8::try_from(value).map_err(|_| invalid())?;
        count += 1;
    }
    if count != 4 {
        return Err(invalid());
    }
    Ok(Ipv4Addr::from(octets))
}

/// Compute the network address of `ip` under `mask` (octet-wise AND)
pub fn network_address(ip: &str, mask: &Netmask) -> Result<String> {
    let addr = parse_ipv4(ip)?;
    Ok(mask.network_of(addr).to_string())
}

/// `ip` reduced to its network boundary under `mask`
pub fn network_cidr(ip: Ipv4Addr, mask: &Netmask) -> Result<Ipv4Net> {
    Ok(Ipv4Net::new(ip, mask.prefix())?.trunc())
}

/// `ip` with `mask`'s prefix, host bits kept (an interface address)
pub fn interface_cidr(ip: Ipv4Addr, mask: &Netmask) -> Result<Ipv4Net> {
    Ok(Ipv4Net::new(ip, mask.prefix())?)
}

/// Host route for `ip`
pub fn host_cidr(ip: Ipv4Addr) -> Result<Ipv4Net> {
    Ok(Ipv4Net::new(ip, 32)?)
}
