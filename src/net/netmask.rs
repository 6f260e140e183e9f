//! IPv4 netmask codec
//!
//! A netmask is stored as its prefix length. The dotted-decimal form is
//! derived on demand. Masks shorter than /8 are rejected: the wizard never
//! routes networks that large through a tunnel.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Smallest prefix accepted as a netmask
pub const MIN_PREFIX: u8 = 8;

/// Largest prefix (host route)
pub const MAX_PREFIX: u8 = 32;

/// Octet values that can appear at the boundary of a contiguous mask
const BOUNDARY_OCTETS: [&str; 8] = ["255", "254", "252", "248", "240", "224", "192", "128"];

/// A contiguous IPv4 subnet mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Netmask {
    prefix: u8,
}

impl Netmask {
    /// Build a netmask from a prefix length in [8, 32]
    pub fn from_prefix(prefix: u8) -> Result<Self> {
        if !(MIN_PREFIX..=MAX_PREFIX).contains(&prefix) {
            return Err(Error::InvalidNetmask(prefix.to_string()));
        }
        Ok(Self { prefix })
    }

    /// Parse either the dotted form ("255.255.255.0") or the prefix form ("24")
    pub fn from_text(text: &str) -> Result<Self> {
        if validate_full(text) {
            let prefix = to_prefix(text)?;
            return Ok(Self { prefix });
        }
        if validate_prefix(text) {
            let prefix = text
                .parse::<u8>()
                .map_err(|_| Error::InvalidNetmask(text.to_string()))?;
            return Ok(Self { prefix });
        }
        Err(Error::InvalidNetmask(text.to_string()))
    }

    /// Prefix length (count of leading one bits)
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Mask as a 32-bit integer, most significant octet first
    pub fn bits(&self) -> u32 {
        prefix_bits(self.prefix)
    }

    /// Dotted-decimal form
    pub fn dotted(&self) -> String {
        to_dotted(self.prefix)
    }

    /// Clear the host bits of `ip`
    pub fn network_of(&self, ip: Ipv4Addr) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(ip) & self.bits())
    }
}

impl fmt::Display for Netmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())
    }
}

impl FromStr for Netmask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

/// Check a dotted-decimal netmask.
///
/// The first octet must be 255. Once an octet other than 255 appears, every
/// following octet must be zero. Zero octets may be written with repeated
/// zeros ("00").
pub fn validate_full(text: &str) -> bool {
    let octets: Vec<&str> = text.split('.').collect();
    if octets.len() != 4 || octets[0] != "255" {
        return false;
    }

    let is_zero = |o: &str| !o.is_empty() && o.bytes().all(|b| b == b'0');
    let mut boundary_seen = false;
    for octet in octets {
        if boundary_seen {
            if !is_zero(octet) {
                return false;
            }
        } else if octet == "255" {
            continue;
        } else if BOUNDARY_OCTETS.contains(&octet) || is_zero(octet) {
            boundary_seen = true;
        } else {
            return false;
        }
    }
    true
}

/// Check a prefix-length netmask: a decimal literal without leading zero,
/// within [0, 32] and at least 8.
pub fn validate_prefix(text: &str) -> bool {
    let well_formed = match text.len() {
        1 => text.as_bytes()[0].is_ascii_digit(),
        2 => {
            let b = text.as_bytes();
            (b'1'..=b'3').contains(&b[0]) && b[1].is_ascii_digit()
        }
        _ => false,
    };
    if !well_formed {
        return false;
    }
    match text.parse::<u8>() {
        Ok(prefix) => (MIN_PREFIX..=MAX_PREFIX).contains(&prefix),
        Err(_) => false,
    }
}

/// Convert a dotted-decimal mask to its prefix length
pub fn to_prefix(dotted: &str) -> Result<u8> {
    let invalid = || Error::InvalidNetmask(dotted.to_string());

    let parts: Vec<&str> = dotted.split('.').collect();
    if parts.len() != 4 {
        return Err(invalid());
    }

    let mut mask: u32 = 0;
    for (i, part) in parts.iter().enumerate() {
        let value: u32 = part.parse().map_err(|_| invalid())?;
        if value > 0xFF {
            return Err(invalid());
        }
        if i == 0 && value < 255 {
            return Err(invalid());
        }
        mask = (mask << 8) | value;
    }

    // Walk from the least significant bit: a zero above a one is a hole
    let mut seen_one = false;
    for bit in 0..32 {
        if mask & (1 << bit) != 0 {
            seen_one = true;
        } else if seen_one {
            return Err(invalid());
        }
    }

    Ok(mask.leading_ones() as u8)
}

/// Convert a prefix length in [0, 32] to dotted-decimal form.
///
/// Prefixes above 32 saturate to a host mask.
pub fn to_dotted(prefix: u8) -> String {
    Ipv4Addr::from(prefix_bits(prefix)).to_string()
}

fn prefix_bits(prefix: u8) -> u32 {
    if prefix == 0 {
        return 0;
    }
    let host_bits = 32 - u32::from(prefix.min(MAX_PREFIX));
    u32::MAX.checked_shl(host_bits).unwrap_or(0)
}
