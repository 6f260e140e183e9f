//! IPv4 netmask and address handling

pub mod address;
pub mod netmask;

pub use address::{host_cidr, interface_cidr, network_address, network_cidr, parse_ipv4};
pub use netmask::Netmask;
