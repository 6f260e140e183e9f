//! Per-peer tunnel description

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use crate::crypto::{KeyPair, PresharedKey};
use crate::error::Result;
use crate::net::{host_cidr, interface_cidr, network_cidr, Netmask};
use crate::validate::DEFAULT_INTERFACE;

/// A subnet reachable behind a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalNetwork {
    /// Address as entered; may be a host inside the subnet
    pub ip: Ipv4Addr,
    pub netmask: Netmask,
    net: Ipv4Net,
}

impl LocalNetwork {
    pub fn new(ip: Ipv4Addr, netmask: Netmask) -> Result<Self> {
        Ok(Self {
            ip,
            netmask,
            net: network_cidr(ip, &netmask)?,
        })
    }

    /// Network address of this subnet
    pub fn network(&self) -> Ipv4Addr {
        self.net.network()
    }

    /// Subnet advertised and routed for this network, e.g. 192.168.5.0/24
    pub fn cidr(&self) -> Ipv4Net {
        self.net
    }
}

/// Validated settings for one endpoint, before any key is generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInput {
    pub name: String,
    pub tunnel_ip: Ipv4Addr,
    pub tunnel_netmask: Netmask,
    /// Public host other peers dial; `None` for peers that only accept
    pub endpoint: Option<String>,
    pub listen_port: Option<u16>,
    pub interface: Option<String>,
    /// Persistent keepalive in seconds; `None` disables it
    pub keepalive: Option<u16>,
    /// Route all traffic through the tunnel
    pub default_gateway: bool,
    pub local_networks: Vec<LocalNetwork>,
}

impl PeerInput {
    pub fn new(name: impl Into<String>, tunnel_ip: Ipv4Addr, tunnel_netmask: Netmask) -> Self {
        Self {
            name: name.into(),
            tunnel_ip,
            tunnel_netmask,
            endpoint: None,
            listen_port: None,
            interface: None,
            keepalive: None,
            default_gateway: false,
            local_networks: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, host: impl Into<String>) -> Self {
        self.endpoint = Some(host.into());
        self
    }

    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    pub fn with_keepalive(mut self, secs: u16) -> Self {
        self.keepalive = Some(secs);
        self
    }

    pub fn with_default_gateway(mut self, enabled: bool) -> Self {
        self.default_gateway = enabled;
        self
    }

    pub fn with_local_network(mut self, network: LocalNetwork) -> Self {
        self.local_networks.push(network);
        self
    }
}

/// One tunnel endpoint with its key material
#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub name: String,
    pub keypair: KeyPair,
    pub tunnel_ip: Ipv4Addr,
    pub tunnel_netmask: Netmask,
    tunnel_net: Ipv4Net,
    host_net: Ipv4Net,
    pub endpoint: Option<String>,
    pub listen_port: Option<u16>,
    pub interface: String,
    pub preshared_key: Option<PresharedKey>,
    pub keepalive: Option<u16>,
    pub default_gateway: bool,
    pub local_networks: Vec<LocalNetwork>,
}

impl PeerConfig {
    pub fn new(input: PeerInput, keypair: KeyPair) -> Result<Self> {
        Ok(Self {
            tunnel_net: interface_cidr(input.tunnel_ip, &input.tunnel_netmask)?,
            host_net: host_cidr(input.tunnel_ip)?,
            name: input.name,
            keypair,
            tunnel_ip: input.tunnel_ip,
            tunnel_netmask: input.tunnel_netmask,
            endpoint: input.endpoint,
            listen_port: input.listen_port,
            interface: input
                .interface
                .unwrap_or_else(|| DEFAULT_INTERFACE.to_string()),
            preshared_key: None,
            keepalive: input.keepalive,
            default_gateway: input.default_gateway,
            local_networks: input.local_networks,
        })
    }

    /// `host:port` other peers dial, if this peer can be dialed
    pub fn endpoint_address(&self) -> Option<String> {
        match (&self.endpoint, self.listen_port) {
            (Some(host), Some(port)) => Some(format!("{}:{}", host, port)),
            _ => None,
        }
    }

    /// Tunnel address with the tunnel prefix, e.g. 10.0.0.1/24
    pub fn tunnel_cidr(&self) -> Ipv4Net {
        self.tunnel_net
    }

    /// Host route for this peer's tunnel address
    pub fn tunnel_host_cidr(&self) -> Ipv4Net {
        self.host_net
    }

    /// File name of the rendered tunnel config
    pub fn config_file_name(&self) -> String {
        format!("{}.conf", self.name)
    }

    /// File name of the rendered setup script
    pub fn setup_file_name(&self) -> String {
        format!("setup_{}.sh", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyGenerator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mask(text: &str) -> Netmask {
        Netmask::from_text(text).unwrap()
    }

    #[test]
    fn test_local_network_normalizes_to_boundary() {
        let net = LocalNetwork::new(Ipv4Addr::new(192, 168, 5, 77), mask("255.255.255.0")).unwrap();
        assert_eq!(net.network(), Ipv4Addr::new(192, 168, 5, 0));
        assert_eq!(net.cidr().to_string(), "192.168.5.0/24");
        assert_eq!(net.cidr().prefix_len(), 24);
    }

    #[test]
    fn test_peer_config_defaults() {
        let keypair = KeyGenerator::new(StdRng::seed_from_u64(5)).generate().unwrap();
        let input = PeerInput::new("site1", Ipv4Addr::new(10, 0, 0, 1), mask("24"));
        let peer = PeerConfig::new(input, keypair).unwrap();

        assert_eq!(peer.interface, "wg0");
        assert!(peer.keepalive.is_none());
        assert!(peer.preshared_key.is_none());
        assert!(peer.endpoint_address().is_none());
        assert_eq!(peer.tunnel_cidr().to_string(), "10.0.0.1/24");
        assert_eq!(peer.tunnel_host_cidr().to_string(), "10.0.0.1/32");
        assert_eq!(peer.config_file_name(), "site1.conf");
        assert_eq!(peer.setup_file_name(), "setup_site1.sh");
    }

    #[test]
    fn test_endpoint_needs_host_and_port() {
        let keypair = KeyGenerator::new(StdRng::seed_from_u64(6)).generate().unwrap();
        let input = PeerInput::new("gw", Ipv4Addr::new(10, 0, 0, 2), mask("24"))
            .with_endpoint("vpn.example.org")
            .with_listen_port(51820)
            .with_interface("wg3");
        let peer = PeerConfig::new(input, keypair).unwrap();

        assert_eq!(peer.endpoint_address().as_deref(), Some("vpn.example.org:51820"));
        assert_eq!(peer.interface, "wg3");
    }
}
