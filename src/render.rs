//! Text rendering for tunnel configs and setup scripts
//!
//! Rendering is pure: sections are built from already validated
//! [`PeerConfig`]s and turned into strings. Writing them anywhere is the
//! caller's job.

use std::fmt::Write as _;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use crate::crypto::PresharedKey;
use crate::peer::PeerConfig;

/// One `[Peer]` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSection {
    pub public_key: String,
    pub preshared_key: Option<String>,
    /// `host:port`; omitted when the remote cannot be dialed
    pub endpoint: Option<String>,
    pub allowed_ips: Vec<Ipv4Net>,
    pub persistent_keepalive: Option<u16>,
}

impl PeerSection {
    /// Describe `remote` as seen from `own`.
    ///
    /// AllowedIPs always holds the remote tunnel address as a host route.
    /// With `advertise_local_networks`, each remote local network follows,
    /// reduced to its network address.
    pub fn for_remote(
        own: &PeerConfig,
        remote: &PeerConfig,
        preshared_key: Option<&PresharedKey>,
        advertise_local_networks: bool,
    ) -> Self {
        let mut allowed_ips = vec![remote.tunnel_host_cidr()];
        if advertise_local_networks {
            allowed_ips.extend(remote.local_networks.iter().map(|n| n.cidr()));
        }
        Self {
            public_key: remote.keypair.public_key_base64(),
            preshared_key: preshared_key.map(PresharedKey::to_base64),
            endpoint: remote.endpoint_address(),
            allowed_ips,
            persistent_keepalive: own.keepalive,
        }
    }

    pub fn to_config_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[Peer]");
        let _ = writeln!(out, "PublicKey = {}", self.public_key);
        if let Some(psk) = &self.preshared_key {
            let _ = writeln!(out, "PresharedKey = {}", psk);
        }
        if let Some(endpoint) = &self.endpoint {
            let _ = writeln!(out, "Endpoint = {}", endpoint);
        }
        let allowed_ips: Vec<String> = self.allowed_ips.iter().map(Ipv4Net::to_string).collect();
        let _ = writeln!(out, "AllowedIPs = {}", allowed_ips.join(","));
        if let Some(secs) = self.persistent_keepalive {
            let _ = writeln!(out, "PersistentKeepalive = {}", secs);
        }
        out
    }
}

/// A complete `<peer>.conf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    pub private_key: String,
    pub listen_port: Option<u16>,
    pub peers: Vec<PeerSection>,
}

impl TunnelConfig {
    pub fn new(own: &PeerConfig, peers: Vec<PeerSection>) -> Self {
        Self {
            private_key: own.keypair.private_key_base64(),
            listen_port: own.listen_port,
            peers,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[Interface]");
        let _ = writeln!(out, "PrivateKey = {}", self.private_key);
        if let Some(port) = self.listen_port {
            let _ = writeln!(out, "ListenPort = {}", port);
        }
        for peer in &self.peers {
            out.push('\n');
            out.push_str(&peer.to_config_string());
        }
        out
    }
}

/// A route added by a setup script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Default { via: Ipv4Addr },
    Network { cidr: Ipv4Net, via: Ipv4Addr },
}

impl Route {
    /// Routes `own` needs towards `remote`.
    ///
    /// A default-gateway peer sends everything through the remote; otherwise
    /// each remote local network gets its own route.
    pub fn towards(own: &PeerConfig, remote: &PeerConfig) -> Vec<Route> {
        if own.default_gateway {
            return vec![Route::Default { via: remote.tunnel_ip }];
        }
        remote
            .local_networks
            .iter()
            .map(|n| Route::Network {
                cidr: n.cidr(),
                via: remote.tunnel_ip,
            })
            .collect()
    }

    pub fn to_command(&self) -> String {
        match self {
            Route::Default { via } => format!("ip route add default via {}", via),
            Route::Network { cidr, via } => format!("ip route add {} via {}", cidr, via),
        }
    }
}

/// A complete `setup_<peer>.sh`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupScript {
    pub interface: String,
    pub address: Ipv4Net,
    pub config_file: String,
    pub routes: Vec<Route>,
}

impl SetupScript {
    pub fn new(own: &PeerConfig, routes: Vec<Route>) -> Self {
        Self {
            interface: own.interface.clone(),
            address: own.tunnel_cidr(),
            config_file: own.config_file_name(),
            routes,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "#!/bin/bash");
        let _ = writeln!(out, "ip link add dev {} type wireguard", self.interface);
        let _ = writeln!(out, "ip addr add {} dev {}", self.address, self.interface);
        let _ = writeln!(out, "ip link set dev {} up", self.interface);
        let _ = writeln!(out, "wg setconf {} {}", self.interface, self.config_file);
        for route in &self.routes {
            let _ = writeln!(out, "{}", route.to_command());
        }
        out
    }
}
