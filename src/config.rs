//! wgwizard Configuration
//!
//! A generation run is described by a TOML file. Every field arrives as the
//! text a user typed and is checked by the field validators before a
//! [`Topology`] is built from it.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::peer::{LocalNetwork, PeerInput};
use crate::topology::{
    client_to_client, client_to_site, site_to_site, ClientToClient, ClientToSite, PskMode,
    SiteToSite, Topology, TopologyKind,
};
use crate::validate;

/// Main wgwizard run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Peer-relationship shape
    pub topology: TopologyKind,

    /// Pre-shared key policy
    #[serde(default)]
    pub psk: PskMode,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Both endpoints of a site-to-site or client-to-client run
    #[serde(default)]
    pub peers: Vec<PeerEntry>,

    /// The site of a client-to-site run
    #[serde(default)]
    pub site: Option<PeerEntry>,

    /// The clients of a client-to-site run
    #[serde(default)]
    pub clients: Vec<PeerEntry>,
}

/// Raw settings for one endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerEntry {
    /// Peer name, also the file name stem (defaults per topology)
    #[serde(default)]
    pub name: Option<String>,

    /// Address inside the tunnel
    pub tunnel_ip: String,

    /// Tunnel netmask, dotted ("255.255.255.0") or prefix ("24")
    pub netmask: String,

    /// Public host other peers dial
    #[serde(default)]
    pub endpoint: Option<String>,

    /// UDP listen port
    #[serde(default)]
    pub listen_port: Option<u32>,

    /// Interface name, wg0 - wg255
    #[serde(default)]
    pub interface: Option<String>,

    /// Persistent keepalive in seconds
    #[serde(default)]
    pub keepalive: Option<u32>,

    /// Route all traffic through the tunnel
    #[serde(default)]
    pub default_gateway: bool,

    /// Subnets reachable behind this peer
    #[serde(default)]
    pub local_networks: Vec<LocalNetworkEntry>,
}

/// Raw local network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalNetworkEntry {
    pub ip: String,
    pub netmask: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["pretty", "compact"];

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Whether a peer must have a listen port
#[derive(Clone, Copy, PartialEq, Eq)]
enum Port {
    Required,
    Optional,
}

impl WizardConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Loading run configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: WizardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(Error::Config(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(Error::Config(format!(
                "logging.format '{}' is not one of {}",
                self.logging.format,
                LOG_FORMATS.join(", ")
            )));
        }
        self.to_topology().map(|_| ())
    }

    /// Number of endpoints this run generates
    pub fn peer_count(&self) -> usize {
        match self.topology {
            TopologyKind::ClientToSite => self.site.iter().count() + self.clients.len(),
            _ => self.peers.len(),
        }
    }

    /// Validate every field and build the topology
    pub fn to_topology(&self) -> Result<Topology> {
        match self.topology {
            TopologyKind::SiteToSite => {
                self.expect_pair_layout()?;
                let [a, b] = self.pair_inputs(site_to_site::DEFAULT_NAMES, true)?;
                Ok(SiteToSite::new(a, b).with_psk(self.psk).into())
            }
            TopologyKind::ClientToClient => {
                self.expect_pair_layout()?;
                let [a, b] = self.pair_inputs(client_to_client::DEFAULT_NAMES, false)?;
                Ok(ClientToClient::new(a, b).with_psk(self.psk).into())
            }
            TopologyKind::ClientToSite => {
                if !self.peers.is_empty() {
                    return Err(Error::Config(
                        "client-to-site uses [site] and [[clients]], not [[peers]]".into(),
                    ));
                }
                let site = self
                    .site
                    .as_ref()
                    .ok_or_else(|| Error::Config("client-to-site requires a [site] section".into()))?;
                if self.clients.is_empty() {
                    return Err(Error::Config(
                        "client-to-site requires at least one [[clients]] entry".into(),
                    ));
                }

                let site = site.to_input(client_to_site::DEFAULT_SITE_NAME, Port::Required)?;
                if site.endpoint.is_none() {
                    return Err(Error::Config(format!(
                        "{}: endpoint is required so clients can reach the site",
                        site.name
                    )));
                }
                if site.default_gateway {
                    return Err(Error::Config(format!(
                        "{}: default_gateway is only meaningful on clients",
                        site.name
                    )));
                }

                let mut clients = Vec::with_capacity(self.clients.len());
                for (i, entry) in self.clients.iter().enumerate() {
                    let client = entry.to_input(
                        &client_to_site::default_client_name(i),
                        Port::Optional,
                    )?;
                    if !client.local_networks.is_empty() {
                        return Err(Error::Config(format!(
                            "{}: clients cannot advertise local networks in client-to-site",
                            client.name
                        )));
                    }
                    clients.push(client);
                }

                Ok(ClientToSite::new(site, clients).with_psk(self.psk).into())
            }
        }
    }

    fn expect_pair_layout(&self) -> Result<()> {
        if self.site.is_some() || !self.clients.is_empty() {
            return Err(Error::Config(format!(
                "{} uses [[peers]], not [site] or [[clients]]",
                self.topology
            )));
        }
        if self.peers.len() != 2 {
            return Err(Error::Config(format!(
                "{} requires exactly 2 [[peers]], found {}",
                self.topology,
                self.peers.len()
            )));
        }
        Ok(())
    }

    fn pair_inputs(&self, names: [&str; 2], local_networks: bool) -> Result<[PeerInput; 2]> {
        let a = self.peers[0].to_input(names[0], Port::Required)?;
        let b = self.peers[1].to_input(names[1], Port::Required)?;
        if !local_networks {
            for peer in [&a, &b] {
                if !peer.local_networks.is_empty() {
                    return Err(Error::Config(format!(
                        "{}: {} supports no local networks",
                        peer.name, self.topology
                    )));
                }
            }
        }
        Ok([a, b])
    }
}

impl PeerEntry {
    fn to_input(&self, default_name: &str, port: Port) -> Result<PeerInput> {
        let name = validate::parse_peer_name(self.name.as_deref().unwrap_or(default_name))?;
        let at = |field: &str, e: Error| Error::at(name.as_str(), field, e);

        let tunnel_ip = validate::parse_ipv4(&self.tunnel_ip).map_err(|e| at("tunnel_ip", e))?;
        let netmask = validate::parse_netmask(&self.netmask).map_err(|e| at("netmask", e))?;
        let mut input = PeerInput::new(name.clone(), tunnel_ip, netmask)
            .with_default_gateway(self.default_gateway);

        if let Some(host) = &self.endpoint {
            let host = validate::parse_endpoint(host.trim()).map_err(|e| at("endpoint", e))?;
            input = input.with_endpoint(host);
        }

        match (self.listen_port, port) {
            (Some(value), _) => {
                let port = validate::check_listen_port(value).map_err(|e| at("listen_port", e))?;
                input = input.with_listen_port(port);
            }
            (None, Port::Required) => {
                return Err(at("listen_port", Error::InvalidPort("missing".into())));
            }
            (None, Port::Optional) => {}
        }

        if let Some(interface) = &self.interface {
            let interface =
                validate::parse_interface_name(interface).map_err(|e| at("interface", e))?;
            input = input.with_interface(interface);
        }

        if let Some(value) = self.keepalive {
            let secs = validate::check_keepalive(value).map_err(|e| at("keepalive", e))?;
            input = input.with_keepalive(secs);
        }

        for entry in &self.local_networks {
            let ip = validate::parse_ipv4(&entry.ip).map_err(|e| at("local_networks.ip", e))?;
            let mask = validate::parse_netmask(&entry.netmask)
                .map_err(|e| at("local_networks.netmask", e))?;
            let network =
                LocalNetwork::new(ip, mask).map_err(|e| at("local_networks.netmask", e))?;
            input = input.with_local_network(network);
        }

        Ok(input)
    }
}
