//! Topology assembly
//!
//! Each topology turns validated [`PeerInput`]s into a [`Bundle`]: one
//! [`PeerConfig`] per endpoint, cross-linked with its remotes, plus the
//! rendered tunnel config and setup script for each.
//!
//! Key material is drawn in a fixed order (keypairs in peer order, then
//! pre-shared keys) so that a seeded [`KeyGenerator`] reproduces a bundle
//! byte for byte.

pub mod client_to_client;
pub mod client_to_site;
pub mod site_to_site;

pub use client_to_client::ClientToClient;
pub use client_to_site::ClientToSite;
pub use site_to_site::SiteToSite;

use std::collections::HashSet;
use std::fmt;

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::crypto::KeyGenerator;
use crate::error::{Error, Result};
use crate::peer::{PeerConfig, PeerInput};
use crate::render::{PeerSection, Route, SetupScript, TunnelConfig};
use crate::validate;

/// The three supported peer-relationship shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopologyKind {
    SiteToSite,
    ClientToSite,
    ClientToClient,
}

impl TopologyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyKind::SiteToSite => "site-to-site",
            TopologyKind::ClientToSite => "client-to-site",
            TopologyKind::ClientToClient => "client-to-client",
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who generates pre-shared keys.
///
/// In two-peer topologies any enabled mode yields one key for the pair. In
/// client-to-site, `PerPeer` gives every client its own key and `Shared`
/// gives every client the key generated for the first one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PskMode {
    #[default]
    Disabled,
    PerPeer,
    Shared,
}

impl PskMode {
    pub fn enabled(&self) -> bool {
        !matches!(self, PskMode::Disabled)
    }
}

/// Rendered artifacts for one endpoint
#[derive(Debug, Clone)]
pub struct GeneratedPeer {
    pub config: PeerConfig,
    /// Contents of `<name>.conf`
    pub tunnel_config: String,
    /// Contents of `setup_<name>.sh`
    pub setup_script: String,
}

impl GeneratedPeer {
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

/// Output of one generation run, in peer order
#[derive(Debug, Clone)]
pub struct Bundle {
    pub kind: TopologyKind,
    pub peers: Vec<GeneratedPeer>,
}

impl Bundle {
    /// Look up a peer by name
    pub fn get(&self, name: &str) -> Option<&GeneratedPeer> {
        self.peers.iter().find(|p| p.name() == name)
    }

    /// All artifacts as `(file name, contents)`, config before script
    pub fn files(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.peers.iter().flat_map(|p| {
            [
                (p.config.config_file_name(), p.tunnel_config.as_str()),
                (p.config.setup_file_name(), p.setup_script.as_str()),
            ]
        })
    }
}

/// A fully specified generation run
#[derive(Debug, Clone)]
pub enum Topology {
    SiteToSite(SiteToSite),
    ClientToSite(ClientToSite),
    ClientToClient(ClientToClient),
}

impl Topology {
    pub fn kind(&self) -> TopologyKind {
        match self {
            Topology::SiteToSite(_) => TopologyKind::SiteToSite,
            Topology::ClientToSite(_) => TopologyKind::ClientToSite,
            Topology::ClientToClient(_) => TopologyKind::ClientToClient,
        }
    }

    /// Peer inputs in output order
    pub fn inputs(&self) -> Vec<&PeerInput> {
        match self {
            Topology::SiteToSite(t) => t.sites.iter().collect(),
            Topology::ClientToClient(t) => t.clients.iter().collect(),
            Topology::ClientToSite(t) => std::iter::once(&t.site).chain(t.clients.iter()).collect(),
        }
    }

    /// Peer names in output order
    pub fn peer_names(&self) -> Vec<&str> {
        self.inputs().into_iter().map(|p| p.name.as_str()).collect()
    }

    /// Generate keys and render every artifact.
    ///
    /// Fails on a peer name or endpoint that could not have come through the
    /// field validators, duplicate peer names, an empty client list, or an
    /// entropy failure. The latter must abort the run.
    pub fn assemble<R: RngCore + CryptoRng>(&self, keys: &mut KeyGenerator<R>) -> Result<Bundle> {
        for input in self.inputs() {
            check_input(input)?;
        }
        ensure_unique_names(&self.peer_names())?;
        let peers = match self {
            Topology::SiteToSite(t) => t.assemble(keys)?,
            Topology::ClientToSite(t) => t.assemble(keys)?,
            Topology::ClientToClient(t) => t.assemble(keys)?,
        };
        Ok(Bundle {
            kind: self.kind(),
            peers,
        })
    }
}

impl From<SiteToSite> for Topology {
    fn from(t: SiteToSite) -> Self {
        Topology::SiteToSite(t)
    }
}

impl From<ClientToSite> for Topology {
    fn from(t: ClientToSite) -> Self {
        Topology::ClientToSite(t)
    }
}

impl From<ClientToClient> for Topology {
    fn from(t: ClientToClient) -> Self {
        Topology::ClientToClient(t)
    }
}

/// Names become file names and endpoints are written verbatim into configs
fn check_input(input: &PeerInput) -> Result<()> {
    validate::parse_peer_name(&input.name)?;
    if let Some(host) = &input.endpoint {
        if validate::parse_endpoint(host)? != *host {
            return Err(Error::InvalidEndpoint(host.escape_debug().to_string()));
        }
    }
    Ok(())
}

fn ensure_unique_names(names: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(*name) {
            return Err(Error::InvalidPeerName(format!("duplicate peer name '{}'", name)));
        }
    }
    Ok(())
}

/// Link two peers symmetrically.
///
/// Both sides advertise their local networks to each other when
/// `advertise_local_networks` is set; a pair PSK, if enabled, is generated
/// once and copied to both sides.
pub(crate) fn assemble_pair<R: RngCore + CryptoRng>(
    first: &PeerInput,
    second: &PeerInput,
    psk: PskMode,
    advertise_local_networks: bool,
    keys: &mut KeyGenerator<R>,
) -> Result<Vec<GeneratedPeer>> {
    let mut a = PeerConfig::new(first.clone(), keys.generate()?)?;
    let mut b = PeerConfig::new(second.clone(), keys.generate()?)?;

    if psk.enabled() {
        let key = keys.generate_psk()?;
        a.preshared_key = Some(key.clone());
        b.preshared_key = Some(key);
    }

    let render = |own: &PeerConfig, remote: &PeerConfig| {
        let section = PeerSection::for_remote(
            own,
            remote,
            own.preshared_key.as_ref(),
            advertise_local_networks,
        );
        let tunnel_config = TunnelConfig::new(own, vec![section]).render();
        let setup_script = SetupScript::new(own, Route::towards(own, remote)).render();
        (tunnel_config, setup_script)
    };

    let (a_config, a_setup) = render(&a, &b);
    let (b_config, b_setup) = render(&b, &a);

    Ok(vec![
        GeneratedPeer {
            config: a,
            tunnel_config: a_config,
            setup_script: a_setup,
        },
        GeneratedPeer {
            config: b,
            tunnel_config: b_config,
            setup_script: b_setup,
        },
    ])
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::net::Ipv4Addr;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::crypto::KeyGenerator;
    use crate::net::Netmask;
    use crate::peer::{LocalNetwork, PeerInput};

    pub fn keys(seed: u64) -> KeyGenerator<StdRng> {
        KeyGenerator::new(StdRng::seed_from_u64(seed))
    }

    pub fn mask(text: &str) -> Netmask {
        Netmask::from_text(text).unwrap()
    }

    pub fn input(name: &str, ip: [u8; 4]) -> PeerInput {
        PeerInput::new(name, Ipv4Addr::from(ip), mask("24"))
    }

    pub fn network(ip: [u8; 4], netmask: &str) -> LocalNetwork {
        LocalNetwork::new(Ipv4Addr::from(ip), mask(netmask)).unwrap()
    }

    /// Value of the first `key = value` line
    pub fn line_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
        text.lines()
            .find_map(|l| l.strip_prefix(key).and_then(|rest| rest.strip_prefix(" = ")))
    }
}
