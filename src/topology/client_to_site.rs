//! One site accepting any number of clients (star)

use rand::{CryptoRng, RngCore};

use super::{GeneratedPeer, PskMode};
use crate::crypto::KeyGenerator;
use crate::error::{Error, Result};
use crate::peer::{PeerConfig, PeerInput};
use crate::render::{PeerSection, Route, SetupScript, TunnelConfig};

pub const DEFAULT_SITE_NAME: &str = "site";

/// Default name of the client at `index` (0-based): `client-1`, `client-2`, ...
pub fn default_client_name(index: usize) -> String {
    format!("client-{}", index + 1)
}

#[derive(Debug, Clone)]
pub struct ClientToSite {
    pub site: PeerInput,
    pub clients: Vec<PeerInput>,
    pub psk: PskMode,
}

impl ClientToSite {
    pub fn new(site: PeerInput, clients: Vec<PeerInput>) -> Self {
        Self {
            site,
            clients,
            psk: PskMode::Disabled,
        }
    }

    pub fn with_psk(mut self, psk: PskMode) -> Self {
        self.psk = psk;
        self
    }

    /// The site gets one `[Peer]` block per client with that client's host
    /// route; each client gets a single block for the site carrying the
    /// site's local networks. Clients never advertise networks and the site
    /// never routes through a client.
    pub(crate) fn assemble<R: RngCore + CryptoRng>(
        &self,
        keys: &mut KeyGenerator<R>,
    ) -> Result<Vec<GeneratedPeer>> {
        if self.clients.is_empty() {
            return Err(Error::Config(
                "client-to-site needs at least one client".into(),
            ));
        }

        let mut site_input = self.site.clone();
        site_input.default_gateway = false;
        let site = PeerConfig::new(site_input, keys.generate()?)?;

        let shared = match self.psk {
            PskMode::Shared => Some(keys.generate_psk()?),
            _ => None,
        };

        let mut clients = Vec::with_capacity(self.clients.len());
        for input in &self.clients {
            let mut input = input.clone();
            input.local_networks.clear();
            let mut client = PeerConfig::new(input, keys.generate()?)?;
            client.preshared_key = match self.psk {
                PskMode::Disabled => None,
                PskMode::PerPeer => Some(keys.generate_psk()?),
                PskMode::Shared => shared.clone(),
            };
            clients.push(client);
        }

        let sections = clients
            .iter()
            .map(|c| PeerSection::for_remote(&site, c, c.preshared_key.as_ref(), false))
            .collect();
        let site_peer = GeneratedPeer {
            tunnel_config: TunnelConfig::new(&site, sections).render(),
            setup_script: SetupScript::new(&site, Vec::new()).render(),
            config: site,
        };

        let mut peers = Vec::with_capacity(clients.len() + 1);
        for client in clients {
            let section = PeerSection::for_remote(
                &client,
                &site_peer.config,
                client.preshared_key.as_ref(),
                true,
            );
            let tunnel_config = TunnelConfig::new(&client, vec![section]).render();
            let setup_script =
                SetupScript::new(&client, Route::towards(&client, &site_peer.config)).render();
            peers.push(GeneratedPeer {
                config: client,
                tunnel_config,
                setup_script,
            });
        }
        peers.insert(0, site_peer);

        Ok(peers)
    }
}
