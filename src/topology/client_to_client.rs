//! Two hosts linked directly, host-to-host routing only

use rand::{CryptoRng, RngCore};

use super::{assemble_pair, GeneratedPeer, PskMode};
use crate::crypto::KeyGenerator;
use crate::error::Result;
use crate::peer::PeerInput;

pub const DEFAULT_NAMES: [&str; 2] = ["client1", "client2"];

#[derive(Debug, Clone)]
pub struct ClientToClient {
    pub clients: [PeerInput; 2],
    pub psk: PskMode,
}

impl ClientToClient {
    pub fn new(client1: PeerInput, client2: PeerInput) -> Self {
        Self {
            clients: [client1, client2],
            psk: PskMode::Disabled,
        }
    }

    pub fn with_psk(mut self, psk: PskMode) -> Self {
        self.psk = psk;
        self
    }

    /// Local networks on either input are dropped: only the two tunnel
    /// addresses are ever routed.
    pub(crate) fn assemble<R: RngCore + CryptoRng>(
        &self,
        keys: &mut KeyGenerator<R>,
    ) -> Result<Vec<GeneratedPeer>> {
        let [first, second] = self.clients.clone().map(|mut c| {
            c.local_networks.clear();
            c
        });
        assemble_pair(&first, &second, self.psk, false, keys)
    }
}
