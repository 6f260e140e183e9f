//! Two gateways, each routing its local networks to the other

use rand::{CryptoRng, RngCore};

use super::{assemble_pair, GeneratedPeer, PskMode};
use crate::crypto::KeyGenerator;
use crate::error::Result;
use crate::peer::PeerInput;

pub const DEFAULT_NAMES: [&str; 2] = ["site1", "site2"];

#[derive(Debug, Clone)]
pub struct SiteToSite {
    pub sites: [PeerInput; 2],
    pub psk: PskMode,
}

impl SiteToSite {
    pub fn new(site1: PeerInput, site2: PeerInput) -> Self {
        Self {
            sites: [site1, site2],
            psk: PskMode::Disabled,
        }
    }

    pub fn with_psk(mut self, psk: PskMode) -> Self {
        self.psk = psk;
        self
    }

    pub(crate) fn assemble<R: RngCore + CryptoRng>(
        &self,
        keys: &mut KeyGenerator<R>,
    ) -> Result<Vec<GeneratedPeer>> {
        let [site1, site2] = &self.sites;
        assemble_pair(site1, site2, self.psk, true, keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::test_support::*;
    use crate::topology::Topology;

    fn sites() -> SiteToSite {
        SiteToSite::new(
            input("site1", [10, 0, 0, 1])
                .with_endpoint("198.51.100.1")
                .with_listen_port(51820)
                .with_local_network(network([192, 168, 1, 0], "255.255.255.0")),
            input("site2", [10, 0, 0, 2])
                .with_endpoint("198.51.100.2")
                .with_listen_port(51821)
                .with_keepalive(30)
                .with_local_network(network([192, 168, 2, 14], "24"))
                .with_local_network(network([10, 20, 0, 0], "255.255.0.0")),
        )
    }

    #[test]
    fn test_psk_identical_on_both_sides() {
        let bundle = Topology::from(sites().with_psk(PskMode::PerPeer))
            .assemble(&mut keys(1))
            .unwrap();
        let site1 = bundle.get("site1").unwrap();
        let site2 = bundle.get("site2").unwrap();

        let psk1 = line_value(&site1.tunnel_config, "PresharedKey").unwrap();
        let psk2 = line_value(&site2.tunnel_config, "PresharedKey").unwrap();
        assert_eq!(psk1, psk2);
        assert_eq!(psk1.len(), 44);
        assert_eq!(site1.config.preshared_key, site2.config.preshared_key);
    }

    #[test]
    fn test_no_psk_when_disabled() {
        let bundle = Topology::from(sites()).assemble(&mut keys(2)).unwrap();
        for peer in &bundle.peers {
            assert!(!peer.tunnel_config.contains("PresharedKey"));
            assert!(peer.config.preshared_key.is_none());
        }
    }

    #[test]
    fn test_cross_linked_keys_and_endpoints() {
        let bundle = Topology::from(sites()).assemble(&mut keys(3)).unwrap();
        let site1 = bundle.get("site1").unwrap();
        let site2 = bundle.get("site2").unwrap();

        assert_eq!(
            line_value(&site1.tunnel_config, "PublicKey").unwrap(),
            site2.config.keypair.public_key_base64()
        );
        assert_eq!(
            line_value(&site2.tunnel_config, "PublicKey").unwrap(),
            site1.config.keypair.public_key_base64()
        );
        assert_eq!(line_value(&site1.tunnel_config, "Endpoint"), Some("198.51.100.2:51821"));
        assert_eq!(line_value(&site2.tunnel_config, "Endpoint"), Some("198.51.100.1:51820"));
        assert_eq!(line_value(&site1.tunnel_config, "ListenPort"), Some("51820"));
    }

    #[test]
    fn test_allowed_ips_include_remote_networks() {
        let bundle = Topology::from(sites()).assemble(&mut keys(4)).unwrap();
        let site1 = bundle.get("site1").unwrap();
        let site2 = bundle.get("site2").unwrap();

        assert_eq!(
            line_value(&site1.tunnel_config, "AllowedIPs"),
            Some("10.0.0.2/32,192.168.2.0/24,10.20.0.0/16")
        );
        assert_eq!(
            line_value(&site2.tunnel_config, "AllowedIPs"),
            Some("10.0.0.1/32,192.168.1.0/24")
        );
    }

    #[test]
    fn test_keepalive_belongs_to_owner() {
        let bundle = Topology::from(sites()).assemble(&mut keys(5)).unwrap();
        assert!(!bundle.get("site1").unwrap().tunnel_config.contains("PersistentKeepalive"));
        assert_eq!(
            line_value(&bundle.get("site2").unwrap().tunnel_config, "PersistentKeepalive"),
            Some("30")
        );
    }

    #[test]
    fn test_setup_scripts_route_remote_networks() {
        let bundle = Topology::from(sites()).assemble(&mut keys(6)).unwrap();
        let setup1 = &bundle.get("site1").unwrap().setup_script;
        let setup2 = &bundle.get("site2").unwrap().setup_script;

        assert!(setup1.starts_with("#!/bin/bash\n"));
        assert!(setup1.contains("ip addr add 10.0.0.1/24 dev wg0\n"));
        assert!(setup1.contains("wg setconf wg0 site1.conf\n"));
        assert!(setup1.contains("ip route add 192.168.2.0/24 via 10.0.0.2\n"));
        assert!(setup1.contains("ip route add 10.20.0.0/16 via 10.0.0.2\n"));
        assert!(setup2.contains("ip route add 192.168.1.0/24 via 10.0.0.1\n"));
    }

    #[test]
    fn test_default_gateway_replaces_network_routes() {
        let mut topology = sites();
        topology.sites[0].default_gateway = true;
        let bundle = Topology::from(topology).assemble(&mut keys(7)).unwrap();
        let setup1 = &bundle.get("site1").unwrap().setup_script;

        assert!(setup1.contains("ip route add default via 10.0.0.2\n"));
        assert!(!setup1.contains("192.168.2.0/24"));
        // AllowedIPs are unaffected by the route policy
        assert!(bundle.get("site1").unwrap().tunnel_config.contains("192.168.2.0/24"));
    }
}
