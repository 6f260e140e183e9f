//! wgwizard - WireGuard configuration wizard
//!
//! Generates ready-to-deploy WireGuard tunnel configurations and setup
//! scripts for three topologies: site-to-site, client-to-site and
//! client-to-client.
//!
//! # Architecture
//!
//! The core (`net`, `validate`, `crypto`, `peer`, `render`, `topology`) is
//! a pure transformation from validated input to rendered text. It performs
//! no I/O and does not log. `config` and `output` are the collaborator layer
//! used by the `wgwizard` binary: they read run descriptions, write files
//! and report through `tracing`.
//!
//! # Example
//!
//! ```no_run
//! use wgwizard::prelude::*;
//!
//! let site1 = PeerInput::new("site1", "10.0.0.1".parse().unwrap(), Netmask::from_text("24")?)
//!     .with_endpoint("198.51.100.1")
//!     .with_listen_port(51820);
//! let site2 = PeerInput::new("site2", "10.0.0.2".parse().unwrap(), Netmask::from_text("24")?)
//!     .with_endpoint("198.51.100.2")
//!     .with_listen_port(51820);
//!
//! let topology = Topology::from(SiteToSite::new(site1, site2).with_psk(PskMode::Shared));
//! let bundle = topology.assemble(&mut KeyGenerator::os())?;
//! for (file, text) in bundle.files() {
//!     println!("== {}\n{}", file, text);
//! }
//! # Ok::<(), wgwizard::Error>(())
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod net;
pub mod output;
pub mod peer;
pub mod render;
pub mod topology;
pub mod validate;

pub use config::WizardConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::WizardConfig;
    pub use crate::crypto::{KeyGenerator, KeyPair, PresharedKey};
    pub use crate::error::{Error, Result};
    pub use crate::net::{network_address, Netmask};
    pub use crate::peer::{LocalNetwork, PeerConfig, PeerInput};
    pub use crate::topology::{
        Bundle, ClientToClient, ClientToSite, GeneratedPeer, PskMode, SiteToSite, Topology,
        TopologyKind,
    };
}
