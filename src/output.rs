//! Writing a generated bundle to disk
//!
//! This is the only place files are created. Tunnel configs hold private
//! keys and are written owner-only; setup scripts are owner-executable.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::topology::{Bundle, TopologyKind};

/// Name of the deployment notes written next to the artifacts
pub const README_FILE: &str = "README.txt";

/// Public description of one generated peer (no secrets)
#[derive(Debug, Clone, Serialize)]
pub struct PeerSummary {
    pub name: String,
    pub public_key: String,
    pub tunnel_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub interface: String,
    pub preshared_key: bool,
    pub config_file: String,
    pub setup_file: String,
}

/// Public description of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub topology: TopologyKind,
    pub peers: Vec<PeerSummary>,
}

impl Manifest {
    pub fn from_bundle(bundle: &Bundle) -> Self {
        let peers = bundle
            .peers
            .iter()
            .map(|p| PeerSummary {
                name: p.config.name.clone(),
                public_key: p.config.keypair.public_key_base64(),
                tunnel_address: p.config.tunnel_cidr().to_string(),
                endpoint: p.config.endpoint_address(),
                interface: p.config.interface.clone(),
                preshared_key: p.config.preshared_key.is_some(),
                config_file: p.config.config_file_name(),
                setup_file: p.config.setup_file_name(),
            })
            .collect();
        Self {
            topology: bundle.kind,
            peers,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Deployment notes for a bundle
pub fn render_readme(bundle: &Bundle) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "WireGuard {} configuration", bundle.kind);
    let _ = writeln!(out);
    match bundle.kind {
        TopologyKind::SiteToSite => {
            let _ = writeln!(out, "Copy each pair of files to its gateway.");
            let _ = writeln!(
                out,
                "Both gateways must accept UDP on their listen port and forward IPv4."
            );
        }
        TopologyKind::ClientToSite => {
            let _ = writeln!(out, "Copy the site files to the server and one pair to each client.");
            let _ = writeln!(out, "The site must accept UDP on its listen port and forward IPv4.");
        }
        TopologyKind::ClientToClient => {
            let _ = writeln!(out, "Copy each pair of files to its host.");
            let _ = writeln!(out, "At least one host must be reachable on its listen port.");
        }
    }
    let _ = writeln!(out, "Run the setup script as root from the directory holding the .conf file.");
    let _ = writeln!(out);
    for peer in &bundle.peers {
        let _ = writeln!(
            out,
            "{:<16} {} + {}  ({})",
            peer.name(),
            peer.config.config_file_name(),
            peer.config.setup_file_name(),
            peer.config.tunnel_cidr()
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "The .conf files contain private keys. Do not share them.");
    out
}

/// Write every artifact of `bundle` plus the README into `dir`.
///
/// Returns the paths written, in order.
pub fn write_bundle(bundle: &Bundle, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for peer in &bundle.peers {
        let conf = dir.join(peer.config.config_file_name());
        write_file(&conf, &peer.tunnel_config, 0o600)?;
        written.push(conf);

        let setup = dir.join(peer.config.setup_file_name());
        write_file(&setup, &peer.setup_script, 0o700)?;
        written.push(setup);
    }

    let readme = dir.join(README_FILE);
    write_file(&readme, &render_readme(bundle), 0o644)?;
    written.push(readme);

    info!(
        "Wrote {} files for {} peers to {:?}",
        written.len(),
        bundle.peers.len(),
        dir
    );
    for stale in stale_files(&written, dir)? {
        warn!("{:?} is not part of this run and was left untouched", stale);
    }
    Ok(written)
}

/// Configs and setup scripts in `dir` that `written` does not account for,
/// typically left by an earlier run with other peer names
pub fn stale_files(written: &[PathBuf], dir: &Path) -> Result<Vec<PathBuf>> {
    let current: HashSet<&Path> = written.iter().map(PathBuf::as_path).collect();
    let mut stale = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        let artifact =
            name.ends_with(".conf") || (name.starts_with("setup_") && name.ends_with(".sh"));
        if artifact && !current.contains(path.as_path()) {
            stale.push(path);
        }
    }
    stale.sort();
    Ok(stale)
}

/// Create or truncate `path` with `mode` already applied, so key material
/// is never readable at a looser mode
fn write_file(path: &Path, contents: &str, mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    let mut file = options.open(path)?;

    // An existing file keeps its old mode through open()
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    file.write_all(contents.as_bytes())?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}
