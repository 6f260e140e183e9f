//! wgwizard - WireGuard configuration wizard
//!
//! Reads a run description, generates keys and writes one tunnel config and
//! one setup script per peer.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wgwizard::config::{LoggingConfig, WizardConfig};
use wgwizard::crypto::{KeyGenerator, KeyPair};
use wgwizard::error::{Error, Result};
use wgwizard::net::{network_address, Netmask};
use wgwizard::output::{self, Manifest};
use wgwizard::topology::TopologyKind;

/// wgwizard - WireGuard configuration wizard
#[derive(Parser)]
#[command(name = "wgwizard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides the run file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a template run file
    Init {
        /// Topology of the template
        #[arg(short, long, value_parser = parse_topology, default_value = "site-to-site")]
        topology: TopologyKind,

        /// Output path for the run file
        #[arg(short, long, default_value = "wgwizard.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a run file
    Validate {
        /// Path to the run file
        #[arg(short, long, default_value = "wgwizard.toml")]
        config: PathBuf,
    },

    /// Generate keys, configs and setup scripts
    Generate {
        /// Path to the run file
        #[arg(short, long, default_value = "wgwizard.toml")]
        config: PathBuf,

        /// Directory the artifacts are written to
        #[arg(short, long, default_value = "wireguard-configuration")]
        out_dir: PathBuf,

        /// Print a JSON manifest (public data only) instead of a file list
        #[arg(long)]
        json: bool,
    },

    /// Print a new private key
    Genkey,

    /// Read a private key from stdin and print its public key
    Pubkey,

    /// Print a new pre-shared key
    Genpsk,

    /// Show both forms of a netmask
    Netmask {
        /// Netmask, dotted ("255.255.254.0") or prefix ("23")
        value: String,

        /// Also compute the network address of this IP
        #[arg(long)]
        ip: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The run file may carry a [logging] section, so load it before logging starts
    let run_config = match &cli.command {
        Commands::Validate { config } | Commands::Generate { config, .. } => {
            Some(WizardConfig::from_file(config))
        }
        _ => None,
    };
    let logging = run_config
        .as_ref()
        .and_then(|r| r.as_ref().ok())
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_logging(cli.log_level.as_deref(), &logging);

    match cli.command {
        Commands::Init {
            topology,
            output,
            force,
        } => run_init(topology, &output, force),
        Commands::Validate { config } => run_validate(&config, run_config),
        Commands::Generate {
            config,
            out_dir,
            json,
        } => run_generate(&config, run_config, &out_dir, json),
        Commands::Genkey => run_genkey(),
        Commands::Pubkey => run_pubkey(),
        Commands::Genpsk => run_genpsk(),
        Commands::Netmask { value, ip } => run_netmask(&value, ip.as_deref()),
    }
}

fn init_logging(level_override: Option<&str>, logging: &LoggingConfig) {
    let level = level_override.unwrap_or(&logging.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // stdout carries keys and manifests; logs go to stderr
    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "compact" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_topology(s: &str) -> std::result::Result<TopologyKind, String> {
    match s {
        "site-to-site" | "s2s" => Ok(TopologyKind::SiteToSite),
        "client-to-site" | "c2s" => Ok(TopologyKind::ClientToSite),
        "client-to-client" | "c2c" => Ok(TopologyKind::ClientToClient),
        other => Err(format!(
            "unknown topology '{}' (site-to-site, client-to-site, client-to-client)",
            other
        )),
    }
}

/// Write a template run file
fn run_init(topology: TopologyKind, output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            output.display()
        )));
    }

    let content = match topology {
        TopologyKind::SiteToSite => SITE_TO_SITE_TEMPLATE,
        TopologyKind::ClientToSite => CLIENT_TO_SITE_TEMPLATE,
        TopologyKind::ClientToClient => CLIENT_TO_CLIENT_TEMPLATE,
    };
    std::fs::write(output, content)?;

    println!("Run file created: {}", output.display());
    println!("\nEdit the addresses, endpoints and ports for your network.");
    println!("Then generate with: wgwizard generate --config {}", output.display());
    Ok(())
}

fn loaded(path: &Path, run_config: Option<Result<WizardConfig>>) -> Result<WizardConfig> {
    match run_config {
        Some(result) => result,
        None => WizardConfig::from_file(path),
    }
}

/// Validate a run file
fn run_validate(path: &Path, run_config: Option<Result<WizardConfig>>) -> Result<()> {
    match loaded(path, run_config) {
        Ok(config) => {
            println!("✓ Run file is valid");
            println!("  Topology: {}", config.topology);
            println!("  Peers: {}", config.peer_count());
            println!("  Pre-shared keys: {:?}", config.psk);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Run file error: {}", e);
            Err(e)
        }
    }
}

/// Generate and write every artifact
fn run_generate(
    path: &Path,
    run_config: Option<Result<WizardConfig>>,
    out_dir: &Path,
    json: bool,
) -> Result<()> {
    let config = loaded(path, run_config)?;
    let topology = config.to_topology()?;
    info!(
        "Generating {} configuration for {} peers",
        topology.kind(),
        config.peer_count()
    );

    let bundle = topology.assemble(&mut KeyGenerator::os()).map_err(|e| {
        if e.is_fatal() {
            error!("Aborting run, no files written: {}", e);
        }
        e
    })?;
    let written = output::write_bundle(&bundle, out_dir)?;

    if json {
        println!("{}", Manifest::from_bundle(&bundle).to_json()?);
    } else {
        println!("Generated {} configuration:", bundle.kind);
        for path in &written {
            println!("  {}", path.display());
        }
    }
    Ok(())
}

fn run_genkey() -> Result<()> {
    let keypair = KeyPair::generate()?;
    println!("{}", keypair.private_key_base64());
    Ok(())
}

fn run_pubkey() -> Result<()> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let keypair = KeyPair::from_private_key_base64(&line)?;
    println!("{}", keypair.public_key_base64());
    Ok(())
}

fn run_genpsk() -> Result<()> {
    let psk = KeyGenerator::os().generate_psk()?;
    println!("{}", psk.to_base64());
    Ok(())
}

fn run_netmask(value: &str, ip: Option<&str>) -> Result<()> {
    let mask = Netmask::from_text(value)?;
    println!("Netmask:  {}", mask.dotted());
    println!("Prefix:   /{}", mask.prefix());
    if let Some(ip) = ip {
        println!("Network:  {}/{}", network_address(ip, &mask)?, mask.prefix());
    }
    Ok(())
}

const SITE_TO_SITE_TEMPLATE: &str = r#"# wgwizard run file: site-to-site
# Two gateways, each routing its local networks through the tunnel.

topology = "site-to-site"
psk = "shared"                  # disabled | per-peer | shared

[logging]
level = "info"
format = "pretty"

[[peers]]
name = "site1"
tunnel_ip = "10.0.0.1"
netmask = "24"
endpoint = "198.51.100.1"
listen_port = 51820
# interface = "wg0"
# keepalive = 25
default_gateway = false
local_networks = [
    { ip = "192.168.1.0", netmask = "255.255.255.0" },
]

[[peers]]
name = "site2"
tunnel_ip = "10.0.0.2"
netmask = "24"
endpoint = "198.51.100.2"
listen_port = 51820
default_gateway = false
local_networks = [
    { ip = "192.168.2.0", netmask = "255.255.255.0" },
]
"#;

const CLIENT_TO_SITE_TEMPLATE: &str = r#"# wgwizard run file: client-to-site
# One site accepting roaming clients.

topology = "client-to-site"
psk = "per-peer"                # disabled | per-peer | shared

[logging]
level = "info"
format = "pretty"

[site]
name = "site"
tunnel_ip = "10.8.0.1"
netmask = "24"
endpoint = "vpn.example.net"
listen_port = 51820
local_networks = [
    { ip = "192.168.5.0", netmask = "255.255.255.0" },
]

[[clients]]
name = "client-1"
tunnel_ip = "10.8.0.2"
netmask = "24"
keepalive = 25
default_gateway = false

[[clients]]
name = "client-2"
tunnel_ip = "10.8.0.3"
netmask = "24"
keepalive = 25
default_gateway = true
"#;

const CLIENT_TO_CLIENT_TEMPLATE: &str = r#"# wgwizard run file: client-to-client
# Two hosts linked directly; only the tunnel addresses are routed.

topology = "client-to-client"
psk = "shared"                  # disabled | per-peer | shared

[logging]
level = "info"
format = "pretty"

[[peers]]
name = "client1"
tunnel_ip = "10.9.0.1"
netmask = "30"
endpoint = "198.51.100.7"
listen_port = 51820

[[peers]]
name = "client2"
tunnel_ip = "10.9.0.2"
netmask = "30"
endpoint = "198.51.100.8"
listen_port = 51820
keepalive = 25
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_valid() {
        for (kind, template) in [
            (TopologyKind::SiteToSite, SITE_TO_SITE_TEMPLATE),
            (TopologyKind::ClientToSite, CLIENT_TO_SITE_TEMPLATE),
            (TopologyKind::ClientToClient, CLIENT_TO_CLIENT_TEMPLATE),
        ] {
            let config = WizardConfig::from_str(template).unwrap();
            assert_eq!(config.topology, kind);
        }
    }

    #[test]
    fn test_parse_topology_aliases() {
        assert_eq!(parse_topology("c2s").unwrap(), TopologyKind::ClientToSite);
        assert_eq!(parse_topology("site-to-site").unwrap(), TopologyKind::SiteToSite);
        assert!(parse_topology("mesh").is_err());
    }
}
