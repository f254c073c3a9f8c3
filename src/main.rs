//! Tandem FTP Server - Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use std::io::Write;
use std::path::PathBuf;

use tandem_ftp_server::{Server, ServerConfig, SessionContext};

/// Command-line overrides; anything left unset comes from the config file
/// or `TANDEM_FTP_*` environment variables.
#[derive(Debug, Parser)]
#[command(name = "tandem-ftp-server", version, about = "A small FTP server")]
struct Cli {
    /// Host address: the control listener binds to it and, when it is a
    /// concrete IPv4 address, PASV replies advertise it
    #[arg(short = 'a', long = "ip-address")]
    ip_address: Option<String>,

    /// IPv4 address advertised in PASV replies, overriding `--ip-address`
    #[arg(long = "passive-address")]
    passive_address: Option<String>,

    /// Control port
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory exposed to clients
    #[arg(short, long)]
    root: Option<String>,

    /// TOML configuration file (defaults to ./config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(buf, "[{}] [{}] {}", timestamp, record.level(), record.args())
        })
        .init();

    let mut config = ServerConfig::load(cli.config.as_deref())
        .context("Failed to load server configuration")?;
    if let Some(ip) = cli.ip_address {
        config.set_host_address(&ip);
    }
    if let Some(passive) = cli.passive_address {
        config.passive_address = passive;
    }
    if let Some(port) = cli.port {
        config.control_port = port;
    }
    if let Some(root) = cli.root {
        config.server_root = root;
    }

    let ctx = SessionContext::new(config).context("Invalid server configuration")?;

    info!("Launching FTP server...");
    let server = Server::bind(ctx)
        .await
        .context("Failed to start control listener")?;
    server.start().await;

    Ok(())
}
