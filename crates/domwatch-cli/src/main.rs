//! domwatch: command-line client for the domwatch control plane.
//!
//! # Usage
//!
//! ```text
//! domwatch list
//! domwatch add <domain>
//! domwatch remove <domain>
//! domwatch set host|port|token <value>
//! ```
//!
//! `--host`, `--port` and `--token` override the saved settings for one call.

mod client;
mod config;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use config::CliConfig;

/// Longest domain name the server accepts
const MAX_DOMAIN_LEN: usize = 255;

#[derive(Parser, Debug)]
#[command(
    name = "domwatch",
    version,
    about = "Manage the domains a domwatch server is watching",
    long_about = None,
)]
struct Cli {
    /// Server host name
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server control-plane port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Control-plane token
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all domains the server is watching.
    #[command(alias = "l")]
    List,

    /// Add a domain to the watch-list.
    #[command(alias = "a")]
    Add { domain: String },

    /// Remove a domain from the watch-list.
    #[command(alias = "r")]
    Remove { domain: String },

    /// Persist a setting (host, port or token) to the client config.
    Set { key: String, value: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = CliConfig::default_path()?;
    let mut config = CliConfig::load_from(&path)?;

    let command = match &cli.command {
        Commands::Set { key, value } => {
            config.set(key, value)?;
            config.save_to(&path)?;
            println!("{} saved to {}", key, path.display());
            return Ok(());
        }
        Commands::List => "LIST".to_string(),
        Commands::Add { domain } => format!("ADD {}", checked_domain(domain)?),
        Commands::Remove { domain } => format!("REMOVE {}", checked_domain(domain)?),
    };

    let host = cli.host.unwrap_or(config.host);
    let port = cli.port.unwrap_or(config.port);
    let token = cli.token.unwrap_or(config.token);
    if token.is_empty() {
        bail!("no token configured: pass --token or run 'domwatch set token <value>'");
    }

    let reply = client::exchange(&host, port, &token, &command).await?;
    println!("{}", reply);
    Ok(())
}

fn checked_domain(domain: &str) -> Result<&str> {
    if domain.len() > MAX_DOMAIN_LEN {
        bail!("domain name contains too many characters: {}", domain);
    }
    if domain.is_empty() || domain.chars().any(char::is_whitespace) {
        bail!("domain name must be a single non-empty word: '{}'", domain);
    }
    Ok(domain)
}
