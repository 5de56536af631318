use anyhow::{Context, Result};
use clap::Parser;
use shared::{Config, IbgeClient, ProfileStore};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod session;

use session::Session;

#[derive(Parser)]
#[command(name = "news-shelf")]
#[command(about = "Search IBGE news and keep favorites, read and read-later lists")]
struct Args {
    /// Path to the saved profile (default: data/usuario.json)
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// IBGE news API endpoint
    #[arg(long)]
    api_url: Option<String>,
}

fn init_tracing() {
    // Logs go to stderr so they stay out of the menus
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(path) = args.data_file {
        config.data_file = path;
    }
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    tracing::debug!(?config, "Configuration loaded");

    let client = IbgeClient::new(&config.api_url, config.request_timeout)
        .context("Failed to set up the IBGE news client")?;
    let store = ProfileStore::new(config.data_file);

    let stdin = io::stdin();
    let mut session = Session::start(client, store, stdin.lock(), io::stdout())?;
    session.run().await
}
