mod auto_invite;
mod config;
mod gewe;
mod matcher;
mod platform;
mod plugin;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auto_invite::AutoInviteGroup;
use crate::config::{Config, InviteConfig};
use crate::gewe::GeweClient;
use crate::plugin::PluginChain;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries replies
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,auto_invite=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Gateway: {}", config.gewechat.base_url);
    info!("  App ID: {}", config.gewechat.app_id);
    info!("  Plugin config: {}", config.plugin.config_path.display());

    let invite_config = InviteConfig::load(&config.plugin.config_path)
        .context("Failed to initialize AutoInviteGroup")?;
    let client = GeweClient::new(&config.gewechat)?;

    let mut chain = PluginChain::new();
    chain.register(Arc::new(AutoInviteGroup::new(
        invite_config,
        Arc::new(client),
    )));
    info!("Plugin help:\n{}", chain.help(true));

    info!("Host is starting...");
    platform::stdio::run(&chain, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    Ok(())
}
