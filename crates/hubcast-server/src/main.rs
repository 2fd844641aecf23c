use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use hubcast_core::BridgeConfig;
use hubcast_dispatch::BotRegistry;
use hubcast_server::{run_webhook_server, WebhookServerState};
use hubcast_store::SqliteSubscriptionStore;

#[derive(Debug, Parser)]
#[command(
    name = "hubcast",
    about = "GitHub webhook to chat notification bridge",
    version
)]
struct Cli {
    #[arg(
        long,
        env = "HUBCAST_CONFIG",
        default_value = "hubcast.toml",
        help = "Path to the bridge configuration file."
    )]
    config: PathBuf,

    #[arg(
        long,
        env = "HUBCAST_DB",
        default_value = "hubcast.sqlite",
        help = "Path to the subscription database."
    )]
    db: PathBuf,

    #[arg(
        long,
        env = "HUBCAST_BIND",
        default_value = "127.0.0.1:8700",
        help = "Address the webhook server binds to."
    )]
    bind: String,
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = BridgeConfig::load(&cli.config)?;
    let store = SqliteSubscriptionStore::new(&cli.db)
        .with_context(|| format!("failed to open subscription store {}", cli.db.display()))?;

    // Standalone runs carry no live connections; the embedding host registers
    // its own through the library API before serving.
    let bots = BotRegistry::new();
    if bots.is_empty() {
        tracing::warn!("no bot connections registered; notifications will be skipped");
    }

    let state = Arc::new(WebhookServerState {
        config,
        store,
        bots,
    });
    run_webhook_server(&cli.bind, state).await
}
