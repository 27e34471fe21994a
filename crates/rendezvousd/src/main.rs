//! rendezvousd — hosts a rendezvous store until interrupted.
//!
//! The protocol layer that serves remote peers embeds `RendezvousStore`
//! directly; this binary owns process concerns only: logging, config, and an
//! orderly close on ctrl-c so the sweeper drains and the database is released.

use anyhow::{Context, Result};

use rendezvous_core::config::RendezvousConfig;
use rendezvous_store::{is_memory, RendezvousStore, StoreOptions};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = RendezvousConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let mut config = RendezvousConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        RendezvousConfig::default()
    });

    // An explicit locator on the command line wins over the config file.
    if let Some(locator) = std::env::args().nth(1) {
        config.store.locator = locator;
    }
    let locator = config.store.locator.clone();
    tracing::info!(locator = %locator, "rendezvousd starting");

    if !is_memory(&locator) {
        if let Some(parent) = std::path::Path::new(&locator).parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let options = StoreOptions::from_config(&config);
    tracing::info!(
        sweep_interval_secs = options.sweep_interval.as_secs(),
        max_discover_limit = options.max_discover_limit,
        max_ttl_secs = options.max_ttl_secs,
        "store options"
    );

    let store = RendezvousStore::open_with(
        &locator,
        options,
        std::sync::Arc::new(rendezvous_core::SystemClock),
    )
    .await
    .with_context(|| format!("failed to open store at {locator}"))?;

    tracing::info!(
        nonce = hex::encode(store.nonce().as_bytes()),
        durable = store.is_durable(),
        "store ready"
    );

    // ── Wait for exit ────────────────────────────────────────────────────────

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("shutdown signal received");

    store.close().await.context("failed to close store")?;
    tracing::info!("rendezvousd stopped");
    Ok(())
}
