mod app;
mod block_font;
mod export;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use tally_core::{
    config::{self, AppConfig},
    ledger::{Coordinator, Ledger},
    store::FileStore,
};
use tokio::sync::mpsc;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let store = FileStore::new(&config.data_root);
    store.prepare(&config.profile).await?;
    let days = store.load_days(&config.profile).await?;
    let goal = store.load_goal(&config.profile).await?;
    tracing::info!(
        profile = %config.profile,
        days = days.len(),
        goal = ?goal,
        "record store hydrated"
    );

    let (store_tx, store_rx) = mpsc::channel(8);
    let coordinator = Coordinator::new(
        store,
        config.profile.clone(),
        Ledger::new(days, goal),
        store_tx,
    );

    let mut app = app::TallyApp::new(config, coordinator);
    app.attach_store_events(store_rx);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("tallytui.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
