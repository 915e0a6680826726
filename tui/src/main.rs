use std::{fs::File, sync::Arc, sync::Mutex};

use anyhow::Context;
use clap::Parser;
use comms::transport::client::ChatClient;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use state_store::StateStore;
use termination::{create_termination, Interrupted, Terminator};
use ui_management::UiManager;

mod config;
mod state_store;
mod termination;
mod ui_management;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    init_logging(&config)?;

    let client = ChatClient::new(&config.base_url)
        .with_context(|| format!("invalid chat service url {}", config.base_url))?;
    info!(base_url = %client.base_url(), poll_interval = ?config.poll_interval(), "starting");

    let (terminator, mut interrupt_rx) = create_termination();
    let (state_store, state_rx) = StateStore::new(
        Arc::new(client),
        config.base_url.clone(),
        config.poll_interval(),
    );
    let (ui_manager, action_rx) = UiManager::new();

    tokio::try_join!(
        state_store.main_loop(terminator, action_rx, interrupt_rx.resubscribe()),
        ui_manager.main_loop(state_rx, interrupt_rx.resubscribe()),
    )?;

    if let Ok(reason) = interrupt_rx.recv().await {
        match reason {
            Interrupted::UserInt => println!("exited per user request"),
            Interrupted::OsSigInt => println!("exited because of an os sig int"),
        }
    } else {
        println!("exited because of an unexpected error");
    }

    Ok(())
}

// the terminal belongs to the ui, so the logs go to a file
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let log_file = File::create(&config.log_file)
        .with_context(|| format!("could not create the log file {}", config.log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_tui=info,comms=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}
