mod chat;
mod common;
mod config;
mod network;
mod storage;
mod ui;

use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::mpsc;

use chat::Reconciler;
use common::NetworkCommand;
use network::SocketClient;
use storage::ChatStore;
use ui::ChatApp;
use ui::state::AppState;

#[derive(Parser)]
#[command(
    name = "rust_private_chat",
    version,
    about = "Private messaging client over a websocket relay"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Relay websocket URL; overrides the config file and is remembered
    #[arg(long, value_name = "URL")]
    server: Option<String>,
    /// Display name; overrides the stored one
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);
    let server_url = match cli.server {
        Some(url) => {
            config::persist_server_url(&cli.config, &url);
            url
        }
        None => app_config.server_url.clone(),
    };

    if let Err(err) = storage::ensure_data_dir() {
        log::warn!("Could not create data directory: {err}");
    }
    let store = ChatStore::new()
        .or_else(|err| {
            log::warn!("Could not open data/client.db ({err}); falling back to in-memory storage");
            ChatStore::in_memory()
        })
        .expect("in-memory sqlite should always open");

    // Identity resolution: CLI flag beats the stored name beats the config
    // preset. With none of the three the login screen asks for one.
    let stored_name = store.user_name().unwrap_or_else(|err| {
        log::warn!("Could not read stored user name: {err}");
        None
    });
    let user_name = cli.name.clone().or(stored_name).or(app_config.user_name);
    if let Ok(Some(session)) = store.session_id() {
        log::info!("Last transport session id: {session}");
    }
    if let Some(name) = &cli.name {
        if let Err(err) = store.save_user_name(name) {
            log::warn!("Could not persist user name: {err}");
        }
    }

    // UI -> network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    tokio::spawn(async move {
        let client = SocketClient::new(event_tx, cmd_rx, server_url);
        if let Err(err) = client.run().await {
            log::error!("Network client terminated: {err}");
        }
    });

    // With a known identity, register right away; otherwise the login
    // screen issues the registration after the name is chosen.
    if let Some(name) = &user_name {
        if let Err(err) = cmd_tx
            .send(NetworkCommand::Register { name: name.clone() })
            .await
        {
            log::warn!("Network task unavailable: {err}");
        }
    }

    let chat = Reconciler::restore(user_name.clone().unwrap_or_default(), store);
    let state = AppState::new(chat, user_name.is_some());

    let options = eframe::NativeOptions::default();
    let mut event_rx = Some(event_rx);
    let mut state = Some(state);

    eframe::run_native(
        "Private Chat",
        options,
        Box::new(move |cc| {
            let event_receiver = event_rx
                .take()
                .expect("ChatApp should only be initialized once");
            let state = state
                .take()
                .expect("ChatApp should only be initialized once");

            Ok(Box::new(ChatApp::new(
                cc,
                state,
                cmd_tx.clone(),
                event_receiver,
            )))
        }),
    )
}
