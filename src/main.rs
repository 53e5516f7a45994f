use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use telesonarr::bot::Bot;
use telesonarr::config::Config;
use telesonarr::sonarr::SonarrClient;
use telesonarr::telegram::{self, TelegramMessenger};

#[derive(Parser)]
#[command(name = "telesonarr", about = "Telegram bot for managing a Sonarr library", version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose {
        "telesonarr=debug,info"
    } else {
        "telesonarr=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load()?;
    tracing::info!(
        sonarr = %config.sonarr_url(),
        allowed_chats = config.allowed_chat_ids.len(),
        "starting telesonarr"
    );

    let api = teloxide::Bot::new(config.telegram_bot_token.clone());
    let sonarr = Arc::new(SonarrClient::new(
        &config.sonarr_url(),
        &config.sonarr_api_key,
    ));
    let messenger = Arc::new(TelegramMessenger::new(api.clone()));
    let bot = Arc::new(Bot::new(config, sonarr, messenger));

    telegram::run(bot, api).await;
    Ok(())
}
