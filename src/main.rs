use anyhow::{Context, Result};
use dotenv::dotenv;
use log::{error, info};
use reqwest::Client;
use std::sync::Arc;

use arqma_community_bot::config::Config;
use arqma_community_bot::platforms::discord::DiscordBot;
use arqma_community_bot::platforms::telegram::TelegramBot;
use arqma_community_bot::routes::Router;
use arqma_community_bot::services::cache::NetworkCache;
use arqma_community_bot::services::report::DataSources;

#[tokio::main]
async fn main() {
    dotenv().ok();
    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the bot...");

    if let Err(e) = run().await {
        error!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::load()?;
    info!(
        "Configuration loaded, network info cached for {}s",
        config.network_cache_window.num_seconds()
    );

    let cache = Arc::new(NetworkCache::new(config.network_cache_window));
    let sources = DataSources::new(config.endpoints.clone(), cache).context("cannot build HTTP clients")?;
    let router = Arc::new(Router::new(sources, config.credentials.openai_api_key.clone()));

    let platform_client = Client::new();
    let telegram = Arc::new(TelegramBot::new(
        platform_client.clone(),
        &config.endpoints.telegram,
        &config.credentials.telegram_token,
        Arc::clone(&router),
    ));
    let discord = Arc::new(DiscordBot::new(
        platform_client,
        &config.endpoints.discord_api,
        &config.endpoints.discord_gateway,
        &config.credentials.discord_token,
        router,
    ));

    info!("Starting Telegram and Discord listeners");
    tokio::select! {
        result = telegram.run() => result.context("Telegram listener stopped"),
        result = discord.run() => result.context("Discord listener stopped"),
    }
}
