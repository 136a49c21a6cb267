// src/bin/check_fetchers.rs
use arqma_community_bot::config::Endpoints;
use arqma_community_bot::format::{self, Dialect};
use arqma_community_bot::services::cache::NetworkCache;
use arqma_community_bot::services::report::DataSources;
use dotenv::dotenv;
use log::{error, info};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let mut endpoints = Endpoints::default();
    if let Ok(url) = env::var("ARQMA_DAEMON_URL") {
        endpoints.daemon = url;
    }
    let cache = Arc::new(NetworkCache::new(chrono::Duration::seconds(60)));
    let sources = DataSources::new(endpoints, cache)?;

    info!("Testing every data source once...");
    println!("Network info:  {:?}", sources.network().await);
    println!("Emission:      {:?}", sources.emission().await);
    println!("ARQ price:     {:?}", sources.price().await);
    println!("BTC/USD:       {:?}", sources.fiat_rate().await);
    println!("Daemon:        {:?}", sources.daemon().await);

    match sources.pools().await {
        Some(pools) => println!("{}", format::pools(Dialect::Discord, &pools)),
        None => error!("Pool data unavailable"),
    }

    match sources.build_network_report().await {
        Ok(report) => println!("{}", format::network_report(Dialect::Discord, &report)),
        Err(message) => error!("{}", message),
    }

    Ok(())
}
