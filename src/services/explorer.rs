// src/services/explorer.rs
use log::{error, info};
use reqwest::Client;
use serde::Deserialize;

use super::Result;
use crate::models::{EmissionSnapshot, NetworkSnapshot};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct NetworkInfo {
    height: u64,
    hash_rate: f64,
    difficulty: u64,
}

#[derive(Debug, Deserialize)]
struct Emission {
    coinbase: f64,
}

/// Current height, hashrate (MH/s) and difficulty from the block explorer.
pub async fn fetch_network_info(client: &Client, explorer: &str) -> Option<NetworkSnapshot> {
    match request_network_info(client, explorer).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            error!("Error fetching network info: {}", e);
            None
        }
    }
}

async fn request_network_info(client: &Client, explorer: &str) -> Result<NetworkSnapshot> {
    let url = format!("{}/api/networkinfo", explorer);
    info!("Fetching network info from URL: {}", url);

    let body: Envelope<NetworkInfo> = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(NetworkSnapshot {
        height: body.data.height,
        hashrate: body.data.hash_rate / 1_000_000.0,
        difficulty: body.data.difficulty,
    })
}

/// Total coinbase emitted so far, in atomic units.
pub async fn fetch_emission(client: &Client, explorer: &str) -> Option<EmissionSnapshot> {
    match request_emission(client, explorer).await {
        Ok(emission) => Some(emission),
        Err(e) => {
            error!("Error fetching emission data: {}", e);
            None
        }
    }
}

async fn request_emission(client: &Client, explorer: &str) -> Result<EmissionSnapshot> {
    let url = format!("{}/api/emission", explorer);
    info!("Fetching emission data from URL: {}", url);

    let body: Envelope<Emission> = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(EmissionSnapshot {
        total_coinbase: body.data.coinbase,
    })
}
