// src/services/fiat.rs
use log::{error, info};
use reqwest::Client;
use serde::Deserialize;

use super::Result;
use crate::models::FiatRate;

#[derive(Debug, Deserialize)]
struct SimplePrice {
    bitcoin: UsdQuote,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: f64,
}

/// USD per BTC, used to express exchange volume in fiat.
pub async fn fetch_btc_usd(client: &Client, coingecko: &str) -> Option<FiatRate> {
    match request_btc_usd(client, coingecko).await {
        Ok(rate) => Some(rate),
        Err(e) => {
            error!("Error fetching BTC/USD rate: {}", e);
            None
        }
    }
}

async fn request_btc_usd(client: &Client, coingecko: &str) -> Result<FiatRate> {
    let url = format!("{}/api/v3/simple/price", coingecko);
    info!("Fetching BTC/USD rate from URL: {}", url);

    let body: SimplePrice = client
        .get(&url)
        .query(&[("ids", "bitcoin"), ("vs_currencies", "usd")])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if body.bitcoin.usd <= 0.0 {
        return Err("BTC/USD rate must be positive".into());
    }
    Ok(FiatRate {
        usd_per_btc: body.bitcoin.usd,
    })
}
