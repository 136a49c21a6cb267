// src/services/report.rs
use log::{info, warn};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::cache::NetworkCache;
use super::{daemon, explorer, fiat, pools, tradeogre};
use crate::config::Endpoints;
use crate::models::{
    DaemonStatus, EmissionSnapshot, FiatRate, NetworkReport, NetworkSnapshot, PoolEntry, PriceQuote,
    VolumeSummary,
};

pub const NETWORK_DATA_FAILURE: &str = "Failed to fetch network data.";

// Long enough for image generation, which shares this client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything the command handlers fetch from, built once at startup.
pub struct DataSources {
    pub client: Client,
    pub daemon_client: Client,
    pub endpoints: Endpoints,
    pub cache: Arc<NetworkCache>,
}

impl DataSources {
    pub fn new(endpoints: Endpoints, cache: Arc<NetworkCache>) -> reqwest::Result<Self> {
        Ok(DataSources {
            client: Client::builder()
                .user_agent("arqma-community-bot")
                .timeout(REQUEST_TIMEOUT)
                .build()?,
            daemon_client: daemon::daemon_client()?,
            endpoints,
            cache,
        })
    }

    pub async fn network(&self) -> Option<NetworkSnapshot> {
        self.cache
            .get_or_refresh(|| explorer::fetch_network_info(&self.client, &self.endpoints.explorer))
            .await
    }

    pub async fn emission(&self) -> Option<EmissionSnapshot> {
        explorer::fetch_emission(&self.client, &self.endpoints.explorer).await
    }

    pub async fn price(&self) -> Option<PriceQuote> {
        tradeogre::fetch_arq_price(&self.client, &self.endpoints.tradeogre).await
    }

    pub async fn fiat_rate(&self) -> Option<FiatRate> {
        fiat::fetch_btc_usd(&self.client, &self.endpoints.coingecko).await
    }

    pub async fn pools(&self) -> Option<Vec<PoolEntry>> {
        pools::fetch_pools(&self.client, &self.endpoints.pool_stats, &self.endpoints.pool_stats_data).await
    }

    pub async fn daemon(&self) -> Option<DaemonStatus> {
        daemon::fetch_daemon_info(&self.daemon_client, &self.endpoints.daemon).await
    }

    /// All-or-nothing: any unavailable input yields the failure literal.
    pub async fn build_network_report(&self) -> Result<NetworkReport, &'static str> {
        let (network, emission, price, fiat) =
            tokio::join!(self.network(), self.emission(), self.price(), self.fiat_rate());

        match (network, emission, price, fiat) {
            (Some(network), Some(emission), Some(price), Some(fiat)) => {
                info!("Built network report at height {}", network.height);
                Ok(assemble(network, emission, price, fiat))
            }
            _ => {
                warn!("Network report incomplete, replying with failure");
                Err(NETWORK_DATA_FAILURE)
            }
        }
    }
}

pub fn assemble(
    network: NetworkSnapshot,
    emission: EmissionSnapshot,
    price: PriceQuote,
    fiat: FiatRate,
) -> NetworkReport {
    let volume = match price.volume_btc {
        Some(volume_btc) if price.price_btc > 0.0 => Some(VolumeSummary {
            native: volume_btc / price.price_btc,
            usd: volume_btc * fiat.usd_per_btc,
        }),
        _ => None,
    };

    NetworkReport {
        network,
        emission,
        price,
        fiat,
        volume,
    }
}
