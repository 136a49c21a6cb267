// src/handlers/pools.rs
use log::{info, warn};

use super::Reply;
use crate::format::{self, Dialect};
use crate::services::report::DataSources;

pub const POOLS_FAILURE: &str = "Failed to fetch pool data.";

pub async fn handle(sources: &DataSources, dialect: Dialect) -> Reply {
    info!("Handling pools request ({:?})", dialect);
    match sources.pools().await {
        Some(pools) if !pools.is_empty() => Reply::Text(format::pools(dialect, &pools)),
        Some(_) => {
            warn!("No pools listed, replying with failure");
            Reply::Plain(POOLS_FAILURE.to_string())
        }
        None => Reply::Plain(POOLS_FAILURE.to_string()),
    }
}
