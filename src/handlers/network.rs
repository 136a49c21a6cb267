// src/handlers/network.rs
use log::{error, info};

use super::Reply;
use crate::format::{self, Dialect};
use crate::services::report::DataSources;

pub async fn handle(sources: &DataSources, dialect: Dialect) -> Reply {
    info!("Handling network stats request ({:?})", dialect);
    match sources.build_network_report().await {
        Ok(report) => Reply::Text(format::network_report(dialect, &report)),
        Err(message) => {
            error!("Network stats unavailable");
            Reply::Plain(message.to_string())
        }
    }
}
