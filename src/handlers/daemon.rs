// src/handlers/daemon.rs
use log::info;

use super::Reply;
use crate::format::{self, Dialect};
use crate::services::report::DataSources;

pub const DAEMON_FAILURE: &str = "Failed to fetch daemon information.";

pub async fn handle(sources: &DataSources, dialect: Dialect) -> Reply {
    info!("Handling daemon info request ({:?})", dialect);
    match sources.daemon().await {
        Some(status) => Reply::Text(format::daemon_info(dialect, &status)),
        None => Reply::Plain(DAEMON_FAILURE.to_string()),
    }
}
