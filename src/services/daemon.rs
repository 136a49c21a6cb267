// src/services/daemon.rs
use log::{error, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::Result;
use crate::models::DaemonStatus;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<GetInfo>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GetInfo {
    height: u64,
    top_block_hash: String,
    difficulty: u64,
    target: u64,
    version: Value,
    database_size: u64,
}

/// HTTP client for the local daemon. The daemon may sit behind a self-signed
/// certificate, so certificate validation is off for this client only.
pub fn daemon_client() -> reqwest::Result<Client> {
    Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(Duration::from_secs(30))
        .build()
}

/// `get_info` over the daemon's JSON-RPC endpoint.
pub async fn fetch_daemon_info(client: &Client, daemon: &str) -> Option<DaemonStatus> {
    match request_get_info(client, daemon).await {
        Ok(status) => Some(status),
        Err(e) => {
            error!("Error fetching daemon info: {}", e);
            None
        }
    }
}

async fn request_get_info(client: &Client, daemon: &str) -> Result<DaemonStatus> {
    let url = format!("{}/json_rpc", daemon.trim_end_matches('/'));
    info!("Calling get_info on daemon at {}", url);

    // Build the JSON-RPC envelope
    let request = json!({
        "jsonrpc": "2.0",
        "id": "0",
        "method": "get_info",
    });

    // Call & decode
    let response: RpcResponse = client
        .post(&url)
        .json(&request)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    // RPC-level errors arrive with a 200 status
    if let Some(err) = response.error {
        return Err(format!("daemon returned error {}: {}", err.code, err.message).into());
    }
    let info = response.result.ok_or("daemon response has no result")?;

    // Older daemons report the version as a number
    let version = match info.version {
        Value::String(s) => s,
        Value::Null => return Err("daemon response has no version".into()),
        other => other.to_string(),
    };

    Ok(DaemonStatus {
        height: info.height,
        top_block_hash: info.top_block_hash,
        version,
        database_size: info.database_size,
        difficulty: info.difficulty,
        target: info.target,
    })
}
