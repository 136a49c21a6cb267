// src/services/pools.rs
use log::{error, info, warn};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::cmp::Ordering;

use super::Result;
use crate::models::PoolEntry;

#[derive(Debug, Deserialize)]
struct PoolData {
    #[serde(default)]
    data: Vec<RawPool>,
}

#[derive(Debug, Deserialize)]
struct RawPool {
    pool_id: Option<String>,
    hashrate: Option<f64>,
}

/// Mining pools sorted by descending hashrate (H/s).
///
/// The stats site only serves its pool list with a `t` token that is embedded in
/// the HTML page, so this is two requests: scrape the token, then fetch the data.
pub async fn fetch_pools(client: &Client, pool_stats: &str, pool_stats_data: &str) -> Option<Vec<PoolEntry>> {
    match request_pools(client, pool_stats, pool_stats_data).await {
        Ok(pools) => Some(pools),
        Err(e) => {
            error!("Error fetching pool data: {}", e);
            None
        }
    }
}

async fn request_pools(client: &Client, pool_stats: &str, pool_stats_data: &str) -> Result<Vec<PoolEntry>> {
    let page_url = format!("{}/arqma", pool_stats);
    info!("Fetching pool stats page from URL: {}", page_url);

    // Download the HTML page
    let page = client
        .get(&page_url)
        .header("User-Agent", "Mozilla/5.0")
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    // Locate the cache-buster token
    let token = extract_last_time(&page)?.ok_or("Failed to extract 't' parameter")?;

    let data_url = format!("{}/data/arqma.js", pool_stats_data);
    info!("Fetching pool data from URL: {} (t={})", data_url, token);

    // Fetch the pool list with the token
    let body: PoolData = client
        .get(&data_url)
        .query(&[("t", token.as_str())])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if body.data.is_empty() {
        warn!("Pool data response contained no pools");
    }

    // Fill in missing names and hashrates, then sort
    Ok(sort_pools(
        body.data
            .into_iter()
            .map(|raw| PoolEntry {
                name: raw.pool_id.unwrap_or_else(|| "Unknown Pool".to_string()),
                hashrate: raw.hashrate.unwrap_or(0.0),
            })
            .collect(),
    ))
}

/// Finds `var last_time = "..."` inside the page's inline scripts.
fn extract_last_time(page: &str) -> Result<Option<String>> {
    let re = Regex::new(r#"var last_time = "([^"]+)""#)?;
    let document = Html::parse_document(page);
    let scripts = Selector::parse("script").map_err(|e| format!("Invalid selector: {:?}", e))?;

    let token = document
        .select(&scripts)
        .map(|script| script.text().collect::<String>())
        .find_map(|source| re.captures(&source).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string()));

    Ok(token)
}

pub fn sort_pools(mut pools: Vec<PoolEntry>) -> Vec<PoolEntry> {
    pools.sort_by(|a, b| b.hashrate.partial_cmp(&a.hashrate).unwrap_or(Ordering::Equal));
    pools
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    const PAGE: &str = r#"<html><head>
        <script src="/js/app.js"></script>
        <script>
            var coin = "arqma";
            var last_time = "1729340000";
        </script>
        </head><body><table id="pools"></table></body></html>"#;

    #[test]
    fn token_comes_from_inline_script() {
        assert_eq!(extract_last_time(PAGE).unwrap().as_deref(), Some("1729340000"));
        assert_eq!(extract_last_time("<html><body>var last_time</body></html>").unwrap(), None);
    }

    #[test]
    fn sorts_descending() {
        let pools = sort_pools(vec![
            PoolEntry { name: "B".into(), hashrate: 500.0 },
            PoolEntry { name: "A".into(), hashrate: 2_500_000.0 },
            PoolEntry { name: "C".into(), hashrate: 40_000.0 },
        ]);
        let names: Vec<&str> = pools.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "C", "B"]);
    }

    #[tokio::test]
    async fn uses_scraped_token_as_cache_buster() {
        let server = MockServer::start_async().await;
        let page = server
            .mock_async(|when, then| {
                when.method(GET).path("/arqma");
                then.status(200).body(PAGE);
            })
            .await;
        let data = server
            .mock_async(|when, then| {
                when.method(GET).path("/data/arqma.js").query_param("t", "1729340000");
                then.status(200).json_body(json!({
                    "data": [
                        { "pool_id": "B", "hashrate": 500 },
                        { "hashrate": 900_000 },
                        { "pool_id": "A", "hashrate": 2_500_000 },
                        { "pool_id": "D" }
                    ]
                }));
            })
            .await;

        let base = server.base_url();
        let pools = fetch_pools(&Client::new(), &base, &base).await.unwrap();
        page.assert_async().await;
        data.assert_async().await;

        let names: Vec<&str> = pools.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "Unknown Pool", "B", "D"]);
        assert_eq!(pools[3].hashrate, 0.0);
    }

    #[tokio::test]
    async fn missing_token_skips_second_request() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/arqma");
                then.status(200).body("<html><script>var other = 1;</script></html>");
            })
            .await;
        let data = server
            .mock_async(|when, then| {
                when.method(GET).path("/data/arqma.js");
                then.status(200).json_body(json!({ "data": [] }));
            })
            .await;

        let base = server.base_url();
        assert!(fetch_pools(&Client::new(), &base, &base).await.is_none());
        assert_eq!(data.hits_async().await, 0);
    }
}
