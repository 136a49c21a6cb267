// src/services/tradeogre.rs
use log::{error, info};
use reqwest::Client;
use serde_json::Value;

use super::Result;
use crate::models::PriceQuote;

/// ARQ/BTC spot price and 24h volume from the exchange ticker.
pub async fn fetch_arq_price(client: &Client, tradeogre: &str) -> Option<PriceQuote> {
    match request_ticker(client, tradeogre).await {
        Ok(quote) => Some(quote),
        Err(e) => {
            error!("Error fetching ARQ price: {}", e);
            None
        }
    }
}

async fn request_ticker(client: &Client, tradeogre: &str) -> Result<PriceQuote> {
    let url = format!("{}/api/v1/ticker/arq-btc", tradeogre);
    info!("Fetching ARQ ticker from URL: {}", url);

    let ticker: Value = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if ticker.get("success") == Some(&Value::Bool(false)) {
        return Err(format!("ticker rejected the market: {}", ticker).into());
    }

    let price_btc = decimal(&ticker, "price")?;
    // Volume is optional; a malformed value is treated as absent.
    let volume_btc = decimal(&ticker, "volume").ok();
    info!("Found ARQ price: {:.8} BTC, volume: {:?}", price_btc, volume_btc);

    Ok(PriceQuote::from_btc(price_btc, volume_btc))
}

/// The ticker quotes decimals as strings; plain numbers are accepted too.
fn decimal(ticker: &Value, field: &str) -> Result<f64> {
    let value = ticker
        .get(field)
        .ok_or_else(|| format!("Missing '{}' field in ticker", field))?;
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>()?,
        Value::Number(n) => n.as_f64().ok_or("Ticker number out of range")?,
        other => return Err(format!("Unexpected '{}' value: {}", field, other).into()),
    };
    if !parsed.is_finite() {
        return Err(format!("Non-finite '{}' value", field).into());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    #[tokio::test]
    async fn parses_string_decimals() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/ticker/arq-btc");
                then.status(200).json_body(json!({
                    "success": true,
                    "initialprice": "0.00000030",
                    "price": "0.00000031",
                    "high": "0.00000033",
                    "low": "0.00000029",
                    "volume": "0.04650000",
                    "bid": "0.00000030",
                    "ask": "0.00000031"
                }));
            })
            .await;

        let quote = fetch_arq_price(&Client::new(), &server.base_url()).await.unwrap();
        assert_eq!(quote.price_sat, 31);
        assert_eq!(format!("{:.8}", quote.price_btc), "0.00000031");
        assert_eq!(quote.volume_btc, Some(0.0465));
    }

    #[tokio::test]
    async fn missing_volume_is_not_fatal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/ticker/arq-btc");
                then.status(200).json_body(json!({ "price": 0.0000005 }));
            })
            .await;

        let quote = fetch_arq_price(&Client::new(), &server.base_url()).await.unwrap();
        assert_eq!(quote.price_sat, 50);
        assert_eq!(quote.volume_btc, None);
    }

    #[tokio::test]
    async fn unknown_market_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/ticker/arq-btc");
                then.status(200).json_body(json!({ "success": false, "error": "Invalid market" }));
            })
            .await;

        assert!(fetch_arq_price(&Client::new(), &server.base_url()).await.is_none());
    }

    #[test]
    fn garbage_price_is_rejected() {
        let ticker = json!({ "price": "n/a" });
        assert!(decimal(&ticker, "price").is_err());
        assert!(decimal(&ticker, "volume").is_err());
    }
}
