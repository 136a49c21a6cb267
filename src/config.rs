// src/config.rs
use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use std::env;
use std::fs;
use std::path::Path;

const DEFAULT_CACHE_SECONDS: i64 = 60;

/// Base URLs of every remote service the bot talks to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub explorer: String,
    pub tradeogre: String,
    pub coingecko: String,
    pub pool_stats: String,
    pub pool_stats_data: String,
    pub daemon: String,
    pub openai: String,
    pub telegram: String,
    pub discord_api: String,
    pub discord_gateway: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            explorer: "https://explorer.arqma.com".to_string(),
            tradeogre: "https://tradeogre.com".to_string(),
            coingecko: "https://api.coingecko.com".to_string(),
            pool_stats: "https://miningpoolstats.stream".to_string(),
            pool_stats_data: "https://data.miningpoolstats.stream".to_string(),
            daemon: "http://127.0.0.1:19994".to_string(),
            openai: "https://api.openai.com".to_string(),
            telegram: "https://api.telegram.org".to_string(),
            discord_api: "https://discord.com/api/v10".to_string(),
            discord_gateway: "wss://gateway.discord.gg/?v=10&encoding=json".to_string(),
        }
    }
}

impl Endpoints {
    /// Every data endpoint rooted at one base URL, as used against a mock server.
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Endpoints {
            explorer: base.clone(),
            tradeogre: base.clone(),
            coingecko: base.clone(),
            pool_stats: base.clone(),
            pool_stats_data: base.clone(),
            daemon: base.clone(),
            openai: base.clone(),
            telegram: base.clone(),
            discord_api: base,
            ..Endpoints::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub telegram_token: String,
    pub discord_token: String,
    pub openai_api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    pub network_cache_window: chrono::Duration,
}

impl Config {
    /// Build the configuration from the process environment and the token files
    /// in the working directory. Fails if any credential is missing.
    pub fn load() -> Result<Self> {
        let credentials = Credentials {
            telegram_token: read_secret("TELEGRAM_TOKEN", "telegram_token.info")?,
            discord_token: read_secret("DISCORD_TOKEN", "discord_token.info")?,
            openai_api_key: read_secret("OPENAI_API_KEY", "openai_api_key.info")?,
        };

        let mut endpoints = Endpoints::default();
        if let Ok(url) = env::var("ARQMA_DAEMON_URL") {
            info!("Using daemon RPC at {}", url);
            endpoints.daemon = url;
        }

        let cache_seconds = match env::var("NETWORK_CACHE_SECONDS") {
            Ok(raw) => raw
                .parse::<i64>()
                .context("NETWORK_CACHE_SECONDS must be a number")?,
            Err(_) => DEFAULT_CACHE_SECONDS,
        };

        Ok(Config {
            credentials,
            endpoints,
            network_cache_window: chrono::Duration::seconds(cache_seconds),
        })
    }
}

/// Environment variable first, then the token file. Empty values count as missing.
fn read_secret(var: &str, file: &str) -> Result<String> {
    if let Ok(value) = env::var(var) {
        let value = value.trim().to_string();
        if !value.is_empty() {
            return Ok(value);
        }
        warn!("{} is set but empty, trying {}", var, file);
    }
    read_secret_file(Path::new(file)).with_context(|| format!("missing credential: set {} or provide {}", var, file))
}

fn read_secret_file(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let secret = contents.trim();
    if secret.is_empty() {
        return Err(anyhow!("{} is empty", path.display()));
    }
    Ok(secret.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn secret_file_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  123:abc  ").unwrap();
        assert_eq!(read_secret_file(file.path()).unwrap(), "123:abc");
    }

    #[test]
    fn empty_secret_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(read_secret_file(file.path()).is_err());
    }

    #[test]
    fn missing_secret_names_both_sources() {
        let err = read_secret("ARQMA_TEST_UNSET_TOKEN", "/nonexistent/token.info").unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("ARQMA_TEST_UNSET_TOKEN"));
        assert!(msg.contains("/nonexistent/token.info"));
    }

    #[test]
    fn single_host_keeps_gateway_default() {
        let endpoints = Endpoints::single_host("http://127.0.0.1:5000/");
        assert_eq!(endpoints.explorer, "http://127.0.0.1:5000");
        assert_eq!(endpoints.discord_gateway, Endpoints::default().discord_gateway);
    }
}
