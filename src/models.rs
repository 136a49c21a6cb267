// src/models.rs

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSnapshot {
    pub height: u64,
    /// MH/s
    pub hashrate: f64,
    pub difficulty: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmissionSnapshot {
    /// Atomic units as reported by the explorer.
    pub total_coinbase: f64,
}

impl EmissionSnapshot {
    /// Whole-coin figure shown to users: coinbase / 100 000, floored, first 8 digits.
    pub fn display_amount(&self) -> String {
        let scaled = (self.total_coinbase / 100_000.0).floor();
        let mut digits = format!("{:.0}", scaled);
        digits.truncate(8);
        digits
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub price_btc: f64,
    pub price_sat: u64,
    /// 24h volume in BTC, when the ticker reports it.
    pub volume_btc: Option<f64>,
}

impl PriceQuote {
    pub fn from_btc(price_btc: f64, volume_btc: Option<f64>) -> Self {
        PriceQuote {
            price_btc,
            price_sat: (price_btc * 100_000_000.0).round() as u64,
            volume_btc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FiatRate {
    pub usd_per_btc: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DaemonStatus {
    pub height: u64,
    pub top_block_hash: String,
    pub version: String,
    pub database_size: u64,
    pub difficulty: u64,
    pub target: u64,
}

impl DaemonStatus {
    /// difficulty / target, in MH/s. Zero when the daemon reports no target.
    pub fn hashrate_mhs(&self) -> f64 {
        if self.target == 0 {
            return 0.0;
        }
        self.difficulty as f64 / self.target as f64 / 1_000_000.0
    }

    pub fn database_size_gb(&self) -> f64 {
        self.database_size as f64 / 1024f64.powi(3)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    pub name: String,
    /// H/s
    pub hashrate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSummary {
    pub native: f64,
    pub usd: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkReport {
    pub network: NetworkSnapshot,
    pub emission: EmissionSnapshot,
    pub price: PriceQuote,
    pub fiat: FiatRate,
    pub volume: Option<VolumeSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_in_satoshi_is_rounded() {
        let quote = PriceQuote::from_btc(0.000000125, None);
        assert_eq!(quote.price_sat, 13);
        let quote = PriceQuote::from_btc(0.00000049, Some(0.5));
        assert_eq!(quote.price_sat, 49);
    }

    #[test]
    fn daemon_derived_fields() {
        let status = DaemonStatus {
            height: 100,
            top_block_hash: "abc".to_string(),
            version: "1.2".to_string(),
            database_size: 2_147_483_648,
            difficulty: 1200,
            target: 120,
        };
        assert_eq!(format!("{:.2}", status.database_size_gb()), "2.00");
        assert!((status.hashrate_mhs() - 0.00001).abs() < 1e-12);

        let zero_target = DaemonStatus { target: 0, ..status };
        assert_eq!(zero_target.hashrate_mhs(), 0.0);
    }

    #[test]
    fn emission_is_scaled_and_truncated() {
        let emission = EmissionSnapshot { total_coinbase: 1_234_567_890_123_456.0 };
        assert_eq!(emission.display_amount(), "12345678");
        let small = EmissionSnapshot { total_coinbase: 250_000.0 };
        assert_eq!(small.display_amount(), "2");
    }
}
