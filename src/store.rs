use crate::models::FundingRate;
use dashmap::DashMap;
use std::sync::Arc;

/// Latest-pass snapshot shared between the refresh loop and the API
/// handlers. Records never persist across passes, so each refresh replaces
/// the snapshot wholesale.
#[derive(Clone)]
pub struct RateStore {
    inner: Arc<DashMap<String, FundingRate>>,
}

impl RateStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Key format e.g.: "binance:BTCUSDT"
    fn key(exchange: &str, instrument: &str) -> String {
        format!("{}:{}", exchange, instrument)
    }

    /// Swaps in the records of a fresh pass.
    pub fn replace(&self, records: &[FundingRate]) {
        self.inner.clear();
        for record in records {
            self.inner
                .insert(Self::key(record.exchange, &record.instrument), record.clone());
        }
    }

    /// All stored records, in deterministic (exchange, symbol) order.
    pub fn all(&self) -> Vec<FundingRate> {
        let mut records: Vec<FundingRate> =
            self.inner.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| {
            (a.exchange, &a.symbol, &a.instrument).cmp(&(b.exchange, &b.symbol, &b.instrument))
        });
        records
    }
}

impl Default for RateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FundingPeriod;

    fn record(exchange: &'static str, symbol: &str, rate: f64) -> FundingRate {
        FundingRate {
            exchange,
            symbol: symbol.to_string(),
            instrument: format!("{symbol}USDT"),
            rate,
            period: FundingPeriod::H8,
            observed_at: None,
            next_funding_at: None,
            reference_price: None,
        }
    }

    #[test]
    fn replace_drops_records_from_the_previous_pass() {
        let store = RateStore::new();

        store.replace(&[record("binance", "BTC", 0.0001), record("bybit", "ETH", 0.0002)]);
        assert_eq!(store.all().len(), 2);

        store.replace(&[record("binance", "BTC", 0.0003)]);
        let remaining = store.all();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].rate, 0.0003);
    }

    #[test]
    fn all_is_sorted_regardless_of_insertion_order() {
        let store = RateStore::new();
        store.replace(&[
            record("bybit", "ETH", 0.1),
            record("binance", "ETH", 0.2),
            record("binance", "BTC", 0.3),
        ]);

        let order: Vec<_> = store
            .all()
            .iter()
            .map(|r| (r.exchange, r.symbol.clone()))
            .collect();
        assert_eq!(
            order,
            [
                ("binance", "BTC".to_string()),
                ("binance", "ETH".to_string()),
                ("bybit", "ETH".to_string()),
            ]
        );
    }
}
