use crate::errors::ConfigError;
use crate::exchanges::Exchange;
use crate::models::{AggregationResult, SourceFailure};
use futures_util::future::join_all;

/// Fans one symbol set out to every selected exchange and merges whatever
/// comes back. A venue failure becomes a value in the result, never an
/// abort: the defining property of a pass is that one broken upstream
/// cannot block or corrupt the others.
pub struct Aggregator {
    exchanges: Vec<Box<dyn Exchange>>,
}

impl Aggregator {
    pub fn new(exchanges: Vec<Box<dyn Exchange>>) -> Result<Self, ConfigError> {
        if exchanges.is_empty() {
            return Err(ConfigError::EmptySelection);
        }
        Ok(Self { exchanges })
    }

    /// One aggregation pass. Exchanges are queried concurrently; each call
    /// is independent I/O bounded by its own client timeout, so a hung venue
    /// delays nobody else. The merge is sorted afterwards, which makes the
    /// output order independent of completion order.
    pub async fn run(&self, symbols: &[String]) -> AggregationResult {
        let fetches = self.exchanges.iter().map(|exchange| async move {
            let outcome = exchange.fetch_funding_rates(symbols).await;
            (exchange.name(), outcome)
        });

        let mut records = Vec::new();
        let mut failures = Vec::new();

        for (name, outcome) in join_all(fetches).await {
            match outcome {
                Ok(batch) => {
                    tracing::debug!("[{name}] {} records", batch.len());
                    records.extend(batch);
                }
                Err(e) => {
                    tracing::warn!("[{name}] fetch failed: {e}");
                    failures.push(SourceFailure {
                        exchange: name,
                        message: e.to_string(),
                    });
                }
            }
        }

        metrics::counter!("fundarb_records_total").increment(records.len() as u64);
        metrics::counter!("fundarb_source_failures_total").increment(failures.len() as u64);

        records.sort_by(|a, b| {
            (a.exchange, &a.symbol, &a.instrument).cmp(&(b.exchange, &b.symbol, &b.instrument))
        });
        failures.sort_by(|a, b| a.exchange.cmp(b.exchange));

        AggregationResult { records, failures }
    }
}
