use crate::config::Config;
use crate::errors::{ConfigError, ExchangeError};
use crate::models::{FundingPeriod, FundingRate};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

pub mod apex;
pub mod aster;
pub mod binance;
pub mod bybit;
pub mod edgex;
pub mod hyperliquid;
pub mod lighter;
pub mod pacifica;
pub mod paradex;
pub mod reya;

/// Canonical symbols every venue in the registry is known to list. Venues
/// that must issue one call per symbol restrict themselves to this universe
/// instead of probing upstream for arbitrary names.
pub const COMMON_SYMBOLS: [&str; 10] = [
    "BTC", "ETH", "SOL", "DOGE", "ADA", "MATIC", "DOT", "AVAX", "LINK", "UNI",
];

/// Static description of one upstream venue. Built once at startup,
/// never mutated.
#[derive(Debug, Clone, Copy)]
pub struct SourceDescriptor {
    /// Registry key, also the `exchange` field on every record.
    pub name: &'static str,
    pub base_url: &'static str,
    pub default_period: FundingPeriod,
    pub supported_symbols: &'static [&'static str],
}

#[async_trait]
pub trait Exchange: Send + Sync + std::fmt::Debug {
    fn descriptor(&self) -> &SourceDescriptor;

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Fetch the current funding rate for each requested canonical symbol.
    ///
    /// Every returned record carries the rate as a fraction of notional per
    /// one funding period, exactly as the venue settles it; venues that
    /// report percentages must divide by 100 here, not downstream. Symbols
    /// the venue does not list are omitted; a zero rate is valid data and is
    /// passed through. Per-symbol upstream hiccups are logged and skipped;
    /// `Err` means the venue as a whole produced nothing usable.
    async fn fetch_funding_rates(
        &self,
        symbols: &[String],
    ) -> Result<Vec<FundingRate>, ExchangeError>;
}

/// Registry order is also the display and default query order.
pub const EXCHANGE_NAMES: [&str; 10] = [
    "binance",
    "bybit",
    "lighter",
    "aster",
    "hyperliquid",
    "edgex",
    "apex",
    "paradex",
    "pacifica",
    "reya",
];

/// Builds every known exchange client.
pub fn all(config: &Config) -> Vec<Box<dyn Exchange>> {
    let pacer = Arc::new(Pacer::new(config.min_call_interval));

    vec![
        Box::new(binance::Binance::new(config)),
        Box::new(bybit::Bybit::new(config)),
        Box::new(lighter::Lighter::new(config)),
        Box::new(aster::Aster::new(config, Arc::clone(&pacer))),
        Box::new(hyperliquid::Hyperliquid::new(config, Arc::clone(&pacer))),
        Box::new(edgex::EdgeX::new(config, Arc::clone(&pacer))),
        Box::new(apex::Apex::new(config, Arc::clone(&pacer))),
        Box::new(paradex::Paradex::new(config, Arc::clone(&pacer))),
        Box::new(pacifica::Pacifica::new(config, Arc::clone(&pacer))),
        Box::new(reya::Reya::new(config, pacer)),
    ]
}

/// Builds the clients for a named subset, preserving registry order.
/// Unknown names and an empty selection are fatal.
pub fn select(names: &[String], config: &Config) -> Result<Vec<Box<dyn Exchange>>, ConfigError> {
    let wanted: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();

    for name in &wanted {
        if !EXCHANGE_NAMES.contains(&name.as_str()) {
            return Err(ConfigError::UnknownExchange(name.clone()));
        }
    }

    let selected: Vec<Box<dyn Exchange>> = all(config)
        .into_iter()
        .filter(|ex| wanted.iter().any(|w| w == ex.name()))
        .collect();

    if selected.is_empty() {
        return Err(ConfigError::EmptySelection);
    }
    Ok(selected)
}

/// Minimum-interval gate between successive calls to the same venue.
/// Replaces blanket sleeps between requests: a client asks for a slot and is
/// delayed only as long as its own venue requires.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_call: DashMap<&'static str, Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: DashMap::new(),
        }
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// call to `exchange`, then claims the slot.
    pub async fn wait(&self, exchange: &'static str) {
        loop {
            let now = Instant::now();
            // The entry guard must not live across the await below.
            let wake_at = match self.last_call.entry(exchange) {
                Entry::Vacant(slot) => {
                    slot.insert(now);
                    None
                }
                Entry::Occupied(mut slot) => {
                    let due = *slot.get() + self.min_interval;
                    if due <= now {
                        slot.insert(now);
                        None
                    } else {
                        Some(due)
                    }
                }
            };

            match wake_at {
                None => return,
                Some(due) => sleep_until(due).await,
            }
        }
    }
}

pub(crate) fn http_client(config: &Config) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.fetch_timeout)
        .user_agent(concat!("fundarb/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("default reqwest client must build")
}

/// Millisecond unix timestamps, as most venues report them.
pub(crate) fn timestamp_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// RFC 3339 strings, e.g. Pacifica's `created_at`.
pub(crate) fn timestamp_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_names_are_unique_and_match_clients() {
        let unique: HashSet<_> = EXCHANGE_NAMES.iter().collect();
        assert_eq!(unique.len(), EXCHANGE_NAMES.len());

        let config = Config::default();
        let clients = all(&config);
        assert_eq!(clients.len(), EXCHANGE_NAMES.len());
        for (client, name) in clients.iter().zip(EXCHANGE_NAMES) {
            assert_eq!(client.name(), name);
        }
    }

    #[test]
    fn select_rejects_unknown_and_empty() {
        let config = Config::default();

        let err = select(&["binance".into(), "nasdaq".into()], &config).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownExchange(name) if name == "nasdaq"));

        let err = select(&[], &config).unwrap_err();
        assert!(matches!(err, ConfigError::EmptySelection));
    }

    #[test]
    fn select_is_case_insensitive_and_keeps_registry_order() {
        let config = Config::default();
        let picked = select(&["Bybit".into(), "BINANCE".into()], &config).unwrap();
        let names: Vec<_> = picked.iter().map(|ex| ex.name()).collect();
        assert_eq!(names, ["binance", "bybit"]);
    }

    #[tokio::test]
    async fn pacer_spaces_out_calls_to_one_venue() {
        let pacer = Pacer::new(Duration::from_millis(30));

        let started = Instant::now();
        pacer.wait("binance").await;
        pacer.wait("binance").await;
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn pacer_does_not_couple_distinct_venues() {
        let pacer = Pacer::new(Duration::from_millis(200));

        let started = Instant::now();
        pacer.wait("binance").await;
        pacer.wait("bybit").await;
        assert!(started.elapsed() < Duration::from_millis(150));
    }

    #[test]
    fn timestamp_helpers_tolerate_garbage() {
        assert!(timestamp_millis(1_700_000_000_000).is_some());
        assert!(timestamp_rfc3339("2024-01-15T08:00:00Z").is_some());
        assert!(timestamp_rfc3339("yesterday-ish").is_none());
    }
}
