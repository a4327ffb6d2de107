use super::{Exchange, SourceDescriptor, http_client, timestamp_millis};
use crate::config::Config;
use crate::errors::ExchangeError;
use crate::models::{FundingPeriod, FundingRate};
use crate::normalize::canonical_symbol;
use async_trait::async_trait;
use serde::Deserialize;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor {
    name: "binance",
    base_url: "https://fapi.binance.com",
    default_period: FundingPeriod::H8,
    supported_symbols: &super::COMMON_SYMBOLS,
};

/// The raw JSON shape Binance sends back for one instrument
#[derive(Debug, Deserialize)]
struct PremiumIndex {
    symbol: String,

    #[serde(rename = "lastFundingRate")]
    last_funding_rate: String,

    #[serde(rename = "nextFundingTime")]
    next_funding_time: i64,

    #[serde(rename = "markPrice")]
    mark_price: String,
}

#[derive(Debug)]
pub struct Binance {
    client: reqwest::Client,
}

impl Binance {
    pub fn new(config: &Config) -> Self {
        Self {
            client: http_client(config),
        }
    }
}

#[async_trait]
impl Exchange for Binance {
    fn descriptor(&self) -> &SourceDescriptor {
        &DESCRIPTOR
    }

    /// One batched call: premiumIndex without a symbol parameter returns the
    /// whole perpetual universe, filtered down to the requested set here.
    async fn fetch_funding_rates(
        &self,
        symbols: &[String],
    ) -> Result<Vec<FundingRate>, ExchangeError> {
        let url = format!("{}/fapi/v1/premiumIndex", DESCRIPTOR.base_url);

        let entries = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ExchangeError::Http)?
            .error_for_status()
            .map_err(ExchangeError::Http)?
            .json::<Vec<PremiumIndex>>()
            .await
            .map_err(ExchangeError::Http)?;

        let mut rates = Vec::new();
        for entry in entries {
            let symbol = canonical_symbol(&entry.symbol);
            if !symbols.contains(&symbol) {
                continue;
            }

            // rate arrives as a decimal string, already fractional per 8h
            let rate = match entry.last_funding_rate.parse::<f64>() {
                Ok(rate) => rate,
                Err(e) => {
                    tracing::warn!("[binance] {}: bad funding rate: {e}", entry.symbol);
                    continue;
                }
            };

            rates.push(FundingRate {
                exchange: DESCRIPTOR.name,
                symbol,
                reference_price: entry.mark_price.parse::<f64>().ok(),
                next_funding_at: timestamp_millis(entry.next_funding_time),
                observed_at: None,
                rate,
                period: DESCRIPTOR.default_period,
                instrument: entry.symbol,
            });
        }

        Ok(rates)
    }
}
