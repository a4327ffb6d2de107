use super::{Exchange, SourceDescriptor, http_client};
use crate::config::Config;
use crate::errors::ExchangeError;
use crate::models::{FundingPeriod, FundingRate};
use crate::normalize::canonical_symbol;
use async_trait::async_trait;
use serde::Deserialize;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor {
    name: "lighter",
    base_url: "https://mainnet.zklighter.elliot.ai",
    default_period: FundingPeriod::H8,
    supported_symbols: &super::COMMON_SYMBOLS,
};

#[derive(Debug, Deserialize)]
struct FundingRatesResponse {
    funding_rates: Vec<LighterRate>,
}

#[derive(Debug, Deserialize)]
struct LighterRate {
    symbol: String,
    rate: f64,
}

#[derive(Debug)]
pub struct Lighter {
    client: reqwest::Client,
}

impl Lighter {
    pub fn new(config: &Config) -> Self {
        Self {
            client: http_client(config),
        }
    }
}

#[async_trait]
impl Exchange for Lighter {
    fn descriptor(&self) -> &SourceDescriptor {
        &DESCRIPTOR
    }

    /// Lighter publishes every market's rate in one response.
    async fn fetch_funding_rates(
        &self,
        symbols: &[String],
    ) -> Result<Vec<FundingRate>, ExchangeError> {
        let url = format!("{}/api/v1/funding-rates", DESCRIPTOR.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ExchangeError::Http)?
            .error_for_status()
            .map_err(ExchangeError::Http)?
            .json::<FundingRatesResponse>()
            .await
            .map_err(ExchangeError::Http)?;

        let rates = response
            .funding_rates
            .into_iter()
            .filter_map(|entry| {
                let symbol = canonical_symbol(&entry.symbol);
                if !symbols.contains(&symbol) {
                    return None;
                }
                Some(FundingRate {
                    exchange: DESCRIPTOR.name,
                    symbol,
                    rate: entry.rate,
                    period: DESCRIPTOR.default_period,
                    observed_at: None,
                    next_funding_at: None,
                    reference_price: None,
                    instrument: entry.symbol,
                })
            })
            .collect();

        Ok(rates)
    }
}
