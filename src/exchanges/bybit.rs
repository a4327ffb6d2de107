use super::{Exchange, SourceDescriptor, http_client, timestamp_millis};
use crate::config::Config;
use crate::errors::ExchangeError;
use crate::models::{FundingPeriod, FundingRate};
use crate::normalize::canonical_symbol;
use async_trait::async_trait;
use serde::Deserialize;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor {
    name: "bybit",
    base_url: "https://api.bybit.com",
    default_period: FundingPeriod::H8,
    supported_symbols: &super::COMMON_SYMBOLS,
};

#[derive(Debug, Deserialize)]
struct BybitResponse {
    #[serde(rename = "retCode")]
    ret_code: i32,
    result: BybitResult,
}

#[derive(Debug, Deserialize)]
struct BybitResult {
    list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize)]
struct BybitTicker {
    symbol: String,

    #[serde(rename = "fundingRate")]
    funding_rate: String,

    #[serde(rename = "nextFundingTime")]
    next_funding_time: String,

    #[serde(rename = "markPrice")]
    mark_price: String,
}

#[derive(Debug)]
pub struct Bybit {
    client: reqwest::Client,
}

impl Bybit {
    pub fn new(config: &Config) -> Self {
        Self {
            client: http_client(config),
        }
    }
}

#[async_trait]
impl Exchange for Bybit {
    fn descriptor(&self) -> &SourceDescriptor {
        &DESCRIPTOR
    }

    /// One batched call: the linear tickers endpoint without a symbol
    /// parameter returns every perpetual in one response.
    async fn fetch_funding_rates(
        &self,
        symbols: &[String],
    ) -> Result<Vec<FundingRate>, ExchangeError> {
        let url = format!(
            "{}/v5/market/tickers?category=linear",
            DESCRIPTOR.base_url
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ExchangeError::Http)?
            .error_for_status()
            .map_err(ExchangeError::Http)?
            .json::<BybitResponse>()
            .await
            .map_err(ExchangeError::Http)?;

        // Bybit signals errors via retCode, not just HTTP status
        if response.ret_code != 0 {
            return Err(ExchangeError::UnexpectedData(format!(
                "Bybit retCode: {}",
                response.ret_code
            )));
        }

        let mut rates = Vec::new();
        for ticker in response.result.list {
            let symbol = canonical_symbol(&ticker.symbol);
            if !symbols.contains(&symbol) {
                continue;
            }

            // expiring futures appear in the same list with an empty rate
            if ticker.funding_rate.is_empty() {
                continue;
            }

            let rate = match ticker.funding_rate.parse::<f64>() {
                Ok(rate) => rate,
                Err(e) => {
                    tracing::warn!("[bybit] {}: bad funding rate: {e}", ticker.symbol);
                    continue;
                }
            };

            rates.push(FundingRate {
                exchange: DESCRIPTOR.name,
                symbol,
                rate,
                period: DESCRIPTOR.default_period,
                observed_at: None,
                next_funding_at: ticker
                    .next_funding_time
                    .parse::<i64>()
                    .ok()
                    .and_then(timestamp_millis),
                reference_price: ticker.mark_price.parse::<f64>().ok(),
                instrument: ticker.symbol,
            });
        }

        Ok(rates)
    }
}
