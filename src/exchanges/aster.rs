use super::{Exchange, Pacer, SourceDescriptor, http_client, timestamp_millis};
use crate::config::Config;
use crate::errors::ExchangeError;
use crate::models::{FundingPeriod, FundingRate};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor {
    name: "aster",
    base_url: "https://fapi.asterdex.com",
    default_period: FundingPeriod::H8,
    supported_symbols: &super::COMMON_SYMBOLS,
};

/// One settled funding event; the endpoint returns the recent history.
#[derive(Debug, Deserialize)]
struct AsterFunding {
    symbol: String,

    #[serde(rename = "fundingRate")]
    funding_rate: String,

    #[serde(rename = "fundingTime")]
    funding_time: i64,
}

#[derive(Debug)]
pub struct Aster {
    client: reqwest::Client,
    pacer: Arc<Pacer>,
}

impl Aster {
    pub fn new(config: &Config, pacer: Arc<Pacer>) -> Self {
        Self {
            client: http_client(config),
            pacer,
        }
    }

    async fn fetch_symbol(&self, symbol: &str) -> Result<Option<FundingRate>, ExchangeError> {
        let url = format!("{}/fapi/v1/fundingRate", DESCRIPTOR.base_url);
        let instrument = format!("{symbol}USDT");

        let history = self
            .client
            .get(&url)
            .query(&[("symbol", instrument.as_str())])
            .send()
            .await
            .map_err(ExchangeError::Http)?
            .error_for_status()
            .map_err(ExchangeError::Http)?
            .json::<Vec<AsterFunding>>()
            .await
            .map_err(ExchangeError::Http)?;

        // an unlisted symbol comes back as an empty history, not an error
        let Some(latest) = history.into_iter().next_back() else {
            return Ok(None);
        };

        let rate = latest
            .funding_rate
            .parse::<f64>()
            .map_err(|e| ExchangeError::UnexpectedData(e.to_string()))?;

        Ok(Some(FundingRate {
            exchange: DESCRIPTOR.name,
            symbol: symbol.to_string(),
            rate,
            period: DESCRIPTOR.default_period,
            observed_at: timestamp_millis(latest.funding_time),
            next_funding_at: None,
            reference_price: None,
            instrument: latest.symbol,
        }))
    }
}

#[async_trait]
impl Exchange for Aster {
    fn descriptor(&self) -> &SourceDescriptor {
        &DESCRIPTOR
    }

    async fn fetch_funding_rates(
        &self,
        symbols: &[String],
    ) -> Result<Vec<FundingRate>, ExchangeError> {
        let mut rates = Vec::new();
        let mut last_error = None;

        for symbol in symbols {
            if !DESCRIPTOR.supported_symbols.contains(&symbol.as_str()) {
                continue;
            }
            self.pacer.wait(DESCRIPTOR.name).await;

            match self.fetch_symbol(symbol).await {
                Ok(Some(rate)) => rates.push(rate),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("[aster] {symbol}: {e}");
                    last_error = Some(e);
                }
            }
        }

        // partial data is fine; only a venue that yielded nothing is a failure
        match (rates.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            (_, _) => Ok(rates),
        }
    }
}
