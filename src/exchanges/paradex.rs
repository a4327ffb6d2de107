use super::{Exchange, Pacer, SourceDescriptor, http_client, timestamp_millis};
use crate::config::Config;
use crate::errors::ExchangeError;
use crate::models::{FundingPeriod, FundingRate};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor {
    name: "paradex",
    base_url: "https://api.prod.paradex.trade",
    default_period: FundingPeriod::H1,
    supported_symbols: &super::COMMON_SYMBOLS,
};

#[derive(Debug, Deserialize)]
struct FundingDataResponse {
    results: Vec<FundingData>,
}

/// Most recent entry first.
#[derive(Debug, Deserialize)]
struct FundingData {
    funding_rate: String,
    oracle_price: Option<String>,
    created_at: Option<i64>,
}

#[derive(Debug)]
pub struct Paradex {
    client: reqwest::Client,
    pacer: Arc<Pacer>,
}

impl Paradex {
    pub fn new(config: &Config, pacer: Arc<Pacer>) -> Self {
        Self {
            client: http_client(config),
            pacer,
        }
    }

    async fn fetch_symbol(&self, symbol: &str) -> Result<Option<FundingRate>, ExchangeError> {
        let url = format!("{}/v1/funding-data", DESCRIPTOR.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("market", symbol)])
            .send()
            .await
            .map_err(ExchangeError::Http)?
            .error_for_status()
            .map_err(ExchangeError::Http)?
            .json::<FundingDataResponse>()
            .await
            .map_err(ExchangeError::Http)?;

        let Some(latest) = response.results.into_iter().next() else {
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
            observed_at: latest.created_at.and_then(timestamp_millis),
            next_funding_at: None,
            reference_price: latest.oracle_price.and_then(|p| p.parse::<f64>().ok()),
            instrument: symbol.to_string(),
        }))
    }
}

#[async_trait]
impl Exchange for Paradex {
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
                    tracing::warn!("[paradex] {symbol}: {e}");
                    last_error = Some(e);
                }
            }
        }

        match (rates.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            (_, _) => Ok(rates),
        }
    }
}
