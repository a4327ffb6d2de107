use super::{Exchange, Pacer, SourceDescriptor, http_client, timestamp_millis};
use crate::config::Config;
use crate::errors::ExchangeError;
use crate::models::{FundingPeriod, FundingRate};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor {
    name: "reya",
    base_url: "https://api.reya.xyz",
    default_period: FundingPeriod::H1,
    supported_symbols: &super::COMMON_SYMBOLS,
};

#[derive(Debug, Deserialize)]
struct FundingResponse {
    market: Option<String>,
    current_funding_rate: f64,
    next_funding_time: Option<i64>,
    mark_price: Option<f64>,
}

#[derive(Debug)]
pub struct Reya {
    client: reqwest::Client,
    pacer: Arc<Pacer>,
}

impl Reya {
    pub fn new(config: &Config, pacer: Arc<Pacer>) -> Self {
        Self {
            client: http_client(config),
            pacer,
        }
    }

    async fn fetch_symbol(&self, symbol: &str) -> Result<Option<FundingRate>, ExchangeError> {
        let url = format!("{}/v2/funding", DESCRIPTOR.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("market", symbol)])
            .send()
            .await
            .map_err(ExchangeError::Http)?
            .error_for_status()
            .map_err(ExchangeError::Http)?
            .json::<FundingResponse>()
            .await
            .map_err(ExchangeError::Http)?;

        Ok(Some(FundingRate {
            exchange: DESCRIPTOR.name,
            symbol: symbol.to_string(),
            rate: response.current_funding_rate,
            period: DESCRIPTOR.default_period,
            observed_at: None,
            next_funding_at: response.next_funding_time.and_then(timestamp_millis),
            reference_price: response.mark_price,
            instrument: response.market.unwrap_or_else(|| symbol.to_string()),
        }))
    }
}

#[async_trait]
impl Exchange for Reya {
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
                    tracing::warn!("[reya] {symbol}: {e}");
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
