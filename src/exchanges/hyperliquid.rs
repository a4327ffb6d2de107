use super::{Exchange, Pacer, SourceDescriptor, http_client, timestamp_millis};
use crate::config::Config;
use crate::errors::ExchangeError;
use crate::models::{FundingPeriod, FundingRate};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor {
    name: "hyperliquid",
    base_url: "https://api.hyperliquid.xyz",
    default_period: FundingPeriod::H1,
    supported_symbols: &super::COMMON_SYMBOLS,
};

#[derive(Debug, Deserialize)]
struct FundingEvent {
    #[serde(rename = "fundingRate")]
    funding_rate: String,

    time: i64,
}

#[derive(Debug)]
pub struct Hyperliquid {
    client: reqwest::Client,
    pacer: Arc<Pacer>,
}

impl Hyperliquid {
    pub fn new(config: &Config, pacer: Arc<Pacer>) -> Self {
        Self {
            client: http_client(config),
            pacer,
        }
    }

    /// The info endpoint is POST-only; fundingHistory over the last day,
    /// newest entry last.
    async fn fetch_symbol(&self, symbol: &str) -> Result<Option<FundingRate>, ExchangeError> {
        let url = format!("{}/info", DESCRIPTOR.base_url);
        let start_time = (Utc::now() - Duration::hours(24)).timestamp_millis();

        let history = self
            .client
            .post(&url)
            .json(&json!({
                "type": "fundingHistory",
                "coin": symbol,
                "startTime": start_time,
            }))
            .send()
            .await
            .map_err(ExchangeError::Http)?
            .error_for_status()
            .map_err(ExchangeError::Http)?
            .json::<Vec<FundingEvent>>()
            .await
            .map_err(ExchangeError::Http)?;

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
            observed_at: timestamp_millis(latest.time),
            next_funding_at: None,
            reference_price: None,
            // Hyperliquid names perps by bare coin
            instrument: symbol.to_string(),
        }))
    }
}

#[async_trait]
impl Exchange for Hyperliquid {
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
                    tracing::warn!("[hyperliquid] {symbol}: {e}");
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
