use super::{Exchange, Pacer, SourceDescriptor, http_client, timestamp_millis};
use crate::config::Config;
use crate::errors::ExchangeError;
use crate::models::{FundingPeriod, FundingRate};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor {
    name: "apex",
    base_url: "https://api.pro.apex.exchange",
    default_period: FundingPeriod::H8,
    supported_symbols: &super::COMMON_SYMBOLS,
};

/// One funding settlement; the endpoint returns recent history, newest last.
#[derive(Debug, Deserialize)]
struct ApexFunding {
    symbol: Option<String>,
    rate: f64,
    price: Option<f64>,
    time: Option<i64>,
}

#[derive(Debug)]
pub struct Apex {
    client: reqwest::Client,
    pacer: Arc<Pacer>,
}

impl Apex {
    pub fn new(config: &Config, pacer: Arc<Pacer>) -> Self {
        Self {
            client: http_client(config),
            pacer,
        }
    }

    async fn fetch_symbol(&self, symbol: &str) -> Result<Option<FundingRate>, ExchangeError> {
        let url = format!("{}/v3/funding", DESCRIPTOR.base_url);
        let instrument = format!("{symbol}-USDT");

        let body = self
            .client
            .get(&url)
            .query(&[("symbol", instrument.as_str())])
            .send()
            .await
            .map_err(ExchangeError::Http)?
            .error_for_status()
            .map_err(ExchangeError::Http)?
            .text()
            .await
            .map_err(ExchangeError::Http)?;

        // the history arrives as a bare array, not wrapped in an envelope
        let history: Vec<ApexFunding> =
            serde_json::from_str(&body).map_err(ExchangeError::Parse)?;

        let Some(latest) = history.into_iter().next_back() else {
            return Ok(None);
        };

        Ok(Some(FundingRate {
            exchange: DESCRIPTOR.name,
            symbol: symbol.to_string(),
            rate: latest.rate,
            period: DESCRIPTOR.default_period,
            observed_at: latest.time.and_then(timestamp_millis),
            next_funding_at: None,
            reference_price: latest.price,
            instrument: latest.symbol.unwrap_or(instrument),
        }))
    }
}

#[async_trait]
impl Exchange for Apex {
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
                    tracing::warn!("[apex] {symbol}: {e}");
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
