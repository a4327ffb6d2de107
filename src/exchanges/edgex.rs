use super::{Exchange, Pacer, SourceDescriptor, http_client};
use crate::config::Config;
use crate::errors::ExchangeError;
use crate::models::{FundingPeriod, FundingRate};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

static DESCRIPTOR: SourceDescriptor = SourceDescriptor {
    name: "edgex",
    base_url: "https://api.starknet.extended.exchange",
    default_period: FundingPeriod::H8,
    supported_symbols: &super::COMMON_SYMBOLS,
};

#[derive(Debug, Deserialize)]
struct StatsResponse {
    status: String,
    data: Option<MarketStats>,
}

#[derive(Debug, Deserialize)]
struct MarketStats {
    #[serde(rename = "fundingRate")]
    funding_rate: String,

    #[serde(rename = "markPrice")]
    mark_price: Option<String>,
}

#[derive(Debug)]
pub struct EdgeX {
    client: reqwest::Client,
    pacer: Arc<Pacer>,
}

impl EdgeX {
    pub fn new(config: &Config, pacer: Arc<Pacer>) -> Self {
        Self {
            client: http_client(config),
            pacer,
        }
    }

    async fn fetch_symbol(&self, symbol: &str) -> Result<Option<FundingRate>, ExchangeError> {
        // edgeX markets are quoted in USD: BTC -> BTC-USD
        let instrument = format!("{symbol}-USD");
        let url = format!(
            "{}/api/v1/info/markets/{instrument}/stats",
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
            .json::<StatsResponse>()
            .await
            .map_err(ExchangeError::Http)?;

        if response.status != "OK" {
            return Err(ExchangeError::UnexpectedData(format!(
                "edgeX status: {}",
                response.status
            )));
        }
        let Some(stats) = response.data else {
            return Ok(None);
        };

        let rate = stats
            .funding_rate
            .parse::<f64>()
            .map_err(|e| ExchangeError::UnexpectedData(e.to_string()))?;

        Ok(Some(FundingRate {
            exchange: DESCRIPTOR.name,
            symbol: symbol.to_string(),
            rate,
            period: DESCRIPTOR.default_period,
            observed_at: None,
            next_funding_at: None,
            reference_price: stats.mark_price.and_then(|p| p.parse::<f64>().ok()),
            instrument,
        }))
    }
}

#[async_trait]
impl Exchange for EdgeX {
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
                    tracing::warn!("[edgex] {symbol}: {e}");
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
