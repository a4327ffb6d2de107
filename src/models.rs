use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;

/// One funding assessment interval, in hours.
///
/// Venues settle funding every 1h or 8h; the interval is part of the record
/// because raw per-period rates are only comparable after normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundingPeriod(f64);

impl FundingPeriod {
    pub const H1: FundingPeriod = FundingPeriod(1.0);
    pub const H8: FundingPeriod = FundingPeriod(8.0);

    pub fn from_hours(hours: f64) -> Self {
        Self(hours)
    }

    pub fn hours(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for FundingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}h", self.0 as i64)
        } else {
            write!(f, "{}h", self.0)
        }
    }
}

impl FromStr for FundingPeriod {
    type Err = ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hours = s.trim().trim_end_matches(['h', 'H']).parse::<f64>()?;
        Ok(Self(hours))
    }
}

// Serialized as "1h"/"8h" so CSV and JSON exports stay human-readable.
impl Serialize for FundingPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FundingPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One normalized funding rate observation.
///
/// `rate` is always the fraction of notional paid per one `period`, exactly
/// as the venue settles it. Never a percentage, never pre-scaled to hourly:
/// presentation converts, the stored record does not change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingRate {
    pub exchange: &'static str,
    /// Canonical symbol used for cross-venue grouping, e.g. "BTC".
    pub symbol: String,
    /// The venue's own instrument name, e.g. "BTCUSDT" or "BTC-USD".
    pub instrument: String,
    pub rate: f64,
    pub period: FundingPeriod,
    pub observed_at: Option<DateTime<Utc>>,
    pub next_funding_at: Option<DateTime<Utc>>,
    pub reference_price: Option<f64>,
}

impl FundingRate {
    /// Rate normalized to a one-hour basis.
    pub fn hourly(&self) -> f64 {
        crate::normalize::to_hourly(self.rate, self.period)
    }

    /// Rate scaled to a one-year basis.
    pub fn annualized(&self) -> f64 {
        crate::normalize::to_annualized(self.hourly())
    }
}

/// A venue that produced no usable data during one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub exchange: &'static str,
    pub message: String,
}

/// Outcome of one aggregation pass. A non-empty failure list alongside
/// whatever records were collected is a normal, successful result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResult {
    pub records: Vec<FundingRate>,
    pub failures: Vec<SourceFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_displays_whole_hours_without_fraction() {
        assert_eq!(FundingPeriod::H1.to_string(), "1h");
        assert_eq!(FundingPeriod::H8.to_string(), "8h");
        assert_eq!(FundingPeriod::from_hours(0.5).to_string(), "0.5h");
    }

    #[test]
    fn period_parses_with_and_without_suffix() {
        assert_eq!("8h".parse::<FundingPeriod>().unwrap(), FundingPeriod::H8);
        assert_eq!("1".parse::<FundingPeriod>().unwrap(), FundingPeriod::H1);
        assert!("eight".parse::<FundingPeriod>().is_err());
    }

    #[test]
    fn period_round_trips_through_display() {
        for period in [FundingPeriod::H1, FundingPeriod::H8] {
            assert_eq!(period.to_string().parse::<FundingPeriod>().unwrap(), period);
        }
    }
}
