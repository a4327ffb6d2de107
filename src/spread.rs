use crate::models::FundingRate;
use crate::normalize::to_annualized;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Best cross-venue rate difference for one symbol. Hourly-normalized so a
/// 1h venue and an 8h venue compare on the same basis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadOpportunity {
    pub symbol: String,
    pub high_exchange: &'static str,
    pub high_hourly: f64,
    pub low_exchange: &'static str,
    pub low_hourly: f64,
    pub spread_hourly: f64,
    pub spread_annualized: f64,
}

/// Computes the arbitrage spread per symbol across all venues reporting it.
/// A symbol seen on fewer than two venues has no defined spread and is
/// omitted rather than reported as zero. Sorted by descending spread.
pub fn compute_spreads(records: &[FundingRate]) -> Vec<SpreadOpportunity> {
    let mut by_symbol: BTreeMap<&str, Vec<&FundingRate>> = BTreeMap::new();
    for record in records {
        by_symbol.entry(record.symbol.as_str()).or_default().push(record);
    }

    let mut spreads = Vec::new();
    for (symbol, group) in by_symbol {
        let venues: HashSet<_> = group.iter().map(|r| r.exchange).collect();
        if venues.len() < 2 {
            continue;
        }

        let high = group.iter().max_by_key(|r| OrderedFloat(r.hourly()));
        let low = group.iter().min_by_key(|r| OrderedFloat(r.hourly()));
        let (Some(high), Some(low)) = (high, low) else {
            continue;
        };

        let spread_hourly = high.hourly() - low.hourly();
        spreads.push(SpreadOpportunity {
            symbol: symbol.to_string(),
            high_exchange: high.exchange,
            high_hourly: high.hourly(),
            low_exchange: low.exchange,
            low_hourly: low.hourly(),
            spread_hourly,
            spread_annualized: to_annualized(spread_hourly),
        });
    }

    spreads.sort_by(|a, b| {
        OrderedFloat(b.spread_hourly)
            .cmp(&OrderedFloat(a.spread_hourly))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    spreads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FundingPeriod;

    fn record(exchange: &'static str, symbol: &str, rate: f64, period: FundingPeriod) -> FundingRate {
        FundingRate {
            exchange,
            symbol: symbol.to_string(),
            instrument: symbol.to_string(),
            rate,
            period,
            observed_at: None,
            next_funding_at: None,
            reference_price: None,
        }
    }

    #[test]
    fn spread_is_max_minus_min_hourly() {
        let records = vec![
            record("x", "BTC", 0.0001, FundingPeriod::H1),
            record("y", "BTC", 0.0003, FundingPeriod::H1),
        ];

        let spreads = compute_spreads(&records);
        assert_eq!(spreads.len(), 1);

        let spread = &spreads[0];
        assert_eq!(spread.high_exchange, "y");
        assert_eq!(spread.low_exchange, "x");
        assert!((spread.spread_hourly - 0.0002).abs() < 1e-12);
        assert!((spread.spread_annualized - 1.7532).abs() < 1e-9);
    }

    #[test]
    fn periods_are_normalized_before_comparison() {
        // 0.0008 per 8h is the same hourly rate as 0.0001 per 1h
        let records = vec![
            record("x", "BTC", 0.0008, FundingPeriod::H8),
            record("y", "BTC", 0.0001, FundingPeriod::H1),
        ];

        let spreads = compute_spreads(&records);
        assert!(spreads[0].spread_hourly.abs() < 1e-12);
    }

    #[test]
    fn single_venue_symbols_are_omitted() {
        let records = vec![
            record("x", "BTC", 0.0001, FundingPeriod::H1),
            record("x", "ETH", 0.0002, FundingPeriod::H1),
            record("y", "ETH", 0.0009, FundingPeriod::H1),
        ];

        let spreads = compute_spreads(&records);
        assert_eq!(spreads.len(), 1);
        assert_eq!(spreads[0].symbol, "ETH");
    }

    #[test]
    fn widest_spread_sorts_first() {
        let records = vec![
            record("x", "BTC", 0.0001, FundingPeriod::H1),
            record("y", "BTC", 0.0002, FundingPeriod::H1),
            record("x", "ETH", 0.0001, FundingPeriod::H1),
            record("y", "ETH", 0.0009, FundingPeriod::H1),
        ];

        let spreads = compute_spreads(&records);
        assert_eq!(spreads[0].symbol, "ETH");
        assert_eq!(spreads[1].symbol, "BTC");
    }
}
