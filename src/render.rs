use crate::models::{AggregationResult, FundingRate};
use crate::normalize::to_percent;
use crate::spread::SpreadOpportunity;
use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use std::fmt::Write;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct RateRow {
    #[tabled(rename = "Exchange")]
    exchange: &'static str,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Instrument")]
    instrument: String,
    #[tabled(rename = "Raw Rate")]
    raw: String,
    #[tabled(rename = "Hourly (%)")]
    hourly: String,
    #[tabled(rename = "Annualized (%)")]
    annualized: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Next Funding")]
    next_funding: String,
    #[tabled(rename = "Ref. Price")]
    price: String,
}

impl From<&FundingRate> for RateRow {
    fn from(record: &FundingRate) -> Self {
        Self {
            exchange: record.exchange,
            symbol: record.symbol.clone(),
            instrument: record.instrument.clone(),
            raw: format!("{:.8}", record.rate),
            hourly: format!("{:.4}", to_percent(record.hourly())),
            annualized: format!("{:.2}", to_percent(record.annualized())),
            period: record.period.to_string(),
            next_funding: format_timestamp(record.next_funding_at),
            price: match record.reference_price {
                Some(price) => format!("{price}"),
                None => "N/A".to_string(),
            },
        }
    }
}

/// The comparison table: grouped by symbol, and within a group ordered by
/// hourly rate so the extremes (the arbitrage legs) sit at the group edges.
pub fn comparison_table(result: &AggregationResult) -> String {
    if result.records.is_empty() {
        return "No funding rate data retrieved.".to_string();
    }

    let mut records: Vec<&FundingRate> = result.records.iter().collect();
    records.sort_by(|a, b| {
        a.symbol
            .cmp(&b.symbol)
            .then_with(|| OrderedFloat(a.hourly()).cmp(&OrderedFloat(b.hourly())))
            .then_with(|| a.exchange.cmp(b.exchange))
    });

    Table::new(records.iter().map(|r| RateRow::from(*r))).to_string()
}

/// Text block listing the best long/short venue pair per symbol.
pub fn spread_report(spreads: &[SpreadOpportunity]) -> String {
    let mut out = String::from("Arbitrage Opportunities (Rate Differences)\n");
    out.push_str("--------------------------------------------------\n");

    for spread in spreads {
        // writing to a String cannot fail
        let _ = writeln!(
            out,
            "{}:\n  Highest: {} ({:.4}%/h)\n  Lowest:  {} ({:.4}%/h)\n  Spread:  {:.4}% hourly ({:.2}% annual)",
            spread.symbol,
            spread.high_exchange,
            to_percent(spread.high_hourly),
            spread.low_exchange,
            to_percent(spread.low_hourly),
            to_percent(spread.spread_hourly),
            to_percent(spread.spread_annualized),
        );
    }
    out
}

pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FundingPeriod;
    use chrono::TimeZone;

    fn record(exchange: &'static str, symbol: &str, rate: f64) -> FundingRate {
        FundingRate {
            exchange,
            symbol: symbol.to_string(),
            instrument: format!("{symbol}USDT"),
            rate,
            period: FundingPeriod::H1,
            observed_at: None,
            next_funding_at: None,
            reference_price: None,
        }
    }

    #[test]
    fn empty_result_renders_a_message_not_a_table() {
        let rendered = comparison_table(&AggregationResult::default());
        assert_eq!(rendered, "No funding rate data retrieved.");
    }

    #[test]
    fn rows_group_by_symbol_and_sort_by_hourly_rate() {
        let result = AggregationResult {
            records: vec![
                record("x", "ETH", 0.0002),
                record("y", "BTC", 0.0009),
                record("x", "BTC", 0.0001),
            ],
            failures: Vec::new(),
        };

        let rendered = comparison_table(&result);
        let btc_low = rendered.find("0.00010000").expect("low BTC row");
        let btc_high = rendered.find("0.00090000").expect("high BTC row");
        let eth = rendered.find("0.00020000").expect("ETH row");
        assert!(btc_low < btc_high, "within a group, lowest hourly first");
        assert!(btc_high < eth, "symbol groups in alphabetical order");
    }

    #[test]
    fn spread_report_shows_both_legs() {
        let spreads = vec![SpreadOpportunity {
            symbol: "BTC".to_string(),
            high_exchange: "y",
            high_hourly: 0.0003,
            low_exchange: "x",
            low_hourly: 0.0001,
            spread_hourly: 0.0002,
            spread_annualized: 1.7532,
        }];

        let report = spread_report(&spreads);
        assert!(report.contains("Highest: y (0.0300%/h)"));
        assert!(report.contains("Lowest:  x (0.0100%/h)"));
        assert!(report.contains("0.0200% hourly (175.32% annual)"));
    }

    #[test]
    fn timestamps_render_as_utc_or_na() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        assert_eq!(format_timestamp(Some(dt)), "2024-01-15 08:00:00 UTC");
        assert_eq!(format_timestamp(None), "N/A");
    }
}
