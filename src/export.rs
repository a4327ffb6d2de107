use crate::models::{AggregationResult, FundingPeriod, FundingRate};
use crate::normalize::to_percent;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// One exported row. Declaration order is the export schema; consumer
/// scripts diff these files, so it must not change between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub exchange: String,
    pub symbol: String,
    pub instrument: String,
    pub funding_rate_raw: f64,
    pub funding_rate_percent: f64,
    pub funding_period: FundingPeriod,
    pub observed_at: Option<String>,
    pub next_funding_at: Option<String>,
    pub reference_price: Option<f64>,
}

impl From<&FundingRate> for ExportRow {
    fn from(record: &FundingRate) -> Self {
        Self {
            exchange: record.exchange.to_string(),
            symbol: record.symbol.clone(),
            instrument: record.instrument.clone(),
            funding_rate_raw: record.rate,
            funding_rate_percent: to_percent(record.rate),
            funding_period: record.period,
            observed_at: record.observed_at.map(|dt| dt.to_rfc3339()),
            next_funding_at: record.next_funding_at.map(|dt| dt.to_rfc3339()),
            reference_price: record.reference_price,
        }
    }
}

const CSV_HEADER: [&str; 9] = [
    "exchange",
    "symbol",
    "instrument",
    "funding_rate_raw",
    "funding_rate_percent",
    "funding_period",
    "observed_at",
    "next_funding_at",
    "reference_price",
];

/// Writes the records as CSV. The header row is always present, even for an
/// empty pass, so consumers see a stable schema.
pub fn write_csv<W: Write>(records: &[FundingRate], writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.serialize(ExportRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Parses a file previously produced by `write_csv`.
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<ExportRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Writes the records as a JSON array of the same row shape as the CSV.
pub fn write_json<W: Write>(records: &[FundingRate], writer: W) -> anyhow::Result<()> {
    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
    serde_json::to_writer_pretty(writer, &rows)?;
    Ok(())
}

/// Exports one pass to `path`; `.json` selects JSON, anything else CSV.
/// An unwritable path is fatal misconfiguration.
pub fn export(result: &AggregationResult, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot write export file {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => write_json(&result.records, file),
        _ => write_csv(&result.records, file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FundingPeriod;
    use chrono::TimeZone;
    use chrono::Utc;

    fn sample_records() -> Vec<FundingRate> {
        vec![
            FundingRate {
                exchange: "binance",
                symbol: "BTC".to_string(),
                instrument: "BTCUSDT".to_string(),
                rate: 0.0001,
                period: FundingPeriod::H8,
                observed_at: None,
                next_funding_at: Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).latest(),
                reference_price: Some(42000.5),
            },
            FundingRate {
                exchange: "hyperliquid",
                symbol: "ETH".to_string(),
                instrument: "ETH".to_string(),
                rate: -0.00002,
                period: FundingPeriod::H1,
                observed_at: Utc.with_ymd_and_hms(2024, 1, 15, 7, 0, 0).latest(),
                next_funding_at: None,
                reference_price: None,
            },
        ]
    }

    #[test]
    fn csv_round_trips_the_core_fields() {
        let records = sample_records();

        let mut buffer = Vec::new();
        write_csv(&records, &mut buffer).unwrap();
        let rows = read_csv(buffer.as_slice()).unwrap();

        assert_eq!(rows.len(), records.len());
        for (row, record) in rows.iter().zip(&records) {
            assert_eq!(row.exchange, record.exchange);
            assert_eq!(row.symbol, record.symbol);
            assert_eq!(row.instrument, record.instrument);
            assert_eq!(row.funding_rate_raw, record.rate);
            assert_eq!(row.funding_period, record.period);
        }
    }

    #[test]
    fn csv_header_is_present_even_without_records() {
        let mut buffer = Vec::new();
        write_csv(&[], &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text.trim_end(),
            "exchange,symbol,instrument,funding_rate_raw,funding_rate_percent,\
             funding_period,observed_at,next_funding_at,reference_price"
        );
    }

    #[test]
    fn csv_header_matches_the_row_shape() {
        let mut buffer = Vec::new();
        write_csv(&sample_records(), &mut buffer).unwrap();
        // deserialization maps columns by the header names, so a drifting
        // header would surface here as a parse failure
        assert!(read_csv(buffer.as_slice()).is_ok());
    }

    #[test]
    fn json_output_is_stable_across_runs() {
        let records = sample_records();

        let mut first = Vec::new();
        let mut second = Vec::new();
        write_json(&records, &mut first).unwrap();
        write_json(&records, &mut second).unwrap();

        assert_eq!(first, second);
        assert!(String::from_utf8(first).unwrap().contains("\"funding_period\": \"8h\""));
    }

    #[test]
    fn percent_column_is_raw_times_one_hundred() {
        let row = ExportRow::from(&sample_records()[0]);
        assert!((row.funding_rate_percent - 0.01).abs() < 1e-12);
    }
}
