//! Rate math and symbol canonicalization. Pure functions, no I/O.

use crate::models::FundingPeriod;

/// 24 * 365.25; the .25 accounts for leap years in the approximation.
pub const HOURS_PER_YEAR: f64 = 24.0 * 365.25;

/// Normalize a per-period rate to a one-hour basis.
/// A non-positive period returns the rate unchanged instead of dividing.
pub fn to_hourly(rate: f64, period: FundingPeriod) -> f64 {
    let hours = period.hours();
    if hours > 0.0 { rate / hours } else { rate }
}

/// Scale an hourly rate to a one-year basis.
pub fn to_annualized(hourly_rate: f64) -> f64 {
    hourly_rate * HOURS_PER_YEAR
}

/// Fraction → display percentage. The stored record is always fractional;
/// this is for presentation and export columns only.
pub fn to_percent(rate: f64) -> f64 {
    rate * 100.0
}

// Quote/contract suffixes venues append to the base asset. Longer variants
// first so "USDT" is never half-stripped as "USD".
const QUOTE_SUFFIXES: [&str; 4] = ["USDT", "USDC", "PERP", "USD"];

/// Collapse a venue's instrument name to the canonical base symbol:
/// "BTCUSDT", "BTC-USD", "BTC-PERP", "BTC-USD-PERP" all become "BTC".
pub fn canonical_symbol(raw: &str) -> String {
    let mut symbol = raw.trim().to_uppercase();

    loop {
        let before = symbol.len();
        for suffix in QUOTE_SUFFIXES {
            if let Some(stripped) = symbol.strip_suffix(suffix) {
                symbol = stripped.trim_end_matches(['-', '_', '/']).to_string();
            }
        }
        if symbol.len() == before {
            return symbol;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_with_period_of_one_is_identity() {
        for rate in [0.0, 0.0001, -0.0003, 1.25] {
            assert_eq!(to_hourly(rate, FundingPeriod::H1), rate);
        }
    }

    #[test]
    fn hourly_divides_by_period_hours() {
        assert!((to_hourly(0.0008, FundingPeriod::H8) - 0.0001).abs() < 1e-15);
    }

    #[test]
    fn non_positive_period_falls_back_to_raw_rate() {
        assert_eq!(to_hourly(0.01, FundingPeriod::from_hours(0.0)), 0.01);
        assert_eq!(to_hourly(0.01, FundingPeriod::from_hours(-8.0)), 0.01);
    }

    #[test]
    fn annualization_uses_8766_hours() {
        assert_eq!(HOURS_PER_YEAR, 8766.0);
        assert!((to_annualized(0.01) - 87.66).abs() < 1e-9);
        let hourly = 0.0001;
        assert_eq!(to_annualized(hourly), hourly * 8766.0);
    }

    #[test]
    fn symbol_variants_collapse_to_one_canonical_form() {
        for raw in ["BTC", "BTC-USD", "BTCUSDT", "BTC-PERP", "BTC-USDC", "BTC-USD-PERP", "btcusdt"] {
            assert_eq!(canonical_symbol(raw), "BTC", "variant {raw}");
        }
    }

    #[test]
    fn unsuffixed_symbols_pass_through() {
        assert_eq!(canonical_symbol("DOGE"), "DOGE");
        assert_eq!(canonical_symbol("eth"), "ETH");
    }
}
