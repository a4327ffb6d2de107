use crate::export::ExportRow;
use crate::spread::SpreadOpportunity;
use serde::Serialize;

/// Response for GET /rates
#[derive(Serialize)]
pub struct RatesResponse {
    pub rates: Vec<ExportRow>,
}

/// Response for GET /rates/{symbol}
#[derive(Serialize)]
pub struct SymbolRatesResponse {
    pub symbol: String,
    pub rates: Vec<ExportRow>,
}

/// Response for GET /spreads
#[derive(Serialize)]
pub struct SpreadsResponse {
    pub spreads: Vec<SpreadOpportunity>,
}
