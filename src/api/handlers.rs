use super::models::{RatesResponse, SpreadsResponse, SymbolRatesResponse};
use crate::export::ExportRow;
use crate::normalize::canonical_symbol;
use crate::spread::compute_spreads;
use crate::store::RateStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

/// GET /health — simple liveness check
pub async fn health() -> &'static str {
    "OK"
}

/// GET /rates — the latest snapshot across all exchanges
pub async fn get_all_rates(State(store): State<RateStore>) -> Json<RatesResponse> {
    let rates = store.all().iter().map(ExportRow::from).collect();
    Json(RatesResponse { rates })
}

/// GET /rates/{symbol} — the latest snapshot for one canonical symbol;
/// venue spellings like "btcusdt" are accepted and collapsed
pub async fn get_symbol_rates(
    State(store): State<RateStore>,
    Path(symbol): Path<String>,
) -> Result<Json<SymbolRatesResponse>, StatusCode> {
    let symbol = canonical_symbol(&symbol);
    let rates: Vec<ExportRow> = store
        .all()
        .iter()
        .filter(|r| r.symbol == symbol)
        .map(ExportRow::from)
        .collect();

    if rates.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(Json(SymbolRatesResponse { symbol, rates }))
}

/// GET /spreads — arbitrage spreads over the latest snapshot
pub async fn get_spreads(State(store): State<RateStore>) -> Json<SpreadsResponse> {
    Json(SpreadsResponse {
        spreads: compute_spreads(&store.all()),
    })
}
