use super::handlers;
use crate::store::RateStore;
use axum::Router;
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds and returns the full Axum router with all routes and shared state.
pub fn build(store: RateStore) -> Router {
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/rates", get(handlers::get_all_rates))
        .route("/rates/{symbol}", get(handlers::get_symbol_rates))
        .route("/spreads", get(handlers::get_spreads))
        .route("/metrics", get(move || async move { metric_handle.render() }))
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}
