mod aggregator;
mod api;
mod cli;
mod config;
mod errors;
mod exchanges;
mod export;
mod models;
mod normalize;
mod render;
mod spread;
mod store;

use api::ApiServer;
use clap::Parser;
use cli::Cli;
use config::Config;
use normalize::to_percent;
use store::RateStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;

    if args.serve {
        serve(args, &config).await
    } else {
        cli::run(args, &config).await
    }
}

/// Long-running mode: refresh the aggregation on an interval and expose the
/// latest snapshot over HTTP until Ctrl+C.
async fn serve(args: Cli, config: &Config) -> anyhow::Result<()> {
    let names = cli::resolve_exchanges(&args.exchanges);
    let pairs = cli::resolve_pairs(&args.pairs);

    let clients = exchanges::select(&names, config)?;
    let aggregator = aggregator::Aggregator::new(clients)?;
    let store = RateStore::new();

    tracing::info!(
        "fundarb serving — exchanges: {:?}, pairs: {:?}, port {}",
        names,
        pairs,
        config.api_port
    );

    let refresh_store = store.clone();
    let refresh_interval = config.refresh_interval;

    tokio::spawn(async move {
        // the first tick fires immediately, so the store fills right away
        let mut interval = tokio::time::interval(refresh_interval);
        loop {
            interval.tick().await;

            let result = aggregator.run(&pairs).await;
            refresh_store.replace(&result.records);

            let spreads = spread::compute_spreads(&result.records);
            if spreads.is_empty() {
                continue;
            }
            tracing::info!("=== TOP SPREADS ===");
            for s in spreads.iter().take(5) {
                tracing::info!(
                    "{}: long {} {:.4}%/h, short {} {:.4}%/h, spread {:.4}%/h ({:.2}%/yr)",
                    s.symbol,
                    s.low_exchange,
                    to_percent(s.low_hourly),
                    s.high_exchange,
                    to_percent(s.high_hourly),
                    to_percent(s.spread_hourly),
                    to_percent(s.spread_annualized),
                );
            }
        }
    });

    let server = ApiServer::new(store);
    tokio::select! {
        outcome = server.run(config) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down...");
            Ok(())
        }
    }
}
