pub mod handlers;
pub mod models;
pub mod router;

use crate::config::Config;
use crate::store::RateStore;
use std::net::SocketAddr;

pub struct ApiServer {
    store: RateStore,
}

impl ApiServer {
    pub fn new(store: RateStore) -> Self {
        Self { store }
    }

    /// Binds the server to the configured port and starts serving.
    pub async fn run(self, config: &Config) -> anyhow::Result<()> {
        let app = router::build(self.store);
        let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));

        tracing::info!("API server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
