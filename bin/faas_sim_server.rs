//! HTTP server binary: exposes the single-run, sweep, and health endpoints
//! over `axum`, dispatching every request to the in-process worker pool.

use anyhow::Result;
use faas_sim::{AppState, Settings, WorkerPoolHandle};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let settings = Settings::new()?;
    faas_sim::logging::init(&settings.log);

    #[cfg(feature = "observability")]
    if settings.metrics.enabled {
        let addr: std::net::SocketAddr = ([0, 0, 0, 0], settings.metrics.port).into();
        faas_sim::metrics::install_recorder(addr)?;
        tracing::info!(%addr, "metrics exporter listening");
    }

    let worker_pool = WorkerPoolHandle::spawn(settings.worker.pool_size);
    let router = faas_sim::create_router(AppState { worker_pool });

    let addr: std::net::SocketAddr = settings.http.bind_address.parse()?;
    tracing::info!(%addr, "faas-sim-server listening");
    axum::Server::bind(&addr)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}
