//! HTTP server for the dealer matching engine.
//!
//! Endpoints: health check, submit order, cancel order, order and deal lookup, book snapshot.

use std::sync::Arc;

use dealer::app;
use dealer::audit::StdoutAuditSink;
use dealer::config::Config;
use log::info;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::try_init();
    let config = Config::from_env()?;
    let store = app::open_store(&config).await?;
    let app = app::start(&config, store, Arc::new(StdoutAuditSink)).await?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app.router.into_make_service()).await?;
    Ok(())
}
