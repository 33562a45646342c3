mod config;

use clap::Parser;
use services::{AppServices, Clock, IdGenerator};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let db_url = config.database_url()?;
    let services = AppServices::new_sqlite(&db_url, Clock::default(), IdGenerator::uuid()).await?;
    info!(db = %db_url, "database ready");

    let app = api::router(services).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    if let Err(err) = run(config).await {
        tracing::error!(%err, "server failed");
        std::process::exit(2);
    }
}
