use std::sync::Arc;

use clap::Parser;
use pr_reviewer_lib::api::{self, AppState};
use pr_reviewer_lib::config::Config;
use pr_reviewer_lib::services::{Services, ThreadRandom};
use pr_reviewer_lib::store::Stores;
use pr_reviewer_lib::{db, server};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    log::info!("[main] Opening database {}", config.database.display());
    let pool = db::initialize(&config.database).await?;

    let services = Services::new(Stores::sqlite(pool.clone()), Arc::new(ThreadRandom));
    let app = api::router(AppState::new(services, config.request_timeout()));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    let cancel = CancellationToken::new();
    tokio::spawn(server::shutdown_on_ctrl_c(cancel.clone()));

    server::serve(listener, app, cancel, config.shutdown_timeout()).await?;

    pool.close().await;
    log::info!("[main] Database closed");
    Ok(())
}
