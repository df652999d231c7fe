use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keepsy_server::config::AppConfig;
use keepsy_server::database::init_db;
use keepsy_server::repository::{SeaOrmBillRepository, SeaOrmUserResolver};
use keepsy_server::service::BillService;
use keepsy_server::state::AppState;
use keepsy_server::storage::build_storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    let storage = build_storage(&config.storage)
        .await
        .context("Failed to initialize storage")?;

    let bills = BillService::new(
        Arc::new(SeaOrmBillRepository::new(db.clone())),
        Arc::new(SeaOrmUserResolver::new(db)),
        storage,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        bills: Arc::new(bills),
        config,
    };
    let app = keepsy_server::build_router(state);

    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
