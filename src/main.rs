use std::path::PathBuf;
use std::sync::Arc;

use assetdesk_api::config;
use assetdesk_api::database::manager::DatabaseManager;
use assetdesk_api::routes::app;
use assetdesk_api::state::AppState;
use assetdesk_api::store::postgres::{PgAssetStore, PgExistenceChecker, PgPrincipalStore};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config::config();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assetdesk_api=debug,tower_http=debug".into()),
        )
        .init();
    tracing::info!("Starting AssetDesk API in {:?} mode", config.environment);

    let pool = DatabaseManager::pool()
        .await
        .unwrap_or_else(|e| panic!("failed to connect database: {}", e))
        .clone();

    let state = AppState {
        principals: Arc::new(PgPrincipalStore::new(pool.clone())),
        assets: Arc::new(PgAssetStore::new(pool.clone())),
        existence: Arc::new(PgExistenceChecker::new(pool)),
        upload_root: PathBuf::from(&config.upload.root_dir),
    };

    let app = app(state);

    // Allow deployments to override port via env
    let port = std::env::var("ASSETDESK_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("AssetDesk API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
