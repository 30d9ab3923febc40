use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::permissions::{ASSETS_MANAGE, ASSETS_READ};
use crate::middleware::{check_permissions, require_auth};
use crate::state::AppState;

const READ_ASSETS: &[&str] = &[ASSETS_READ];
const MANAGE_ASSETS: &[&str] = &[ASSETS_MANAGE];
const AUTH_ONLY: &[&str] = &[];

// Multipart framing allowance on top of the upload policy ceiling.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes(state.clone()))
        // Protected API
        .merge(protected_routes(state))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(public::auth::login))
        .route("/auth/refresh", post(public::auth::refresh))
        .with_state(state)
}

fn protected_routes(state: AppState) -> Router {
    // Each group declares its required permissions; the role gate runs after
    // the token verifier attached the principal.
    let auth_only = Router::new()
        .route("/api/auth/whoami", get(protected::auth::whoami))
        .route(
            "/api/auth/avatar",
            post(protected::auth::upload_avatar).layer(DefaultBodyLimit::max(
                protected::auth::avatar_policy().global_size_limit() + MULTIPART_OVERHEAD,
            )),
        )
        .route_layer(middleware::from_fn(|req, next| {
            check_permissions(AUTH_ONLY, req, next)
        }));

    let read = Router::new()
        .route("/api/assets", get(protected::assets::list))
        .route("/api/assets/:id", get(protected::assets::get))
        .route_layer(middleware::from_fn(|req, next| {
            check_permissions(READ_ASSETS, req, next)
        }));

    let manage = Router::new()
        .route("/api/assets", post(protected::assets::create))
        .route(
            "/api/assets/:id",
            axum::routing::put(protected::assets::update).delete(protected::assets::delete),
        )
        .route(
            "/api/assets/:id/attachments",
            post(protected::assets::upload_attachments).layer(DefaultBodyLimit::max(
                protected::assets::attachment_policy().global_size_limit() + MULTIPART_OVERHEAD,
            )),
        )
        .route_layer(middleware::from_fn(|req, next| {
            check_permissions(MANAGE_ASSETS, req, next)
        }));

    Router::new()
        .merge(auth_only)
        .merge(read)
        .merge(manage)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "AssetDesk API",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/login, /auth/refresh (public - token acquisition)",
                "whoami": "/api/auth/whoami (protected)",
                "avatar": "/api/auth/avatar (protected)",
                "assets": "/api/assets[/:id] (protected)",
                "attachments": "/api/assets/:id/attachments (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
