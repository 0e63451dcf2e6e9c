//! Rutas HTTP
//!
//! `create_router` arma la API completa con sus capas (trace, compresión, CORS).

pub mod bike_routes;
pub mod report_routes;
pub mod search_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::cors_layer;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/bikes", bike_routes::create_bike_router())
        .nest("/api/search", search_routes::create_search_router())
        .nest("/api/reports", report_routes::create_reports_router())
        .nest("/api/report-sessions", report_routes::create_session_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
