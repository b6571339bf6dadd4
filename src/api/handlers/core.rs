use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::respond::ok;
use crate::api::types::AppState;

async fn health() -> Response {
    ok(json!({ "status": "ok", "time": chrono::Utc::now().to_rfc3339() }))
}

async fn api_root() -> Response {
    ok(json!({
        "name": "Student Performance Dashboard API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/api/health": "Health check",
            "/api/students": "Student management",
            "/api/subjects": "Subject scores and catalogue",
            "/api/overview": "Top performer rankings",
            "/api/distribution": "Pass/fail, grade, attendance and risk distributions",
            "/api/performance": "Department and score comparisons"
        }
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api", get(api_root))
}
