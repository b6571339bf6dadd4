use axum::http::Request;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::types::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::core::routes())
        .merge(handlers::students::routes())
        .merge(handlers::subjects::routes())
        .merge(handlers::overview::routes())
        .merge(handlers::distribution::routes())
        .merge(handlers::performance::routes())
        .fallback(handlers::core::not_found)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                tracing::info_span!(
                    "request",
                    id = %uuid::Uuid::new_v4(),
                    method = %req.method(),
                    uri = %req.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
}
