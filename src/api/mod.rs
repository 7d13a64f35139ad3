//! HTTP surface — Axum router over the stores and the pipeline.

mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{AppState, api_routes};

use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Routes plus middleware: panic capture, request tracing and permissive
/// CORS for the browser front end.
pub fn router(state: AppState) -> Router {
    api_routes(state).layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(error::panic_response))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}
