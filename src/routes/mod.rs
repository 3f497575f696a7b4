//! HTTP routing

pub mod cors;
pub mod health;

use axum::{error_handling::HandleErrorLayer, routing::get, BoxError, Router};
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::AppState;

/// All API routes, mounted under `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(crate::pricing::router())
        .route("/health", get(health::health))
}

/// The full application with middleware applied
pub fn app(state: AppState) -> Router {
    let request_timeout = state.config.payment_timeout() * 2;

    Router::new()
        .nest("/api", api_router())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(&state.config))
        .with_state(state)
}

/// Middleware failures still answer with a JSON error body
async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(err.to_string())
    }
}
