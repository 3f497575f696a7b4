use axum::http::header::{HeaderName, CONTENT_TYPE};
use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;

pub fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("idempotency-key")]);

    if config
        .allowed_origins
        .iter()
        .any(|origin| origin.trim() == "*")
    {
        layer.allow_origin(Any)
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect::<Vec<_>>();
        layer.allow_origin(origins)
    }
}
