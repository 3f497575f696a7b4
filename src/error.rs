//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::payments::PaymentError;
use crate::pricing::responses::ErrorResponse;
use crate::pricing::PricingError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Idempotency key already used for a different checkout
    #[error("{0}")]
    Conflict(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Pricing(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Payment(PaymentError::Provider { status, message }) => {
                tracing::error!(provider_status = *status, "Payment provider error: {}", message);
                (StatusCode::BAD_GATEWAY, message.clone())
            }
            AppError::Payment(PaymentError::Transport(e)) => {
                tracing::error!("Payment provider unreachable: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Payment provider unavailable".to_string(),
                )
            }
            AppError::Payment(PaymentError::NotConfigured(what)) => {
                tracing::error!("Payment provider not configured: missing {}", what);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Missing {}", what),
                )
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Timeout => {
                tracing::warn!("Request timed out");
                (StatusCode::GATEWAY_TIMEOUT, self.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let resp = AppError::from(PricingError::InvalidDateRange("x".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::from(PaymentError::Provider {
            status: 400,
            message: "No such price".to_string(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = AppError::from(PaymentError::NotConfigured("STRIPE_SECRET_KEY".to_string()))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = AppError::Configuration("Missing SUCCESS_URL or CANCEL_URL".to_string())
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = AppError::Conflict("reused".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = AppError::Timeout.into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
