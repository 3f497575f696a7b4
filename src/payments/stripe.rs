//! Stripe Checkout over plain REST.
//!
//! Sessions are created with a form-encoded `POST /v1/checkout/sessions`;
//! no SDK is involved.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{CheckoutSession, PaymentError, PaymentSessionService};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Stripe Checkout client
#[derive(Debug, Clone)]
pub struct StripeCheckout {
    http_client: Client,
    secret_key: Option<String>,
    api_base: String,
}

impl StripeCheckout {
    pub fn new(
        secret_key: Option<String>,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            secret_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.api_base)
    }
}

/// Flatten a session into Stripe's bracketed form fields
pub fn encode_session_form(session: &CheckoutSession) -> Vec<(String, String)> {
    let currency = session.currency.to_lowercase();
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[]".to_string(), "card".to_string()),
        ("success_url".to_string(), session.success_url.clone()),
        ("cancel_url".to_string(), session.cancel_url.clone()),
    ];

    for (i, item) in session.items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[price_data][currency]"), currency.clone()));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }

    if let Some(email) = session.customer_email.as_deref().filter(|e| !e.is_empty()) {
        form.push(("customer_email".to_string(), email.to_string()));
    }

    for (key, value) in &session.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }

    form
}

#[async_trait]
impl PaymentSessionService for StripeCheckout {
    async fn create_session(&self, session: &CheckoutSession) -> Result<String, PaymentError> {
        let secret_key = self
            .secret_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PaymentError::NotConfigured("STRIPE_SECRET_KEY".to_string()))?;

        let mut request = self
            .http_client
            .post(self.sessions_url())
            .bearer_auth(secret_key)
            .form(&encode_session_form(session));

        if let Some(key) = session.idempotency_key.as_deref() {
            request = request.header("Idempotency-Key", key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "Stripe API request failed");
            PaymentError::Transport(e.to_string())
        })?;

        let status = response.status();
        let resp_body: Value = response
            .json()
            .await
            .unwrap_or(json!({"error": {"message": "failed to parse response"}}));

        if status.is_success() {
            resp_body
                .get("url")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
                .ok_or_else(|| PaymentError::Provider {
                    status: status.as_u16(),
                    message: "Stripe response did not include a session url".to_string(),
                })
        } else {
            let message = resp_body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("Stripe error")
                .to_string();
            tracing::warn!(
                status = status.as_u16(),
                error = %message,
                "Stripe rejected checkout session"
            );
            Err(PaymentError::Provider {
                status: status.as_u16(),
                message,
            })
        }
    }
}
