//! Hosted payment session collaborator.
//!
//! Handlers build a `CheckoutSession` from priced line items and hand it to a
//! `PaymentSessionService`, which answers with the provider's redirect URL.

pub mod stripe;

use std::collections::BTreeMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::pricing::models::LineItem;

pub use stripe::StripeCheckout;

/// One item rendered on the checkout page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionItem {
    pub name: String,
    pub unit_amount: i64,
    pub quantity: u32,
}

impl From<&LineItem> for SessionItem {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.name.clone(),
            unit_amount: item.amount_minor_units,
            quantity: 1,
        }
    }
}

/// Everything the provider needs to open a checkout session
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub currency: String,
    pub items: Vec<SessionItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub idempotency_key: Option<String>,
}

impl CheckoutSession {
    /// Hex SHA-256 over every field sent to the provider except the
    /// idempotency key. Two requests replaying one key must agree on it.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let mut field = |value: &str| {
            hasher.update(value.len().to_le_bytes());
            hasher.update(value.as_bytes());
        };

        field(&self.currency);
        for item in &self.items {
            field(&item.name);
            field(&item.unit_amount.to_string());
            field(&item.quantity.to_string());
        }
        field(&self.success_url);
        field(&self.cancel_url);
        field(self.customer_email.as_deref().unwrap_or_default());
        for (key, value) in &self.metadata {
            field(key);
            field(value);
        }

        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

/// Payment provider error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentError {
    /// The provider answered and refused the request
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("Payment provider request failed: {0}")]
    Transport(String),

    #[error("Payment provider is not configured: {0}")]
    NotConfigured(String),
}

#[async_trait]
pub trait PaymentSessionService: Send + Sync {
    /// Create a session and return its redirect URL
    async fn create_session(&self, session: &CheckoutSession) -> Result<String, PaymentError>;
}
