//! Lodging checkout service.
//!
//! Prices a stay, then opens a hosted checkout session with the payment
//! provider and hands back its redirect URL.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod payments;
pub mod pricing;
pub mod routes;

use std::sync::Arc;

use anyhow::Context;

use cache::SessionCache;
use clock::{Clock, SystemClock};
use config::AppConfig;
use payments::{PaymentSessionService, StripeCheckout};
use pricing::Tariff;

pub use routes::app;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tariff: Arc<Tariff>,
    pub payments: Arc<dyn PaymentSessionService>,
    pub sessions: SessionCache,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Production wiring: Stripe over HTTPS and the host clock
    pub fn build(config: AppConfig) -> anyhow::Result<Self> {
        let stripe = StripeCheckout::new(
            config.stripe_secret_key.clone(),
            &config.stripe_api_base,
            config.payment_timeout(),
        )
        .context("failed to build payment HTTP client")?;

        Ok(Self::with_services(config, Arc::new(stripe), Arc::new(SystemClock)))
    }

    pub fn with_services(
        config: AppConfig,
        payments: Arc<dyn PaymentSessionService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            tariff: Arc::new(Tariff::default()),
            payments,
            sessions: SessionCache::new(),
            clock,
        }
    }
}
