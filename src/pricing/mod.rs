//! Stay pricing engine.
//!
//! Prices apartment and house stays (nightly rates, extra guests, cleaning,
//! city tax) and turns the amount due for a payment phase into line items
//! for the checkout page.

pub mod calculators;
pub mod models;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{round_money, to_minor_units};
pub use models::{
    LineItem, LodgingType, PayMode, PriceBreakdown, Quote, RateSchedule, Season, Tariff,
};
pub use routes::router;
pub use services::{quote_precomputed, quote_reservation, PricingError};
