//! Response DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculators::round_money;
use super::models::{LineItem, Quote};

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount: round_money(amount, 2),
            currency: currency.to_string(),
        }
    }
}

/// Response for a price quote
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub nights: u32,
    pub paying_guests: u32,
    pub extra_guests: u32,
    pub lodging_subtotal: MoneyResponse,
    pub extra_guest_fee: MoneyResponse,
    pub cleaning_fee: MoneyResponse,
    pub city_tax: MoneyResponse,
    pub amount_due: MoneyResponse,
    pub pay_mode: String,
    pub last_minute: bool,
    pub line_items: Vec<LineItem>,
    pub total_minor_units: i64,
}

impl QuoteResponse {
    pub fn from_quote(quote: &Quote, currency: &str) -> Self {
        let b = &quote.breakdown;
        Self {
            nights: b.nights,
            paying_guests: b.paying_guests,
            extra_guests: b.extra_guests,
            lodging_subtotal: MoneyResponse::new(b.lodging_subtotal, currency),
            extra_guest_fee: MoneyResponse::new(b.extra_guest_fee, currency),
            cleaning_fee: MoneyResponse::new(b.cleaning_fee, currency),
            city_tax: MoneyResponse::new(b.city_tax, currency),
            amount_due: MoneyResponse::new(b.amount_due, currency),
            pay_mode: quote.pay_mode.as_str().to_string(),
            last_minute: quote.last_minute,
            line_items: quote.line_items.clone(),
            total_minor_units: quote.total_minor_units(),
        }
    }
}

/// Response carrying the hosted checkout redirect
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub url: String,
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
