//! Request DTOs for pricing API endpoints.
//!
//! Field names follow the booking form (camelCase). Raw values are kept loose
//! here and validated when converted into domain types, so bad input maps to
//! a pricing error instead of a deserialization rejection.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::calculators::{check_nights, MAX_GUESTS};
use super::models::{LodgingType, PayMode, Reservation};
use super::services::{PrecomputedStay, PricingError};

/// Reservation sent by the booking form
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    #[serde(default = "default_lodging")]
    pub lodging_type: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default = "default_adults")]
    pub adults: i64,
    #[serde(default)]
    pub children: i64,
    #[serde(default)]
    pub babies: i64,
    #[serde(default)]
    pub pay_mode: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

fn default_lodging() -> String {
    "apartment".to_string()
}

fn default_adults() -> i64 {
    2
}

fn default_pay_mode() -> String {
    "deposit".to_string()
}

fn default_description() -> String {
    "Acompte réservation".to_string()
}

impl ReservationRequest {
    /// Validate and convert into a `Reservation`
    pub fn to_reservation(&self) -> Result<Reservation, PricingError> {
        let lodging = LodgingType::parse(&self.lodging_type)?;
        let start_date = parse_date("startDate", self.start_date.as_deref())?;
        let end_date = parse_date("endDate", self.end_date.as_deref())?;

        let pay_mode = match self.pay_mode.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(PayMode::parse(raw)?),
        };

        Ok(Reservation {
            lodging,
            start_date,
            end_date,
            adults: guest_count("adults", self.adults)?,
            children: guest_count("children", self.children)?,
            babies: guest_count("babies", self.babies)?,
            pay_mode,
        })
    }
}

/// Stay with nights, extra guests and city tax already worked out
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecomputedRequest {
    pub lodging: String,
    pub nights: i64,
    #[serde(default)]
    pub extra_guests: i64,
    #[serde(default)]
    pub city_tax_total: Decimal,
    #[serde(default = "default_pay_mode")]
    pub pay_mode: String,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl PrecomputedRequest {
    pub fn to_stay(&self) -> Result<PrecomputedStay, PricingError> {
        Ok(PrecomputedStay {
            lodging: LodgingType::parse(&self.lodging)?,
            nights: check_nights(self.nights)?,
            extra_guests: guest_count("extraGuests", self.extra_guests)?,
            city_tax_total: self.city_tax_total,
            pay_mode: PayMode::parse(&self.pay_mode)?,
        })
    }
}

/// Direct checkout for an amount computed by the caller
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectCheckoutRequest {
    #[serde(default)]
    pub amount_to_pay: Option<Decimal>,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl DirectCheckoutRequest {
    /// The amount to charge, which must be strictly positive
    pub fn amount(&self) -> Result<Decimal, PricingError> {
        match self.amount_to_pay {
            Some(amount) if amount > Decimal::ZERO => Ok(amount),
            Some(amount) => Err(PricingError::InvalidAmount(format!(
                "amountToPay must be positive, got {}",
                amount
            ))),
            None => Err(PricingError::InvalidAmount("amountToPay is required".to_string())),
        }
    }
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<NaiveDate, PricingError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| PricingError::InvalidDateRange(format!("{} is required", field)))?;

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        PricingError::InvalidDateRange(format!("{} '{}' is not a YYYY-MM-DD date", field, raw))
    })
}

fn guest_count(field: &str, value: i64) -> Result<u32, PricingError> {
    u32::try_from(value)
        .ok()
        .filter(|count| *count <= MAX_GUESTS)
        .ok_or_else(|| {
            PricingError::InvalidGuestCount(format!(
                "{} must be between 0 and {}, got {}",
                field, MAX_GUESTS, value
            ))
        })
}
