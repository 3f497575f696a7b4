//! Pricing service functions.
//!
//! Combine the calculators into a full quote for a reservation. Callers pass
//! in `today` and the rate schedule; nothing here reads a clock or the
//! environment.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::calculators::{
    build_line_items, check_nights, city_tax, cleaning_fee, count_nights, extra_guest_fee,
    extra_guests, is_last_minute, lodging_subtotal, payable_amount, to_minor_units, MAX_GUESTS,
};
use super::models::{
    LodgingType, PayMode, PriceBreakdown, Quote, RateSchedule, Reservation, Tariff,
};

/// Pricing calculation error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid dates: {0}")]
    InvalidDateRange(String),

    #[error("Invalid guest count: {0}")]
    InvalidGuestCount(String),

    #[error("Unsupported lodging type '{0}'")]
    UnsupportedLodgingType(String),

    #[error("Unsupported pay mode '{0}'")]
    UnsupportedPayMode(String),

    #[error("Bad amount: {0}")]
    InvalidAmount(String),
}

/// Stay figures supplied by a caller that has already worked them out
#[derive(Debug, Clone, PartialEq)]
pub struct PrecomputedStay {
    pub lodging: LodgingType,
    pub nights: u32,
    pub extra_guests: u32,
    pub city_tax_total: Decimal,
    pub pay_mode: PayMode,
}

/// Price a reservation.
///
/// When no pay mode is given, a last-minute stay is charged in full (lodging
/// then city tax) and any other stay takes the deposit. An explicit pay mode
/// always wins.
pub fn quote_reservation(
    reservation: &Reservation,
    today: NaiveDate,
    schedule: &RateSchedule,
    tariff: &Tariff,
) -> Result<Quote, PricingError> {
    let nights = count_nights(reservation.start_date, reservation.end_date)?;

    let paying_guests = reservation.paying_guests()?;
    let extra = extra_guests(paying_guests, tariff);

    let mut breakdown = PriceBreakdown {
        nights,
        paying_guests,
        extra_guests: extra,
        lodging_subtotal: lodging_subtotal(
            reservation.start_date,
            nights,
            reservation.lodging,
            schedule,
            tariff,
        ),
        extra_guest_fee: extra_guest_fee(extra, nights, tariff),
        cleaning_fee: cleaning_fee(reservation.lodging, tariff),
        city_tax: city_tax(paying_guests, nights, tariff),
        amount_due: Decimal::ZERO,
    };

    let last_minute = is_last_minute(reservation.start_date, today, tariff);
    let (pay_mode, charged_as_last_minute) = match reservation.pay_mode {
        Some(mode) => (mode, false),
        None if last_minute => (PayMode::Full, true),
        None => (PayMode::Deposit, false),
    };

    breakdown.amount_due = payable_amount(&breakdown, pay_mode);
    let line_items = build_line_items(&breakdown, pay_mode, charged_as_last_minute)?;

    tracing::debug!(
        lodging = reservation.lodging.as_str(),
        nights,
        paying_guests,
        pay_mode = pay_mode.as_str(),
        last_minute,
        amount_due = %breakdown.amount_due,
        "Priced reservation"
    );

    Ok(Quote {
        breakdown,
        pay_mode,
        last_minute,
        line_items,
    })
}

/// Price a stay from precomputed nights, extra guests and city tax.
///
/// Base rates only; the caller owns last-minute handling.
pub fn quote_precomputed(stay: &PrecomputedStay, tariff: &Tariff) -> Result<Quote, PricingError> {
    let nights = check_nights(i64::from(stay.nights))?;
    if stay.extra_guests > MAX_GUESTS {
        return Err(PricingError::InvalidGuestCount(format!(
            "extraGuests must be at most {}, got {}",
            MAX_GUESTS, stay.extra_guests
        )));
    }
    if stay.city_tax_total.is_sign_negative() {
        return Err(PricingError::InvalidAmount(
            "cityTaxTotal must not be negative".to_string(),
        ));
    }
    to_minor_units(stay.city_tax_total)?;

    let paying_guests = tariff
        .included_occupancy
        .checked_add(stay.extra_guests)
        .ok_or_else(|| PricingError::InvalidGuestCount("too many paying guests".to_string()))?;

    let mut breakdown = PriceBreakdown {
        nights,
        paying_guests,
        extra_guests: stay.extra_guests,
        lodging_subtotal: tariff.base_rate(stay.lodging) * Decimal::from(nights),
        extra_guest_fee: extra_guest_fee(stay.extra_guests, nights, tariff),
        cleaning_fee: cleaning_fee(stay.lodging, tariff),
        city_tax: stay.city_tax_total,
        amount_due: Decimal::ZERO,
    };

    breakdown.amount_due = payable_amount(&breakdown, stay.pay_mode);
    let line_items = build_line_items(&breakdown, stay.pay_mode, false)?;

    Ok(Quote {
        breakdown,
        pay_mode: stay.pay_mode,
        last_minute: false,
        line_items,
    })
}
