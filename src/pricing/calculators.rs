//! Core pricing calculation functions.
//!
//! Pure functions for stay pricing math - no I/O, no clock.
//! Amounts stay unrounded until they become line items.

use chrono::{Days, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::models::{LineItem, LodgingType, PayMode, PriceBreakdown, RateSchedule, Tariff};
use super::services::PricingError;

pub const LABEL_DEPOSIT: &str = "Acompte 50% (hébergement+ménage)";
pub const LABEL_BALANCE: &str = "Solde 50% (hébergement+ménage)";
pub const LABEL_LODGING: &str = "Hébergement";
pub const LABEL_LODGING_LAST_MINUTE: &str = "Hébergement (100% last minute)";
pub const LABEL_CITY_TAX: &str = "Taxe de séjour";

/// Longest stay that can be booked in one reservation
pub const MAX_NIGHTS: u32 = 365;
/// Most guests of one kind a reservation may carry
pub const MAX_GUESTS: u32 = 100;

/// Round to specified decimal places, halves away from zero.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use lodging_checkout::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(3));
/// assert_eq!(round_money(dec!(-2.5), 0), dec!(-3));
/// assert_eq!(round_money(dec!(1.005), 2), dec!(1.01));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a major-unit amount to integer cents.
///
/// Fails with `InvalidAmount` when the cents do not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, PricingError> {
    round_money(amount, 2)
        .checked_mul(dec!(100))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| PricingError::InvalidAmount("amount too large".to_string()))
}

/// Number of nights between arrival and departure.
///
/// Fails with `InvalidDateRange` unless departure is strictly after arrival
/// and the stay is at most `MAX_NIGHTS` long.
pub fn count_nights(start: NaiveDate, end: NaiveDate) -> Result<u32, PricingError> {
    let nights = (end - start).num_days();
    if nights <= 0 {
        return Err(PricingError::InvalidDateRange(format!(
            "end date {} must be after start date {}",
            end, start
        )));
    }
    check_nights(nights)
}

/// Accept a night count in `1..=MAX_NIGHTS`
pub fn check_nights(nights: i64) -> Result<u32, PricingError> {
    u32::try_from(nights)
        .ok()
        .filter(|n| (1..=MAX_NIGHTS).contains(n))
        .ok_or_else(|| {
            PricingError::InvalidDateRange(format!(
                "stay must be between 1 and {} nights, got {}",
                MAX_NIGHTS, nights
            ))
        })
}

/// Whole days from `today` until arrival (negative when arrival is past)
pub fn days_until(start: NaiveDate, today: NaiveDate) -> i64 {
    (start - today).num_days()
}

pub fn is_last_minute(start: NaiveDate, today: NaiveDate, tariff: &Tariff) -> bool {
    days_until(start, today) <= tariff.last_minute_days
}

/// Rate for one night: first matching season, else the base rate
pub fn nightly_rate(
    date: NaiveDate,
    lodging: LodgingType,
    schedule: &RateSchedule,
    tariff: &Tariff,
) -> Decimal {
    schedule
        .season_for(date)
        .map(|season| season.rate_for(lodging))
        .unwrap_or_else(|| tariff.base_rate(lodging))
}

/// Sum of nightly rates over `nights` nights starting at `start`
pub fn lodging_subtotal(
    start: NaiveDate,
    nights: u32,
    lodging: LodgingType,
    schedule: &RateSchedule,
    tariff: &Tariff,
) -> Decimal {
    (0..nights)
        .filter_map(|offset| start.checked_add_days(Days::new(u64::from(offset))))
        .map(|night| nightly_rate(night, lodging, schedule, tariff))
        .sum()
}

/// Paying guests beyond the included occupancy
pub fn extra_guests(paying_guests: u32, tariff: &Tariff) -> u32 {
    paying_guests.saturating_sub(tariff.included_occupancy)
}

pub fn extra_guest_fee(extra_guests: u32, nights: u32, tariff: &Tariff) -> Decimal {
    Decimal::from(extra_guests) * tariff.extra_guest_per_night * Decimal::from(nights)
}

pub fn cleaning_fee(lodging: LodgingType, tariff: &Tariff) -> Decimal {
    match lodging {
        LodgingType::House => tariff.cleaning_fee_house,
        LodgingType::Apartment => Decimal::ZERO,
    }
}

pub fn city_tax(paying_guests: u32, nights: u32, tariff: &Tariff) -> Decimal {
    tariff.city_tax_per_guest_night * Decimal::from(paying_guests) * Decimal::from(nights)
}

/// Amount payable now for the given phase.
///
/// Deposit is half of lodging (city tax deferred); balance is the other half
/// plus city tax; full is everything.
pub fn payable_amount(breakdown: &PriceBreakdown, pay_mode: PayMode) -> Decimal {
    let lodging_plus = breakdown.lodging_plus();
    match pay_mode {
        PayMode::Deposit => dec!(0.5) * lodging_plus,
        PayMode::Balance => dec!(0.5) * lodging_plus + breakdown.city_tax,
        PayMode::Full => lodging_plus + breakdown.city_tax,
    }
}

/// Build the line items presented for payment.
///
/// Each item is rounded to cents on its own; items that round to zero or less
/// are dropped.
pub fn build_line_items(
    breakdown: &PriceBreakdown,
    pay_mode: PayMode,
    last_minute: bool,
) -> Result<Vec<LineItem>, PricingError> {
    let lodging_plus = breakdown.lodging_plus();
    let half = dec!(0.5) * lodging_plus;

    let raw: Vec<(&str, Decimal)> = match (pay_mode, last_minute) {
        (PayMode::Full, true) => vec![
            (LABEL_LODGING_LAST_MINUTE, lodging_plus),
            (LABEL_CITY_TAX, breakdown.city_tax),
        ],
        (PayMode::Full, false) => vec![
            (LABEL_LODGING, lodging_plus),
            (LABEL_CITY_TAX, breakdown.city_tax),
        ],
        (PayMode::Deposit, _) => vec![(LABEL_DEPOSIT, half)],
        (PayMode::Balance, _) => vec![
            (LABEL_BALANCE, half),
            (LABEL_CITY_TAX, breakdown.city_tax),
        ],
    };

    let mut items = Vec::with_capacity(raw.len());
    for (name, amount) in raw {
        let amount_minor_units = to_minor_units(amount)?;
        if amount_minor_units > 0 {
            items.push(LineItem {
                name: name.to_string(),
                amount_minor_units,
            });
        }
    }
    Ok(items)
}
