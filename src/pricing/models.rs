//! Domain models for stay pricing.
//!
//! These are plain values: the calculator never touches configuration or the
//! clock directly, everything it needs is carried in here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::services::PricingError;

/// Kind of lodging being booked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LodgingType {
    Apartment,
    House,
}

impl LodgingType {
    pub fn as_str(self) -> &'static str {
        match self {
            LodgingType::Apartment => "apartment",
            LodgingType::House => "house",
        }
    }

    /// Parse the wire value. Unknown types are an error.
    pub fn parse(raw: &str) -> Result<Self, PricingError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "apartment" => Ok(LodgingType::Apartment),
            "house" => Ok(LodgingType::House),
            other => Err(PricingError::UnsupportedLodgingType(other.to_string())),
        }
    }
}

/// Which phase of payment is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayMode {
    Deposit,
    Balance,
    Full,
}

impl PayMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PayMode::Deposit => "deposit",
            PayMode::Balance => "balance",
            PayMode::Full => "full",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, PricingError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "deposit" => Ok(PayMode::Deposit),
            "balance" => Ok(PayMode::Balance),
            "full" => Ok(PayMode::Full),
            other => Err(PricingError::UnsupportedPayMode(other.to_string())),
        }
    }
}

/// Seasonal rate override. Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub apt_rate: Decimal,
    pub house_rate: Decimal,
}

impl Season {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && date <= self.valid_to
    }

    pub fn rate_for(&self, lodging: LodgingType) -> Decimal {
        match lodging {
            LodgingType::Apartment => self.apt_rate,
            LodgingType::House => self.house_rate,
        }
    }
}

/// Ordered seasonal overrides; lookup is first match in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateSchedule {
    pub seasons: Vec<Season>,
}

impl RateSchedule {
    pub fn new(seasons: Vec<Season>) -> Self {
        Self { seasons }
    }

    /// First season covering `date`, if any
    pub fn season_for(&self, date: NaiveDate) -> Option<&Season> {
        self.seasons.iter().find(|season| season.contains(date))
    }
}

/// Business-configured tariff constants
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    pub base_rate_apartment: Decimal,
    pub base_rate_house: Decimal,
    pub extra_guest_per_night: Decimal,
    pub cleaning_fee_house: Decimal,
    pub city_tax_per_guest_night: Decimal,
    pub included_occupancy: u32,
    pub last_minute_days: i64,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            base_rate_apartment: dec!(60),
            base_rate_house: dec!(210),
            extra_guest_per_night: dec!(15),
            cleaning_fee_house: dec!(50),
            city_tax_per_guest_night: dec!(1.2),
            included_occupancy: 2,
            last_minute_days: 7,
        }
    }
}

impl Tariff {
    pub fn base_rate(&self, lodging: LodgingType) -> Decimal {
        match lodging {
            LodgingType::Apartment => self.base_rate_apartment,
            LodgingType::House => self.base_rate_house,
        }
    }
}

/// A validated reservation, ready to be priced
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub lodging: LodgingType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub babies: u32,
    pub pay_mode: Option<PayMode>,
}

impl Reservation {
    /// Adults and children; babies stay free
    pub fn paying_guests(&self) -> Result<u32, PricingError> {
        self.adults.checked_add(self.children).ok_or_else(|| {
            PricingError::InvalidGuestCount("too many paying guests".to_string())
        })
    }
}

/// Monetary breakdown of a stay. Amounts are unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub nights: u32,
    pub paying_guests: u32,
    pub extra_guests: u32,
    pub lodging_subtotal: Decimal,
    pub extra_guest_fee: Decimal,
    pub cleaning_fee: Decimal,
    pub city_tax: Decimal,
    pub amount_due: Decimal,
}

impl PriceBreakdown {
    /// Lodging, extra guests and cleaning; everything except city tax
    pub fn lodging_plus(&self) -> Decimal {
        self.lodging_subtotal + self.extra_guest_fee + self.cleaning_fee
    }
}

/// One named, priced component of a charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    pub amount_minor_units: i64,
}

/// Full pricing outcome: breakdown plus the line items payable now
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub breakdown: PriceBreakdown,
    pub pay_mode: PayMode,
    pub last_minute: bool,
    pub line_items: Vec<LineItem>,
}

impl Quote {
    pub fn total_minor_units(&self) -> i64 {
        self.line_items.iter().map(|item| item.amount_minor_units).sum()
    }
}
