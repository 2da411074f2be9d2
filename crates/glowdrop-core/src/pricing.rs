//! Fee quoting for a vendor and cart.
//!
//! A [`FeeQuote`] is the authorization hold placed on the customer's payment
//! method before a runner shops the order. It is not the final charge:
//! settlement reconciles against actual shelf prices after fulfillment.
//!
//! Amounts are exact decimals; nothing is rounded until [`FeeQuote::rounded`].

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vendors::{PricingTier, RankedVendor, Vendor};

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("cart line {line}: quantity must be a positive integer, got {quantity}")]
    InvalidQuantity { line: usize, quantity: i64 },

    #[error("cart line {line}: unit price must be non-negative, got {price}")]
    InvalidUnitPrice { line: usize, price: Decimal },

    #[error("distance must be a finite non-negative number of miles, got {0}")]
    InvalidDistance(f64),

    #[error("price range must satisfy 0 <= min <= max, got {min}..{max}")]
    InvalidPriceRange { min: Decimal, max: Decimal },

    #[error("amount overflowed while computing {0}")]
    Overflow(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Upper bound of the product's price range.
    pub unit_price_high: Decimal,
    pub quantity: i64,
}

/// Fee constants. `Default` carries the production schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub runner_base_fee: Decimal,
    pub runner_fee_per_mile: Decimal,
    pub service_base_fee: Decimal,
    pub service_fee_rate: Decimal,
    pub urgency_surcharge: Decimal,
    /// Vendors strictly faster than this carry the urgency surcharge.
    pub urgency_velocity_threshold_minutes: u32,
    pub premium_display_markup: Decimal,
    pub economy_display_discount: Decimal,
    pub fast_display_markup: Decimal,
    pub fast_display_threshold_minutes: u32,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            runner_base_fee: Decimal::new(499, 2),
            runner_fee_per_mile: Decimal::new(75, 2),
            service_base_fee: Decimal::new(299, 2),
            service_fee_rate: Decimal::new(8, 2),
            urgency_surcharge: Decimal::new(250, 2),
            urgency_velocity_threshold_minutes: 10,
            premium_display_markup: Decimal::new(15, 2),
            economy_display_discount: Decimal::new(10, 2),
            fast_display_markup: Decimal::new(5, 2),
            fast_display_threshold_minutes: 15,
        }
    }
}

/// The vendor attributes a quote depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuoteTarget {
    /// Unknown distance is billed as zero miles.
    pub distance_miles: Option<f64>,
    pub velocity_minutes: Option<u32>,
}

impl From<&RankedVendor> for QuoteTarget {
    fn from(ranked: &RankedVendor) -> Self {
        Self {
            distance_miles: Some(ranked.distance_miles),
            velocity_minutes: ranked.vendor.velocity_minutes,
        }
    }
}

impl From<&Vendor> for QuoteTarget {
    fn from(vendor: &Vendor) -> Self {
        Self {
            distance_miles: None,
            velocity_minutes: vendor.velocity_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeQuote {
    pub shelf_price_estimate: Decimal,
    pub runner_fee: Decimal,
    pub service_fee: Decimal,
    pub urgency_surcharge: Decimal,
    pub authorization_hold_total: Decimal,
}

impl FeeQuote {
    /// Round every component to cents for display. The total is rounded from
    /// the exact total, so it may differ by a cent from the sum of the rounded
    /// components.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            shelf_price_estimate: to_cents(self.shelf_price_estimate),
            runner_fee: to_cents(self.runner_fee),
            service_fee: to_cents(self.service_fee),
            urgency_surcharge: to_cents(self.urgency_surcharge),
            authorization_hold_total: to_cents(self.authorization_hold_total),
        }
    }
}

fn to_cents(amount: Decimal) -> Decimal {
    let mut cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents
}

fn distance_as_decimal(distance_miles: Option<f64>) -> Result<Decimal, PricingError> {
    match distance_miles {
        None => Ok(Decimal::ZERO),
        Some(d) if !d.is_finite() || d < 0.0 => Err(PricingError::InvalidDistance(d)),
        Some(d) => Decimal::from_f64(d).ok_or(PricingError::InvalidDistance(d)),
    }
}

/// Compute the authorization hold for `lines` at `target`.
///
/// # Errors
///
/// Returns [`PricingError`] for a non-positive quantity, a negative unit
/// price, a negative or non-finite distance, or arithmetic overflow.
pub fn quote(
    lines: &[CartLine],
    target: &QuoteTarget,
    schedule: &FeeSchedule,
) -> Result<FeeQuote, PricingError> {
    let mut shelf_price_estimate = Decimal::ZERO;
    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if line.quantity <= 0 {
            return Err(PricingError::InvalidQuantity {
                line: line_no,
                quantity: line.quantity,
            });
        }
        if line.unit_price_high < Decimal::ZERO {
            return Err(PricingError::InvalidUnitPrice {
                line: line_no,
                price: line.unit_price_high,
            });
        }
        let extended = line
            .unit_price_high
            .checked_mul(Decimal::from(line.quantity))
            .ok_or(PricingError::Overflow("shelf price estimate"))?;
        shelf_price_estimate = shelf_price_estimate
            .checked_add(extended)
            .ok_or(PricingError::Overflow("shelf price estimate"))?;
    }

    let distance = distance_as_decimal(target.distance_miles)?;
    let runner_fee = distance
        .checked_mul(schedule.runner_fee_per_mile)
        .and_then(|d| d.checked_add(schedule.runner_base_fee))
        .ok_or(PricingError::Overflow("runner fee"))?;

    let service_fee = shelf_price_estimate
        .checked_mul(schedule.service_fee_rate)
        .and_then(|d| d.checked_add(schedule.service_base_fee))
        .ok_or(PricingError::Overflow("service fee"))?;

    let urgency_surcharge = match target.velocity_minutes {
        Some(minutes) if minutes < schedule.urgency_velocity_threshold_minutes => {
            schedule.urgency_surcharge
        }
        _ => Decimal::ZERO,
    };

    let authorization_hold_total = [runner_fee, service_fee, urgency_surcharge]
        .into_iter()
        .try_fold(shelf_price_estimate, Decimal::checked_add)
        .ok_or(PricingError::Overflow("authorization hold total"))?;

    Ok(FeeQuote {
        shelf_price_estimate,
        runner_fee,
        service_fee,
        urgency_surcharge,
        authorization_hold_total,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            min: to_cents(self.min),
            max: to_cents(self.max),
        }
    }
}

/// Per-vendor display range for a single item.
///
/// Display only: [`quote`] always uses the unadjusted upper bound.
///
/// # Errors
///
/// Returns [`PricingError::InvalidPriceRange`] when the range is negative or
/// inverted.
pub fn display_price_range(
    range: PriceRange,
    tier: PricingTier,
    velocity_minutes: Option<u32>,
    schedule: &FeeSchedule,
) -> Result<PriceRange, PricingError> {
    if range.min < Decimal::ZERO || range.min > range.max {
        return Err(PricingError::InvalidPriceRange {
            min: range.min,
            max: range.max,
        });
    }

    let mut multiplier = Decimal::ONE;
    match tier {
        PricingTier::Premium => multiplier += schedule.premium_display_markup,
        PricingTier::Economy => multiplier -= schedule.economy_display_discount,
        PricingTier::Standard => {}
    }
    if velocity_minutes.is_some_and(|m| m < schedule.fast_display_threshold_minutes) {
        multiplier += schedule.fast_display_markup;
    }

    let scale = |amount: Decimal| {
        amount
            .checked_mul(multiplier)
            .ok_or(PricingError::Overflow("display price"))
    };

    Ok(PriceRange {
        min: scale(range.min)?,
        max: scale(range.max)?,
    })
}
