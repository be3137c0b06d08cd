//! Volume-tier pricing and cart discount policies.
//!
//! Every product carries four unit prices keyed to a minimum order
//! quantity (1, 10, 50 and 100 units). A line's unit price is the price of
//! the highest tier whose threshold the quantity reaches. Cart-level
//! discounts are applied on top of the summed line totals by a
//! [`DiscountPolicy`].

use serde::{Deserialize, Serialize};

/// Minimum quantity for the 10-unit tier.
const TIER_10_MIN: u32 = 10;
/// Minimum quantity for the 50-unit tier.
const TIER_50_MIN: u32 = 50;
/// Minimum quantity for the 100-unit tier.
const TIER_100_MIN: u32 = 100;

/// Subtotal above which the large-order rate applies.
const LARGE_ORDER_THRESHOLD: f64 = 5000.0;
/// Discount rate for large orders.
const LARGE_ORDER_RATE: f64 = 0.10;
/// Subtotal above which the medium-order rate applies.
const MEDIUM_ORDER_THRESHOLD: f64 = 2000.0;
/// Discount rate for medium orders.
const MEDIUM_ORDER_RATE: f64 = 0.05;

/// Number of lines (and units per line) the ten-by-ten promotion requires.
const TEN_BY_TEN: u32 = 10;
/// Discount rate of the ten-by-ten promotion.
const TEN_BY_TEN_RATE: f64 = 0.10;

/// The four unit prices of a product, one per volume tier.
///
/// Field names match the backend columns so the struct can be flattened
/// into product records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierPrices {
    /// Unit price for 1–9 units.
    pub price_1: f64,
    /// Unit price for 10–49 units.
    pub price_10: f64,
    /// Unit price for 50–99 units.
    pub price_50: f64,
    /// Unit price for 100 or more units.
    pub price_100: f64,
}

impl TierPrices {
    /// Creates a price table from the four tier prices.
    #[inline]
    #[must_use]
    pub const fn new(price_1: f64, price_10: f64, price_50: f64, price_100: f64) -> Self {
        Self {
            price_1,
            price_10,
            price_50,
            price_100,
        }
    }

    /// Returns the unit price of the given tier.
    #[inline]
    #[must_use]
    pub const fn price_for(&self, tier: PriceTier) -> f64 {
        match tier {
            PriceTier::Base => self.price_1,
            PriceTier::Ten => self.price_10,
            PriceTier::Fifty => self.price_50,
            PriceTier::Hundred => self.price_100,
        }
    }

    /// Returns `true` if every price is finite and non-negative.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.as_array()
            .iter()
            .all(|price| price.is_finite() && *price >= 0.0_f64)
    }

    /// Returns `true` if prices never rise as the tier threshold rises.
    #[inline]
    #[must_use]
    pub fn is_non_increasing(&self) -> bool {
        self.price_10 <= self.price_1
            && self.price_50 <= self.price_10
            && self.price_100 <= self.price_50
    }

    /// Prices in ascending tier order.
    const fn as_array(&self) -> [f64; 4] {
        [self.price_1, self.price_10, self.price_50, self.price_100]
    }
}

/// A volume tier, identified by its minimum quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriceTier {
    /// 1–9 units.
    Base,
    /// 10–49 units.
    Ten,
    /// 50–99 units.
    Fifty,
    /// 100 or more units.
    Hundred,
}

impl PriceTier {
    /// Selects the tier for a quantity. Thresholds are inclusive and
    /// checked from the highest down.
    #[inline]
    #[must_use]
    pub const fn for_quantity(quantity: u32) -> Self {
        if quantity >= TIER_100_MIN {
            Self::Hundred
        } else if quantity >= TIER_50_MIN {
            Self::Fifty
        } else if quantity >= TIER_10_MIN {
            Self::Ten
        } else {
            Self::Base
        }
    }

    /// Minimum quantity that selects this tier.
    #[inline]
    #[must_use]
    pub const fn min_quantity(self) -> u32 {
        match self {
            Self::Base => 1,
            Self::Ten => TIER_10_MIN,
            Self::Fifty => TIER_50_MIN,
            Self::Hundred => TIER_100_MIN,
        }
    }
}

/// Returns the unit price that applies when ordering `quantity` units.
///
/// A quantity of zero resolves to the base price; the cart never holds
/// such a line.
#[inline]
#[must_use]
pub const fn resolve_price(prices: &TierPrices, quantity: u32) -> f64 {
    prices.price_for(PriceTier::for_quantity(quantity))
}

/// Returns `resolve_price(prices, quantity) * quantity`.
#[inline]
#[must_use]
pub fn line_total(prices: &TierPrices, quantity: u32) -> f64 {
    resolve_price(prices, quantity) * f64::from(quantity)
}

/// Cart-level discount rule.
///
/// Two incompatible rules exist in the storefront's history; both are
/// available and the caller picks one. [`DiscountPolicy::SubtotalThreshold`]
/// is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscountPolicy {
    /// 10 % above a 5000 subtotal, 5 % above 2000, nothing otherwise.
    #[default]
    SubtotalThreshold,
    /// 10 % when the cart holds exactly ten lines of exactly ten units.
    TenByTen,
    /// Never discount.
    NoDiscount,
}

impl DiscountPolicy {
    /// Computes the discount for a subtotal. `line_quantities` is only
    /// consulted by [`DiscountPolicy::TenByTen`].
    #[must_use]
    pub fn discount<I>(self, subtotal: f64, line_quantities: I) -> f64
    where
        I: IntoIterator<Item = u32>,
    {
        match self {
            Self::SubtotalThreshold => {
                if subtotal > LARGE_ORDER_THRESHOLD {
                    subtotal * LARGE_ORDER_RATE
                } else if subtotal > MEDIUM_ORDER_THRESHOLD {
                    subtotal * MEDIUM_ORDER_RATE
                } else {
                    0.0
                }
            }
            Self::TenByTen => {
                let mut lines = 0_u32;
                let mut all_ten = true;
                for quantity in line_quantities {
                    lines = lines.saturating_add(1);
                    all_ten &= quantity == TEN_BY_TEN;
                }
                if lines == TEN_BY_TEN && all_ten {
                    subtotal * TEN_BY_TEN_RATE
                } else {
                    0.0
                }
            }
            Self::NoDiscount => 0.0,
        }
    }
}

impl core::str::FromStr for DiscountPolicy {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "threshold" | "subtotal-threshold" => Ok(Self::SubtotalThreshold),
            "ten-by-ten" => Ok(Self::TenByTen),
            "none" | "no-discount" => Ok(Self::NoDiscount),
            other => Err(format!(
                "unknown discount policy `{other}` (expected threshold, ten-by-ten or none)"
            )),
        }
    }
}

/// Derived money figures for a set of priced lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingSummary {
    /// Sum of line totals before discount.
    pub subtotal: f64,
    /// Amount taken off the subtotal.
    pub discount: f64,
    /// `subtotal - discount`.
    pub total: f64,
    /// Whether the policy granted a discount.
    pub discount_applied: bool,
}

impl PricingSummary {
    /// Summarizes `(prices, quantity)` lines under the given policy.
    #[must_use]
    pub fn compute<'item, I>(lines: I, policy: DiscountPolicy) -> Self
    where
        I: IntoIterator<Item = (&'item TierPrices, u32)>,
        I::IntoIter: Clone,
    {
        let lines = lines.into_iter();
        let subtotal: f64 = lines
            .clone()
            .map(|(prices, quantity)| line_total(prices, quantity))
            .sum();
        let discount = policy.discount(subtotal, lines.map(|(_, quantity)| quantity));
        Self {
            subtotal,
            discount,
            total: subtotal - discount,
            discount_applied: discount > 0.0_f64,
        }
    }
}
