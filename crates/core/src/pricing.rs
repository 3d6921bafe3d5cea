//! Cart and order pricing.
//!
//! All storefront totals (cart summary, checkout, persisted orders) go through
//! [`OrderTotals::compute`]:
//!
//! ```text
//! unit price = discount price if present and lower, else list price
//! subtotal   = Σ quantity × unit price
//! discount   = promo code effect on subtotal (capped at subtotal)
//! shipping   = 0 if subtotal ≥ free-shipping threshold, else flat fee
//! total      = subtotal − discount + shipping
//! ```
//!
//! The shipping threshold compares against the pre-discount subtotal. An empty
//! cart has no shipping charge.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, ProductId};

/// Free-shipping threshold used by checkout (₮50,000).
pub const CHECKOUT_FREE_SHIPPING_THRESHOLD: i64 = 50_000;

/// Free-shipping threshold quoted in delivery and cart info copy (₮100,000).
///
/// This differs from [`CHECKOUT_FREE_SHIPPING_THRESHOLD`]; both are kept and
/// exposed so the storefront can show what it has always shown while the
/// computation keeps using the checkout value.
pub const ADVERTISED_FREE_SHIPPING_THRESHOLD: i64 = 100_000;

/// Flat delivery fee charged below the threshold (₮5,000).
pub const FLAT_SHIPPING_FEE: i64 = 5_000;

/// Shipping rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Money,
    /// Threshold shown in informational copy.
    pub advertised_free_shipping_threshold: Money,
    /// Fee charged when the subtotal is below the threshold.
    pub flat_fee: Money,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_units(CHECKOUT_FREE_SHIPPING_THRESHOLD),
            advertised_free_shipping_threshold: Money::from_units(
                ADVERTISED_FREE_SHIPPING_THRESHOLD,
            ),
            flat_fee: Money::from_units(FLAT_SHIPPING_FEE),
        }
    }
}

impl ShippingPolicy {
    /// Shipping charge for a subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal.is_zero() || subtotal >= self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.flat_fee
        }
    }

    /// How much more the customer must add to get free shipping.
    #[must_use]
    pub fn amount_until_free_shipping(&self, subtotal: Money) -> Money {
        self.free_shipping_threshold.saturating_sub(subtotal)
    }
}

/// The price a customer pays for one unit.
///
/// The discount price applies only when present and strictly lower than the
/// list price.
#[must_use]
pub fn unit_price(list_price: Money, discount_price: Option<Money>) -> Money {
    match discount_price {
        Some(discounted) if discounted < list_price => discounted,
        _ => list_price,
    }
}

/// A priced cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    /// Quantity × unit price.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Errors from promo code parsing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PromoCodeError {
    /// The code is not one the shop recognises.
    #[error("invalid promo code: {0}")]
    Unknown(String),
}

/// Promo codes accepted at checkout.
///
/// This is a fixed lookup, not a rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromoCode {
    /// 10 % off the subtotal, rounded to whole units.
    #[serde(rename = "WELCOME10")]
    Welcome10,
    /// ₮5,000 off the subtotal.
    #[serde(rename = "SAVE5000")]
    Save5000,
}

impl PromoCode {
    /// Parse a code as typed by the customer (case and surrounding whitespace
    /// are ignored).
    ///
    /// # Errors
    ///
    /// Returns `PromoCodeError::Unknown` for any other code.
    pub fn parse(code: &str) -> Result<Self, PromoCodeError> {
        match code.trim().to_ascii_uppercase().as_str() {
            "WELCOME10" => Ok(Self::Welcome10),
            "SAVE5000" => Ok(Self::Save5000),
            _ => Err(PromoCodeError::Unknown(code.trim().to_owned())),
        }
    }

    /// Canonical code string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Welcome10 => "WELCOME10",
            Self::Save5000 => "SAVE5000",
        }
    }

    /// Discount for a subtotal, never exceeding it.
    #[must_use]
    pub fn discount(self, subtotal: Money) -> Money {
        let raw = match self {
            Self::Welcome10 => subtotal.scale(Decimal::new(10, 2)).round_units(),
            Self::Save5000 => Money::from_units(5_000),
        };
        raw.min(subtotal)
    }
}

/// Computed totals for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub item_count: u32,
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Compute totals for priced lines.
    #[must_use]
    pub fn compute(
        items: &[LineItem],
        promo: Option<PromoCode>,
        policy: &ShippingPolicy,
    ) -> Self {
        let subtotal: Money = items.iter().map(LineItem::line_total).sum();
        let item_count = items.iter().map(|item| item.quantity).sum();
        let discount = promo.map_or(Money::ZERO, |code| code.discount(subtotal));
        let shipping = policy.shipping_for(subtotal);
        let total = subtotal.saturating_sub(discount) + shipping;

        Self {
            item_count,
            subtotal,
            discount,
            shipping,
            total,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, quantity: u32, unit: i64) -> LineItem {
        LineItem {
            product_id: ProductId::new(id),
            quantity,
            unit_price: Money::from_units(unit),
        }
    }

    #[test]
    fn test_unit_price_uses_lower_discount() {
        let list = Money::from_units(89_000);
        assert_eq!(unit_price(list, Some(Money::from_units(79_000))), Money::from_units(79_000));
        assert_eq!(unit_price(list, Some(Money::from_units(99_000))), list);
        assert_eq!(unit_price(list, Some(list)), list);
        assert_eq!(unit_price(list, None), list);
    }

    #[test]
    fn test_free_shipping_at_or_above_threshold() {
        let policy = ShippingPolicy::default();
        assert_eq!(policy.shipping_for(Money::from_units(50_000)), Money::ZERO);
        assert_eq!(policy.shipping_for(Money::from_units(120_000)), Money::ZERO);
    }

    #[test]
    fn test_flat_fee_below_threshold() {
        let policy = ShippingPolicy::default();
        assert_eq!(
            policy.shipping_for(Money::from_units(49_999)),
            Money::from_units(FLAT_SHIPPING_FEE)
        );
        assert_eq!(
            policy.shipping_for(Money::from_units(1)),
            Money::from_units(FLAT_SHIPPING_FEE)
        );
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let totals = OrderTotals::compute(&[], None, &ShippingPolicy::default());
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, Money::ZERO);
        assert_eq!(totals.item_count, 0);
    }

    #[test]
    fn test_thresholds_differ_between_copy_and_checkout() {
        let policy = ShippingPolicy::default();
        assert_eq!(policy.free_shipping_threshold, Money::from_units(50_000));
        assert_eq!(
            policy.advertised_free_shipping_threshold,
            Money::from_units(100_000)
        );
        // 75k ships free at checkout even though the copy promises 100k.
        assert_eq!(policy.shipping_for(Money::from_units(75_000)), Money::ZERO);
    }

    #[test]
    fn test_amount_until_free_shipping() {
        let policy = ShippingPolicy::default();
        assert_eq!(
            policy.amount_until_free_shipping(Money::from_units(30_000)),
            Money::from_units(20_000)
        );
        assert_eq!(
            policy.amount_until_free_shipping(Money::from_units(60_000)),
            Money::ZERO
        );
    }

    #[test]
    fn test_promo_parse() {
        assert_eq!(PromoCode::parse("WELCOME10").unwrap(), PromoCode::Welcome10);
        assert_eq!(PromoCode::parse(" save5000 ").unwrap(), PromoCode::Save5000);
        assert_eq!(
            PromoCode::parse("FREESHIP"),
            Err(PromoCodeError::Unknown("FREESHIP".to_owned()))
        );
        assert!(PromoCode::parse("").is_err());
    }

    #[test]
    fn test_welcome10_is_ten_percent_rounded() {
        assert_eq!(
            PromoCode::Welcome10.discount(Money::from_units(45_000)),
            Money::from_units(4_500)
        );
        // 10% of 12,345 = 1,234.5 → 1,235
        assert_eq!(
            PromoCode::Welcome10.discount(Money::from_units(12_345)),
            Money::from_units(1_235)
        );
        // 10% of 12,344 = 1,234.4 → 1,234
        assert_eq!(
            PromoCode::Welcome10.discount(Money::from_units(12_344)),
            Money::from_units(1_234)
        );
    }

    #[test]
    fn test_save5000_is_flat_and_capped() {
        assert_eq!(
            PromoCode::Save5000.discount(Money::from_units(80_000)),
            Money::from_units(5_000)
        );
        assert_eq!(
            PromoCode::Save5000.discount(Money::from_units(3_000)),
            Money::from_units(3_000)
        );
    }

    #[test]
    fn test_compute_totals_with_promo_and_shipping() {
        let items = [line(1, 2, 15_000), line(2, 1, 9_000)];
        let totals =
            OrderTotals::compute(&items, Some(PromoCode::Save5000), &ShippingPolicy::default());

        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.subtotal, Money::from_units(39_000));
        assert_eq!(totals.discount, Money::from_units(5_000));
        assert_eq!(totals.shipping, Money::from_units(5_000));
        assert_eq!(totals.total, Money::from_units(39_000));
    }

    #[test]
    fn test_shipping_uses_pre_discount_subtotal() {
        let items = [line(1, 1, 52_000)];
        let totals =
            OrderTotals::compute(&items, Some(PromoCode::Welcome10), &ShippingPolicy::default());

        assert_eq!(totals.discount, Money::from_units(5_200));
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, Money::from_units(46_800));
    }
}
