//! Money in the store currency.
//!
//! The shop sells in Mongolian tögrög (MNT, `₮`). Prices are stored as
//! `NUMERIC(12,2)` but all customer-facing amounts are whole tögrög, so
//! arithmetic keeps full decimal precision and [`Money::round_units`] is
//! applied where a rule says "rounded".

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
}

/// A non-negative amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// ISO 4217 code of the store currency.
    pub const CURRENCY_CODE: &'static str = "MNT";

    /// Currency symbol used when formatting.
    pub const SYMBOL: &'static str = "₮";

    /// Zero tögrög.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a money amount from a decimal.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount))
    }

    /// Create a money amount from whole currency units.
    ///
    /// Negative input is clamped to zero.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units.max(0)))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Round to whole currency units, halves away from zero.
    #[must_use]
    pub fn round_units(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Subtract, clamping at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// Multiply by a fraction expressed as a decimal (e.g. `0.10`).
    ///
    /// Negative factors yield zero.
    #[must_use]
    pub fn scale(self, factor: Decimal) -> Self {
        if factor.is_sign_negative() {
            return Self::ZERO;
        }
        Self(self.0 * factor)
    }

    /// The smaller of two amounts.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 { self } else { other }
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    /// Formats as `₮12,500` (whole units, thousands separated).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.round_units().0.trunc().to_string();
        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, c) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "{}{grouped}", Self::SYMBOL)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Money::new(Decimal::from(-1)), Err(MoneyError::Negative));
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_round_units_half_away_from_zero() {
        let m = Money::new(Decimal::new(12_345, 1)).unwrap(); // 1234.5
        assert_eq!(m.round_units(), Money::from_units(1235));
        let m = Money::new(Decimal::new(12_344, 1)).unwrap(); // 1234.4
        assert_eq!(m.round_units(), Money::from_units(1234));
    }

    #[test]
    fn test_saturating_sub() {
        let a = Money::from_units(3_000);
        let b = Money::from_units(5_000);
        assert_eq!(a.saturating_sub(b), Money::ZERO);
        assert_eq!(b.saturating_sub(a), Money::from_units(2_000));
    }

    #[test]
    fn test_mul_and_sum() {
        let total: Money = [Money::from_units(1_500) * 2, Money::from_units(700)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_units(3_700));
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_units(0).to_string(), "₮0");
        assert_eq!(Money::from_units(950).to_string(), "₮950");
        assert_eq!(Money::from_units(12_500).to_string(), "₮12,500");
        assert_eq!(Money::from_units(1_250_000).to_string(), "₮1,250,000");
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Money>("\"-5\"").is_err());
        let m: Money = serde_json::from_str("\"4990\"").unwrap();
        assert_eq!(m, Money::from_units(4_990));
    }
}
