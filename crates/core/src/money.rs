//! Fixed-point money with two fractional digits.
//!
//! Amounts are held as an integer number of cents, so every value has scale 2
//! by construction and arithmetic can never drop a cent. `rust_decimal` is used
//! at the edges: parsing user input, HALF_UP rounding of foreign decimals, and
//! the string form used by serde.

use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Number of fractional digits carried by every [`Money`] value.
pub const SCALE: u32 = 2;

const CENTS_PER_UNIT: i64 = 100;

/// A signed amount of money with exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money {
    cents: i64,
}

impl ValueObject for Money {}

/// Result of [`Money::split`]: an equal floor share plus the cents left over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub share: Money,
    /// Leftover cents, always `< parts`.
    pub remainder_cents: u32,
}

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Build from a sign, a whole part and a cent part, e.g.
    /// `(false, 33, 34)` is `33.34` and `(true, 0, 50)` is `-0.50`.
    ///
    /// `cents` must be below 100.
    pub fn from_parts(negative: bool, units: u64, cents: u8) -> DomainResult<Self> {
        if i64::from(cents) >= CENTS_PER_UNIT {
            return Err(DomainError::validation(format!(
                "fractional part must be below 100 cents (got {cents})"
            )));
        }
        let magnitude = i64::try_from(units)
            .ok()
            .and_then(|u| u.checked_mul(CENTS_PER_UNIT))
            .and_then(|whole| whole.checked_add(i64::from(cents)))
            .ok_or_else(|| DomainError::arithmetic(format!("{units}.{cents:02} overflows money range")))?;
        Ok(Self::from_cents(if negative { -magnitude } else { magnitude }))
    }

    /// Parse a decimal string such as `"90"`, `"90.5"` or `"33.34"`.
    ///
    /// More than two significant fractional digits is rejected rather than
    /// rounded away.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let trimmed = input.trim();
        let decimal = Decimal::from_str(trimmed)
            .map_err(|e| DomainError::validation(format!("invalid amount '{trimmed}': {e}")))?;
        Self::try_from(decimal)
    }

    /// Convert an arbitrary decimal, rounding half away from zero to cents.
    pub fn from_decimal_rounded(value: Decimal) -> DomainResult<Self> {
        Self::try_from(value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    pub const fn cents(&self) -> i64 {
        self.cents
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.cents, SCALE)
    }

    pub const fn is_zero(&self) -> bool {
        self.cents == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.cents > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.cents < 0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.cents
            .checked_add(other.cents)
            .map(Self::from_cents)
            .ok_or_else(|| DomainError::arithmetic(format!("{self} + {other} overflows")))
    }

    pub fn checked_sub(self, other: Money) -> DomainResult<Money> {
        self.cents
            .checked_sub(other.cents)
            .map(Self::from_cents)
            .ok_or_else(|| DomainError::arithmetic(format!("{self} - {other} overflows")))
    }

    pub fn checked_neg(self) -> DomainResult<Money> {
        self.cents
            .checked_neg()
            .map(Self::from_cents)
            .ok_or_else(|| DomainError::arithmetic(format!("-({self}) overflows")))
    }

    /// Sum an iterator of amounts, failing on overflow.
    pub fn try_sum<I>(amounts: I) -> DomainResult<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }

    /// Divide into `parts` equal floor shares.
    ///
    /// `share * parts + remainder_cents == self` always holds; handing out the
    /// remainder is the caller's policy.
    pub fn split(self, parts: u32) -> DomainResult<Split> {
        if parts == 0 {
            return Err(DomainError::invalid_state(
                "cannot split an amount across zero parts",
            ));
        }
        let divisor = i64::from(parts);
        let share = self.cents.div_euclid(divisor);
        let remainder = self.cents.rem_euclid(divisor);
        let remainder_cents = u32::try_from(remainder)
            .map_err(|_| DomainError::arithmetic("split remainder out of range"))?;

        Ok(Split {
            share: Self::from_cents(share),
            remainder_cents,
        })
    }
}

impl TryFrom<Decimal> for Money {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let normalized = value.normalize();
        if normalized.scale() > SCALE {
            return Err(DomainError::validation(format!(
                "amount {value} has more than {SCALE} fractional digits"
            )));
        }
        normalized
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.to_i64())
            .map(Self::from_cents)
            .ok_or_else(|| DomainError::arithmetic(format!("amount {value} is out of range")))
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.to_decimal()
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        let per_unit = CENTS_PER_UNIT.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per_unit, abs % per_unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_accepts_whole_and_fractional_amounts() {
        assert_eq!(Money::parse("90").unwrap().cents(), 9000);
        assert_eq!(Money::parse(" 90.5 ").unwrap().cents(), 9050);
        assert_eq!(Money::parse("33.34").unwrap().cents(), 3334);
        assert_eq!(Money::parse("-0.01").unwrap().cents(), -1);
        // Trailing zeros beyond the scale carry no information.
        assert_eq!(Money::parse("1.500").unwrap().cents(), 150);
    }

    #[test]
    fn parse_rejects_sub_cent_precision_and_garbage() {
        assert!(matches!(Money::parse("1.005"), Err(DomainError::Validation(_))));
        assert!(matches!(Money::parse("ten"), Err(DomainError::Validation(_))));
        assert!(matches!(Money::parse(""), Err(DomainError::Validation(_))));
    }

    #[test]
    fn from_parts_takes_an_explicit_sign() {
        assert_eq!(Money::from_parts(false, 33, 34).unwrap(), Money::from_cents(3334));
        assert_eq!(Money::from_parts(true, 3, 50).unwrap(), Money::from_cents(-350));
        assert_eq!(Money::from_parts(true, 0, 50).unwrap(), Money::from_cents(-50));
        assert_eq!(Money::from_parts(true, 0, 1).unwrap(), Money::parse("-0.01").unwrap());
        assert_eq!(Money::from_parts(true, 0, 0).unwrap(), Money::ZERO);
        assert!(matches!(Money::from_parts(false, 1, 100), Err(DomainError::Validation(_))));
        assert!(matches!(
            Money::from_parts(false, u64::MAX, 0),
            Err(DomainError::Arithmetic(_))
        ));
        assert!(matches!(
            Money::from_parts(true, i64::MAX.unsigned_abs(), 0),
            Err(DomainError::Arithmetic(_))
        ));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(Money::from_decimal_rounded(dec!(1.005)).unwrap().cents(), 101);
        assert_eq!(Money::from_decimal_rounded(dec!(1.004)).unwrap().cents(), 100);
        assert_eq!(Money::from_decimal_rounded(dec!(-1.005)).unwrap().cents(), -101);
    }

    #[test]
    fn display_always_has_two_fraction_digits() {
        assert_eq!(Money::from_cents(9000).to_string(), "90.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-350).to_string(), "-3.50");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn add_and_subtract_preserve_cents() {
        let a = Money::parse("0.10").unwrap();
        let b = Money::parse("0.20").unwrap();
        assert_eq!(a.checked_add(b).unwrap(), Money::parse("0.30").unwrap());
        assert_eq!(a.checked_sub(b).unwrap(), Money::parse("-0.10").unwrap());
        assert!(matches!(
            Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)),
            Err(DomainError::Arithmetic(_))
        ));
    }

    #[test]
    fn split_reports_leftover_cents() {
        let split = Money::parse("100").unwrap().split(3).unwrap();
        assert_eq!(split.share, Money::parse("33.33").unwrap());
        assert_eq!(split.remainder_cents, 1);

        let even = Money::parse("90").unwrap().split(3).unwrap();
        assert_eq!(even.share, Money::parse("30").unwrap());
        assert_eq!(even.remainder_cents, 0);
    }

    #[test]
    fn split_by_zero_is_an_invalid_state() {
        assert!(matches!(
            Money::parse("1").unwrap().split(0),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn serde_uses_decimal_strings() {
        let json = serde_json::to_string(&Money::from_cents(3334)).unwrap();
        assert_eq!(json, "\"33.34\"");
        let back: Money = serde_json::from_str("\"90\"").unwrap();
        assert_eq!(back, Money::from_cents(9000));
        assert!(serde_json::from_str::<Money>("\"0.001\"").is_err());
    }

    proptest! {
        /// Property: share * parts + remainder reconstructs the amount exactly.
        #[test]
        fn split_loses_no_cents(cents in 0i64..1_000_000_000i64, parts in 1u32..500u32) {
            let split = Money::from_cents(cents).split(parts).unwrap();
            prop_assert!(split.remainder_cents < parts);
            let rebuilt = split.share.cents() * i64::from(parts) + i64::from(split.remainder_cents);
            prop_assert_eq!(rebuilt, cents);
        }
    }
}
