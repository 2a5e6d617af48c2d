use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};

/// Ledger amount in minor units (cents).
///
/// All stored amounts (salaries, withdrawals, running totals) use this
/// fixed-point representation; only accrual intermediates use `Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(pub i64);

impl Money {
    pub const SCALE: i64 = 100; // 2 decimal places
    pub const TARGET_DECIMALS: u32 = 2;

    /// One cent, the rounding tolerance for accrual comparisons.
    pub const CENT: Money = Money(1);

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn as_minor(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, Self::TARGET_DECIMALS)
    }

    /// Rounds to the cent boundary, half-up (ties away from zero).
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let cents = (value * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        cents.to_i64().map(Self)
    }

    pub fn from_scaled_i128(value: i128, scale: u32) -> Option<Self> {
        if scale == Self::TARGET_DECIMALS {
            return i64::try_from(value).ok().map(Self);
        }
        if scale < Self::TARGET_DECIMALS {
            let factor = 10i128.pow(Self::TARGET_DECIMALS - scale);
            let widened = value.checked_mul(factor)?;
            return i64::try_from(widened).ok().map(Self);
        }
        // scale > TARGET_DECIMALS: round half-up at the cent boundary
        let factor = 10i128.pow(scale - Self::TARGET_DECIMALS);
        let div = value / factor; // truncated toward zero
        let rem = value % factor;
        let mut adjusted = div;
        if rem.abs() * 2 >= factor {
            adjusted += if value.is_negative() { -1 } else { 1 };
        }
        i64::try_from(adjusted).ok().map(Self)
    }

    pub fn from_decimal_str(s: &str) -> Option<Self> {
        let s = s.trim();

        if s.is_empty() {
            return None;
        }
        let neg = s.starts_with('-');
        let body = s.trim_start_matches('-');
        let mut parts = body.split('.');
        let int_part = parts.next()?;
        if int_part.is_empty() {
            return None;
        }
        let int_val: i128 = int_part.parse().ok()?;
        let frac_opt = parts.next();
        if parts.next().is_some() {
            return None;
        }
        let (raw, scale) = if let Some(frac) = frac_opt {
            if frac.is_empty() {
                (int_val, 0)
            } else {
                (
                    int_val * 10i128.pow(frac.len() as u32) + frac.parse::<i128>().ok()?,
                    frac.len() as u32,
                )
            }
        } else {
            (int_val, 0)
        };
        let signed = if neg { -raw } else { raw };
        Money::from_scaled_i128(signed, scale)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let minor = self.0;
        let neg = minor < 0;
        let abs = minor.abs();
        let int_part = abs / Self::SCALE;
        let frac_part = abs % Self::SCALE;
        if neg {
            write!(f, "-{}.{:02}", int_part, frac_part)
        } else {
            write!(f, "{}.{:02}", int_part, frac_part)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_decimal_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid Money format: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::Money;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_up_at_the_cent() {
        let v = Money::from_scaled_i128(1_234, 3).unwrap(); // 1.234 -> 1.23
        assert_eq!(format!("{}", v), "1.23");
        let v = Money::from_scaled_i128(1_235, 3).unwrap(); // 1.235 -> 1.24
        assert_eq!(format!("{}", v), "1.24");
        let v = Money::from_scaled_i128(-1_235, 3).unwrap();
        assert_eq!(format!("{}", v), "-1.24");
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!(Money::from_decimal_str("60").unwrap(), Money(6_000));
        assert_eq!(Money::from_decimal_str("60.5").unwrap(), Money(6_050));
        assert_eq!(Money::from_decimal_str("0.005").unwrap(), Money(1));
        assert!(Money::from_decimal_str("").is_none());
        assert!(Money::from_decimal_str("1.2.3").is_none());
    }

    #[test]
    fn decimal_round_trip() {
        let m = Money::from_decimal(dec!(100.005)).unwrap();
        assert_eq!(m, Money(10_001));
        assert_eq!(m.to_decimal(), dec!(100.01));
    }

    #[test]
    fn checked_arithmetic() {
        let a = Money::from_decimal_str("40.00").unwrap();
        let b = Money::from_decimal_str("60.00").unwrap();
        assert_eq!(a.checked_add(b), Some(Money(10_000)));
        assert_eq!(b.checked_sub(a), Some(Money(2_000)));
        assert!(Money(i64::MAX).checked_add(Money::CENT).is_none());
    }
}
