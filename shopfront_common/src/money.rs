use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const NPR_CURRENCY_CODE: &str = "NPR";
pub const NPR_CURRENCY_CODE_LOWER: &str = "npr";

//--------------------------------------       Money         ---------------------------------------------------------
/// A monetary amount in paisa (minor units of the Nepali rupee).
///
/// All arithmetic happens on integer minor units so that pricing math never picks up floating-point drift.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paisa: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rupees = self.0 / 100;
        let paisa = (self.0 % 100).abs();
        write!(f, "Rs. {rupees}.{paisa:02}")
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    /// Returns `rate` percent of this amount, truncated to whole paisa.
    pub fn percent(&self, rate: i64) -> Self {
        Self(self.0 * rate / 100)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod test {
    use super::Money;

    #[test]
    fn arithmetic_is_in_minor_units() {
        let unit = Money::from(10_000);
        let total = unit * 2 + Money::from(5_000);
        assert_eq!(total, Money::from(25_000));
        assert_eq!(total.percent(13), Money::from(3_250));
    }

    #[test]
    fn sum_of_line_totals() {
        let items = vec![Money::from(100), Money::from(250), Money::from(50)];
        let subtotal: Money = items.into_iter().sum();
        assert_eq!(subtotal, Money::from(400));
    }

    #[test]
    fn display_formats_rupees() {
        assert_eq!(Money::from(123_45).to_string(), "Rs. 123.45");
        assert_eq!(Money::from_rupees(7).to_string(), "Rs. 7.00");
    }
}
