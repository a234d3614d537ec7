use std::convert::TryFrom;
use std::fmt;

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;

use crate::types::integer::{Int, UInt};

/// Indicates whether the `Coefficient`'s magnitude is less than 0 (negative) or not (positive).
/// When the magnitude is zero, the sign is used to distinguish between positive and negative zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Negative,
    Positive,
}

/// A signed integer that can be used as the coefficient of a [Decimal](crate::Decimal) value.
/// This type does not consider `0` and `-0` to be equal and supports magnitudes of arbitrary
/// size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coefficient {
    pub(crate) sign: Sign,
    pub(crate) magnitude: UInt,
}

impl Coefficient {
    pub(crate) fn new<I: Into<UInt>>(sign: Sign, magnitude: I) -> Coefficient {
        Coefficient {
            sign,
            magnitude: magnitude.into(),
        }
    }

    /// Constructs a new Coefficient with a negative sign and a magnitude of zero.
    pub(crate) fn negative_zero() -> Coefficient {
        Coefficient {
            sign: Sign::Negative,
            magnitude: UInt::U64(0),
        }
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn magnitude(&self) -> &UInt {
        &self.magnitude
    }

    pub fn is_negative_zero(&self) -> bool {
        self.sign == Sign::Negative && self.magnitude.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn number_of_decimal_digits(&self) -> u64 {
        self.magnitude.number_of_decimal_digits()
    }

    /// If the value can fit in an i64, return it as such. This is useful for
    /// inline representations. Returns None for negative zero, which an i64 cannot express.
    pub(crate) fn as_i64(&self) -> Option<i64> {
        match self.magnitude.as_u64() {
            Some(magnitude) => match (magnitude, self.sign) {
                (0, Sign::Negative) => None,
                (_, Sign::Negative) if magnitude <= (i64::MAX as u64) + 1 => {
                    Some((magnitude as i64).wrapping_neg())
                }
                (_, Sign::Positive) if magnitude <= i64::MAX as u64 => Some(magnitude as i64),
                _ => None,
            },
            None => None,
        }
    }
}

impl<I: Into<Int>> From<I> for Coefficient {
    fn from(value: I) -> Self {
        let value: Int = value.into();
        let sign = if value.is_negative() {
            Sign::Negative
        } else {
            Sign::Positive
        };
        Coefficient::new(sign, value.unsigned_abs())
    }
}

impl From<BigUint> for Coefficient {
    fn from(magnitude: BigUint) -> Self {
        Coefficient::new(Sign::Positive, UInt::from(magnitude))
    }
}

/// A BigInt cannot represent negative zero, so this conversion is infallible in the other
/// direction only.
impl TryFrom<&Coefficient> for BigInt {
    type Error = &'static str;

    fn try_from(coefficient: &Coefficient) -> Result<Self, Self::Error> {
        if coefficient.is_negative_zero() {
            return Err("cannot convert negative zero to a BigInt");
        }
        let magnitude: BigUint = coefficient.magnitude.clone().into();
        let mut value = BigInt::from(magnitude);
        if coefficient.sign == Sign::Negative {
            value = -value;
        }
        Ok(value)
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sign == Sign::Negative {
            write!(f, "-")?;
        }
        write!(f, "{}", self.magnitude)
    }
}

impl Zero for Coefficient {
    fn zero() -> Self {
        Coefficient::new(Sign::Positive, 0u64)
    }

    fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }
}

impl std::ops::Add for Coefficient {
    type Output = Coefficient;

    // Zero requires an Add implementation; the decimal APIs never add coefficients of
    // opposite sign, so the mixed-sign case is unreachable here.
    fn add(self, rhs: Self) -> Self::Output {
        match (self.as_i64(), rhs.as_i64()) {
            (Some(this), Some(that)) => Coefficient::from(this + that),
            _ => {
                let this = BigInt::try_from(&self).expect("-0 cannot be added");
                let that = BigInt::try_from(&rhs).expect("-0 cannot be added");
                Coefficient::from(Int::from(this + that))
            }
        }
    }
}
