use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigUint;

use crate::ion_eq::IonEq;
use crate::types::coefficient::{Coefficient, Sign};
use crate::types::integer::UInt;

/// An arbitrary-precision Decimal type with a distinct representation of negative zero.
/// The value of a Decimal is `coefficient * 10^exponent`; the coefficient's digits and the
/// exponent are preserved exactly, so `0.100` and `0.1` are mathematically equal but
/// not Ion-equivalent.
#[derive(Clone, Debug)]
pub struct Decimal {
    // A Coefficient is a Sign/UInt pair supporting +0 and -0
    pub(crate) coefficient: Coefficient,
    pub(crate) exponent: i64,
}

impl Decimal {
    /// Constructs a new Decimal with the provided components. The value of the decimal is
    ///    (coefficient * 10^exponent) * (if sign == Sign::Negative { -1 } else { 1 })
    pub fn new<I: Into<Coefficient>>(coefficient: I, exponent: i64) -> Decimal {
        let coefficient = coefficient.into();
        Decimal {
            coefficient,
            exponent,
        }
    }

    /// Constructs a new Decimal with a coefficient of `-0` and an exponent of zero.
    pub fn negative_zero() -> Decimal {
        Decimal::negative_zero_with_exponent(0)
    }

    /// Constructs a new Decimal with a coefficient of `-0` and the specified exponent.
    pub fn negative_zero_with_exponent(exponent: i64) -> Decimal {
        let coefficient = Coefficient::negative_zero();
        Decimal {
            coefficient,
            exponent,
        }
    }

    /// Returns the number of digits to the right of the decimal point: the negation of
    /// the exponent.
    pub fn scale(&self) -> i64 {
        self.exponent.checked_neg().unwrap_or(i64::MAX)
    }

    /// Returns the number of digits in the coefficient.
    pub fn precision(&self) -> u64 {
        self.coefficient.number_of_decimal_digits()
    }

    pub fn coefficient(&self) -> &Coefficient {
        &self.coefficient
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    pub(crate) fn is_less_than_zero(&self) -> bool {
        self.coefficient.sign() == Sign::Negative && !self.coefficient.is_zero()
    }

    pub(crate) fn is_greater_than_or_equal_to_one(&self) -> bool {
        if self.coefficient.is_zero() {
            return false;
        }
        // The value is >= 1 iff it has at least one digit left of the decimal point.
        self.number_of_integer_digits() >= 1
    }

    // The "adjusted exponent": the number of digits that fall to the left of the decimal
    // point. May be zero or negative for values less than one.
    fn number_of_integer_digits(&self) -> i128 {
        self.coefficient.number_of_decimal_digits() as i128 + self.exponent as i128
    }

    // Compares the magnitudes (absolute values) of two decimals.
    fn compare_magnitudes(d1: &Decimal, d2: &Decimal) -> Ordering {
        // Most unequal magnitudes can be detected by the position of their most
        // significant digit alone.
        let digits_ordering = d1
            .number_of_integer_digits()
            .cmp(&d2.number_of_integer_digits());
        if digits_ordering != Ordering::Equal {
            return digits_ordering;
        }
        // Same adjusted exponent; scale the coefficient with the greater exponent down to
        // the other's exponent and compare the magnitudes directly. Because the adjusted
        // exponents match, the scaling factor is bounded by the coefficients' digit counts.
        let exponent_delta = (d1.exponent - d2.exponent).unsigned_abs() as u32;
        let mut m1: BigUint = d1.coefficient.magnitude().clone().into();
        let mut m2: BigUint = d2.coefficient.magnitude().clone().into();
        match d1.exponent.cmp(&d2.exponent) {
            Ordering::Greater => m1 *= BigUint::from(10u64).pow(exponent_delta),
            Ordering::Less => m2 *= BigUint::from(10u64).pow(exponent_delta),
            Ordering::Equal => {}
        };
        m1.cmp(&m2)
    }
}

// Mathematical equality: `0d0 == 0d7` and `-0 == 0`. Use [IonEq] for data-model equivalence.
impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        // All zeros are mathematically equal regardless of sign or exponent.
        if self.coefficient.is_zero() && other.coefficient.is_zero() {
            return Ordering::Equal;
        }
        let this_sign = if self.coefficient.is_zero() {
            Sign::Positive
        } else {
            self.coefficient.sign()
        };
        let that_sign = if other.coefficient.is_zero() {
            Sign::Positive
        } else {
            other.coefficient.sign()
        };
        match (this_sign, that_sign) {
            (Sign::Negative, Sign::Positive) => Ordering::Less,
            (Sign::Positive, Sign::Negative) => Ordering::Greater,
            (Sign::Positive, Sign::Positive) => Decimal::compare_magnitudes(self, other),
            (Sign::Negative, Sign::Negative) => Decimal::compare_magnitudes(self, other).reverse(),
        }
    }
}

impl IonEq for Decimal {
    fn ion_eq(&self, other: &Self) -> bool {
        self.exponent == other.exponent && self.coefficient == other.coefficient
    }
}

macro_rules! impl_decimal_from_primitive_integer {
    ($($t:ty),*) => ($(
        impl From<$t> for Decimal {
            fn from(value: $t) -> Self {
                Decimal::new(value as i64, 0)
            }
        }
    )*)
}
impl_decimal_from_primitive_integer!(i8, i16, i32, i64, u8, u16, u32);

/// Formats the decimal in its canonical Ion text form. The coefficient's digits are written
/// exactly as stored; exponents of 1 or greater use `d` notation, an exponent of zero prints
/// with a trailing decimal point, and negative exponents place the decimal point within (or
/// pad leading zeros before) the digits.
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient.sign() == Sign::Negative {
            write!(f, "-")?;
        }
        let digits = match self.coefficient.magnitude() {
            UInt::U64(magnitude) => magnitude.to_string(),
            UInt::BigUInt(magnitude) => magnitude.to_string(),
        };
        match self.exponent {
            0 => write!(f, "{digits}."),
            exponent if exponent > 0 => write!(f, "{digits}d{exponent}"),
            _ => {
                let dot_index = digits.len() as i64 + self.exponent;
                if dot_index > 0 {
                    let (whole, fraction) = digits.split_at(dot_index as usize);
                    write!(f, "{whole}.{fraction}")
                } else {
                    write!(f, "0.")?;
                    for _ in dot_index..0 {
                        write!(f, "0")?;
                    }
                    write!(f, "{digits}")
                }
            }
        }
    }
}

#[cfg(test)]
mod decimal_tests {
    use super::*;
    use crate::ion_eq::IonEq;
    use num_bigint::BigUint;
    use rstest::*;
    use std::str::FromStr;

    #[test]
    fn partial_eq_is_mathematical() {
        // Equal value, different digit representations
        assert_eq!(Decimal::new(1, 0), Decimal::new(10, -1));
        assert_eq!(Decimal::new(0, 0), Decimal::new(0, 5));
        assert_eq!(Decimal::negative_zero(), Decimal::new(0, 0));
        assert_eq!(Decimal::new(100, -3), Decimal::new(1, -1));
        assert_ne!(Decimal::new(100, -3), Decimal::new(1, -2));
    }

    #[test]
    fn ion_eq_is_exact() {
        assert!(Decimal::new(1, 0).ion_eq(&Decimal::new(1, 0)));
        assert!(!Decimal::new(1, 0).ion_eq(&Decimal::new(10, -1)));
        assert!(!Decimal::new(0, 0).ion_eq(&Decimal::new(0, -1)));
        assert!(!Decimal::negative_zero().ion_eq(&Decimal::new(0, 0)));
    }

    #[rstest]
    #[case(Decimal::new(80, 2), Decimal::new(8, 3))]
    #[case(Decimal::new(124, -2), Decimal::new(1240, -3))]
    #[case(Decimal::new(-124, -2), Decimal::new(-1240, -3))]
    fn equivalent_scales(#[case] d1: Decimal, #[case] d2: Decimal) {
        assert_eq!(d1, d2);
    }

    #[rstest]
    #[case(Decimal::new(-1, 0), Decimal::new(1, 0))]
    #[case(Decimal::new(1, 0), Decimal::new(2, 0))]
    #[case(Decimal::new(1, 0), Decimal::new(1, 1))]
    #[case(Decimal::new(999, -3), Decimal::new(1, 0))]
    #[case(Decimal::new(-1, 3), Decimal::new(-999, -3))]
    fn ordering(#[case] smaller: Decimal, #[case] larger: Decimal) {
        assert!(smaller < larger);
        assert!(larger > smaller);
    }

    #[test]
    fn ordering_with_big_coefficients() {
        let big = Decimal::new(
            Coefficient::new(
                Sign::Positive,
                UInt::BigUInt(BigUint::from_str("123456789123456789123456789").unwrap()),
            ),
            -20,
        );
        // 1234567.89123456789123456789 > 1234567.891
        assert!(big > Decimal::new(1234567891, -3));
        assert!(big < Decimal::new(1234568, 0));
    }

    #[rstest]
    #[case(Decimal::new(0, 0), "0.")]
    #[case(Decimal::negative_zero(), "-0.")]
    #[case(Decimal::new(0, -1), "0.0")]
    #[case(Decimal::new(0, 1), "0d1")]
    #[case(Decimal::new(1234, 0), "1234.")]
    #[case(Decimal::new(1234, 1), "1234d1")]
    #[case(Decimal::new(1234, -1), "123.4")]
    #[case(Decimal::new(1234, -4), "0.1234")]
    #[case(Decimal::new(1234, -6), "0.001234")]
    #[case(Decimal::new(-1234, -6), "-0.001234")]
    #[case(Decimal::new(100, -3), "0.100")]
    fn canonical_text(#[case] value: Decimal, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn scale_and_precision() {
        assert_eq!(Decimal::new(553, -3).scale(), 3);
        assert_eq!(Decimal::new(553, 2).scale(), -2);
        assert_eq!(Decimal::new(553, -3).precision(), 3);
        assert_eq!(Decimal::new(1_000_000, -3).precision(), 7);
    }

    #[test]
    fn fraction_range_checks() {
        assert!(Decimal::new(-1, -2).is_less_than_zero());
        assert!(!Decimal::new(1, -2).is_less_than_zero());
        assert!(!Decimal::negative_zero().is_less_than_zero());
        assert!(Decimal::new(1, 0).is_greater_than_or_equal_to_one());
        assert!(Decimal::new(1000, -3).is_greater_than_or_equal_to_one());
        assert!(!Decimal::new(999, -3).is_greater_than_or_equal_to_one());
        assert!(!Decimal::new(0, 0).is_greater_than_or_equal_to_one());
    }
}
