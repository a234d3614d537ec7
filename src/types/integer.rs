use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;

use num_bigint::{BigInt, BigUint, Sign as BigSign};
use num_traits::{ToPrimitive, Zero};

use crate::result::{decoding_error, overflow_error, IonResult};

/// A signed integer of arbitrary magnitude. Values that fit in an `i64` are stored inline;
/// larger values are promoted to a heap-allocated [BigInt].
#[derive(Debug, Clone)]
pub enum Int {
    I64(i64),
    BigInt(BigInt),
}

/// An unsigned integer of arbitrary magnitude, used to represent the length prefixes and
/// unsigned magnitudes that appear in the binary encoding as well as [Decimal](crate::Decimal)
/// coefficients.
#[derive(Debug, Clone)]
pub enum UInt {
    U64(u64),
    BigUInt(BigUint),
}

impl Int {
    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Int::I64(value) => *value == 0,
            Int::BigInt(value) => value.is_zero(),
        }
    }

    /// Returns `true` if this value is less than zero.
    pub fn is_negative(&self) -> bool {
        match self {
            Int::I64(value) => *value < 0,
            Int::BigInt(value) => value.sign() == BigSign::Minus,
        }
    }

    /// Returns this value as an `i64` if its magnitude allows it; otherwise returns an
    /// [Overflow](crate::IonError::Overflow) error.
    pub fn as_i64(&self) -> IonResult<i64> {
        match self {
            Int::I64(value) => Ok(*value),
            Int::BigInt(value) => match value.to_i64() {
                Some(small) => Ok(small),
                None => overflow_error(value.to_string(), "i64"),
            },
        }
    }

    /// Returns the magnitude of this integer, discarding the sign.
    pub fn unsigned_abs(&self) -> UInt {
        match self {
            Int::I64(value) => UInt::U64(value.unsigned_abs()),
            Int::BigInt(value) => UInt::BigUInt(value.magnitude().clone()),
        }
    }

    /// Parses the provided base-10 text (optionally beginning with `-`) into an [Int].
    /// Underscores are not handled here; callers strip them first.
    pub fn from_decimal_text(text: &str) -> IonResult<Int> {
        if let Ok(value) = text.parse::<i64>() {
            return Ok(Int::I64(value));
        }
        match text.parse::<BigInt>() {
            Ok(value) => Ok(Int::BigInt(value)),
            Err(_) => decoding_error(format!("could not parse '{text}' as an int")),
        }
    }
}

impl UInt {
    pub fn is_zero(&self) -> bool {
        match self {
            UInt::U64(value) => *value == 0,
            UInt::BigUInt(value) => value.is_zero(),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            UInt::U64(value) => Some(*value),
            UInt::BigUInt(value) => value.to_u64(),
        }
    }

    /// The number of base-10 digits in this magnitude.
    pub fn number_of_decimal_digits(&self) -> u64 {
        match self {
            UInt::U64(value) => super::num_decimal_digits_in_u64(*value),
            UInt::BigUInt(value) => value.to_str_radix(10).len() as u64,
        }
    }
}

impl PartialEq for Int {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Int {}

impl PartialOrd for Int {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Int {
    fn cmp(&self, other: &Self) -> Ordering {
        use Int::*;
        match (self, other) {
            (I64(this), I64(that)) => this.cmp(that),
            (I64(this), BigInt(that)) => num_bigint::BigInt::from(*this).cmp(that),
            (BigInt(this), I64(that)) => this.cmp(&num_bigint::BigInt::from(*that)),
            (BigInt(this), BigInt(that)) => this.cmp(that),
        }
    }
}

impl PartialEq for UInt {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for UInt {}

impl PartialOrd for UInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UInt {
    fn cmp(&self, other: &Self) -> Ordering {
        use UInt::*;
        match (self, other) {
            (U64(this), U64(that)) => this.cmp(that),
            (U64(this), BigUInt(that)) => BigUint::from(*this).cmp(that),
            (BigUInt(this), U64(that)) => this.cmp(&BigUint::from(*that)),
            (BigUInt(this), BigUInt(that)) => this.cmp(that),
        }
    }
}

impl Neg for Int {
    type Output = Int;

    fn neg(self) -> Self::Output {
        match self {
            Int::I64(value) => match value.checked_neg() {
                Some(negated) => Int::I64(negated),
                None => Int::BigInt(-BigInt::from(value)),
            },
            Int::BigInt(value) => Int::BigInt(-value),
        }
    }
}

impl From<i64> for Int {
    fn from(value: i64) -> Self {
        Int::I64(value)
    }
}

impl From<i32> for Int {
    fn from(value: i32) -> Self {
        Int::I64(value as i64)
    }
}

impl From<u64> for Int {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(signed) => Int::I64(signed),
            Err(_) => Int::BigInt(BigInt::from(value)),
        }
    }
}

impl From<BigInt> for Int {
    fn from(value: BigInt) -> Self {
        // Values small enough for the inline representation are demoted so that the
        // two representations of the same number compare and encode identically.
        match value.to_i64() {
            Some(small) => Int::I64(small),
            None => Int::BigInt(value),
        }
    }
}

impl From<u64> for UInt {
    fn from(value: u64) -> Self {
        UInt::U64(value)
    }
}

impl From<usize> for UInt {
    fn from(value: usize) -> Self {
        UInt::U64(value as u64)
    }
}

impl From<BigUint> for UInt {
    fn from(value: BigUint) -> Self {
        match value.to_u64() {
            Some(small) => UInt::U64(small),
            None => UInt::BigUInt(value),
        }
    }
}

impl From<UInt> for BigUint {
    fn from(value: UInt) -> Self {
        match value {
            UInt::U64(small) => BigUint::from(small),
            UInt::BigUInt(big) => big,
        }
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Int::I64(value) => write!(f, "{value}"),
            Int::BigInt(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for UInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UInt::U64(value) => write!(f, "{value}"),
            UInt::BigUInt(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod integer_tests {
    use super::*;
    use rstest::*;
    use std::str::FromStr;

    #[test]
    fn is_zero() {
        assert!(Int::I64(0).is_zero());
        assert!(Int::BigInt(BigInt::from(0)).is_zero());
        assert!(!Int::I64(-55).is_zero());
    }

    #[test]
    fn mixed_representation_equality() {
        assert_eq!(Int::I64(71), Int::BigInt(BigInt::from(71)));
        assert_eq!(UInt::U64(71), UInt::BigUInt(BigUint::from(71u32)));
        assert_ne!(Int::I64(71), Int::BigInt(BigInt::from(-71)));
    }

    #[rstest]
    #[case("0", Int::I64(0))]
    #[case("-98765", Int::I64(-98765))]
    #[case("9223372036854775807", Int::I64(i64::MAX))]
    fn parse_small_ints(#[case] text: &str, #[case] expected: Int) {
        assert_eq!(Int::from_decimal_text(text).unwrap(), expected);
    }

    #[test]
    fn parse_promotes_to_big_int() {
        let text = "123456789123456789123456789123456789";
        let parsed = Int::from_decimal_text(text).unwrap();
        assert_eq!(parsed, Int::BigInt(BigInt::from_str(text).unwrap()));
        assert!(parsed.as_i64().is_err());
    }

    #[test]
    fn ordering_across_representations() {
        let values = [
            Int::BigInt(BigInt::from_str("-123456789123456789123456789").unwrap()),
            Int::I64(-22),
            Int::I64(0),
            Int::BigInt(BigInt::from(71)),
            Int::BigInt(BigInt::from_str("123456789123456789123456789").unwrap()),
        ];
        let mut sorted = values.to_vec();
        sorted.reverse();
        sorted.sort();
        assert_eq!(sorted.as_slice(), values.as_slice());
    }

    #[test]
    fn digit_counts() {
        assert_eq!(UInt::U64(0).number_of_decimal_digits(), 1);
        assert_eq!(UInt::U64(100).number_of_decimal_digits(), 3);
        let big = UInt::BigUInt(BigUint::from_str("123456789123456789123456789").unwrap());
        assert_eq!(big.number_of_decimal_digits(), 27);
    }
}
