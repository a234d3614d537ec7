use nom::branch::alt;
use nom::character::complete::{char, one_of};
use nom::combinator::{map_res, opt, recognize};
use nom::sequence::{pair, preceded, terminated, tuple};
use nom::IResult;

use num_bigint::BigUint;

use crate::text::parsers::numeric_support::{
    digits_with_underscores, has_leading_zero, strip_underscores,
};
use crate::text::parsers::text_support::stop_character;
use crate::text::text_value::TextValue;
use crate::types::coefficient::{Coefficient, Sign};
use crate::types::decimal::Decimal;
use crate::types::integer::UInt;

/// Matches the text representation of a decimal value and returns it as a
/// [TextValue::Decimal]. A numeric literal is a decimal if it contains a `.` with no `e`
/// exponent, a `d`/`D` exponent, or both. The coefficient's digits are preserved exactly:
/// `0.100` has a coefficient of 100 and an exponent of -3.
pub(crate) fn parse_decimal(input: &str) -> IResult<&str, TextValue> {
    terminated(
        alt((decimal_with_fraction, decimal_without_fraction)),
        stop_character,
    )(input)
}

fn decimal_with_fraction(input: &str) -> IResult<&str, TextValue> {
    map_res(
        tuple((
            opt(char('-')),
            digits_with_underscores,
            preceded(char('.'), opt(digits_with_underscores)),
            opt(decimal_exponent),
        )),
        |(sign, integer_digits, fraction_digits, exponent)| {
            assemble_decimal(
                sign.is_some(),
                integer_digits,
                fraction_digits.unwrap_or(""),
                exponent.unwrap_or(0),
            )
        },
    )(input)
}

fn decimal_without_fraction(input: &str) -> IResult<&str, TextValue> {
    map_res(
        tuple((opt(char('-')), digits_with_underscores, decimal_exponent)),
        |(sign, integer_digits, exponent)| {
            assemble_decimal(sign.is_some(), integer_digits, "", exponent)
        },
    )(input)
}

fn decimal_exponent(input: &str) -> IResult<&str, i64> {
    map_res(
        preceded(
            one_of("dD"),
            recognize(pair(opt(one_of("+-")), digits_with_underscores)),
        ),
        |exponent_text: &str| strip_underscores(exponent_text).parse::<i64>(),
    )(input)
}

fn assemble_decimal(
    is_negative: bool,
    integer_digits: &str,
    fraction_digits: &str,
    declared_exponent: i64,
) -> Result<TextValue, ()> {
    let integer_digits = strip_underscores(integer_digits);
    let fraction_digits = strip_underscores(fraction_digits);
    if has_leading_zero(&integer_digits) {
        return Err(());
    }
    let mut coefficient_digits = integer_digits;
    coefficient_digits.push_str(&fraction_digits);
    let exponent = declared_exponent
        .checked_sub(fraction_digits.len() as i64)
        .ok_or(())?;

    let sign = if is_negative {
        Sign::Negative
    } else {
        Sign::Positive
    };
    let magnitude = if let Ok(small) = coefficient_digits.parse::<u64>() {
        UInt::U64(small)
    } else {
        let big = BigUint::parse_bytes(coefficient_digits.as_bytes(), 10).ok_or(())?;
        UInt::BigUInt(big)
    };
    let coefficient = Coefficient::new(sign, magnitude);
    Ok(TextValue::Decimal(Decimal::new(coefficient, exponent)))
}

#[cfg(test)]
mod decimal_parsing_tests {
    use super::*;
    use crate::ion_eq::IonEq;
    use rstest::*;

    fn expect_decimal(text: &str, expected: Decimal) {
        let (_, value) = parse_decimal(text).unwrap();
        match value {
            TextValue::Decimal(actual) => {
                assert!(
                    actual.ion_eq(&expected),
                    "expected {expected:?}, found {actual:?}"
                );
            }
            other => panic!("expected a decimal, found {other:?}"),
        }
    }

    #[rstest]
    #[case("0. ", Decimal::new(0, 0))]
    #[case("0.0 ", Decimal::new(0, -1))]
    #[case("0.100 ", Decimal::new(100, -3))]
    #[case("-0.100 ", Decimal::new(-100, -3))]
    #[case("123.456 ", Decimal::new(123456, -3))]
    #[case("123. ", Decimal::new(123, 0))]
    #[case("123d5 ", Decimal::new(123, 5))]
    #[case("123D-5 ", Decimal::new(123, -5))]
    #[case("123.456d7 ", Decimal::new(123456, 4))]
    #[case("-0. ", Decimal::negative_zero())]
    #[case("-0.00 ", Decimal::negative_zero_with_exponent(-2))]
    #[case("-0d-1 ", Decimal::negative_zero_with_exponent(-1))]
    #[case("1_000.5 ", Decimal::new(10005, -1))]
    fn recognized_decimals(#[case] text: &str, #[case] expected: Decimal) {
        expect_decimal(text, expected);
    }

    #[test]
    fn big_coefficients_are_preserved() {
        let (_, value) = parse_decimal("123456789123456789123456789.123 ").unwrap();
        match value {
            TextValue::Decimal(decimal) => {
                assert_eq!(decimal.exponent(), -3);
                assert_eq!(decimal.coefficient().number_of_decimal_digits(), 30);
            }
            other => panic!("expected a decimal, found {other:?}"),
        }
    }

    #[rstest]
    #[case("123 ")] // int
    #[case("123e4 ")] // float
    #[case("01.2 ")] // leading zero
    #[case("12.3.4 ")] // double point
    fn rejected_decimals(#[case] text: &str) {
        assert!(parse_decimal(text).is_err());
    }
}
