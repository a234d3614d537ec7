use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::char;
use nom::combinator::{map_res, opt, recognize};
use nom::sequence::{pair, preceded, terminated};
use nom::IResult;

use num_bigint::BigInt;

use crate::text::parsers::numeric_support::{
    binary_digits_with_underscores, digits_with_underscores, has_leading_zero,
    hex_digits_with_underscores, strip_underscores,
};
use crate::text::parsers::text_support::stop_character;
use crate::text::text_value::TextValue;
use crate::types::integer::Int;

/// Matches the text representation of an integer in any of its three radixes and returns the
/// resulting value as a [TextValue::Int]. Values too large for an `i64` are transparently
/// promoted to arbitrary precision.
pub(crate) fn parse_integer(input: &str) -> IResult<&str, TextValue> {
    terminated(
        alt((base_16_integer, base_2_integer, base_10_integer)),
        stop_character,
    )(input)
}

fn base_16_integer(input: &str) -> IResult<&str, TextValue> {
    map_res(
        pair(
            opt(char('-')),
            preceded(tag_no_case("0x"), hex_digits_with_underscores),
        ),
        |(sign, digits)| {
            parse_radix_digits(sign.is_some(), &strip_underscores(digits), 16)
        },
    )(input)
}

fn base_2_integer(input: &str) -> IResult<&str, TextValue> {
    map_res(
        pair(
            opt(char('-')),
            preceded(tag_no_case("0b"), binary_digits_with_underscores),
        ),
        |(sign, digits)| {
            parse_radix_digits(sign.is_some(), &strip_underscores(digits), 2)
        },
    )(input)
}

fn base_10_integer(input: &str) -> IResult<&str, TextValue> {
    map_res(
        recognize(pair(opt(char('-')), digits_with_underscores)),
        |text: &str| {
            let text = strip_underscores(text);
            let digits = text.strip_prefix('-').unwrap_or(&text);
            if has_leading_zero(digits) {
                return Err(());
            }
            Int::from_decimal_text(&text)
                .map(TextValue::Int)
                .map_err(|_| ())
        },
    )(input)
}

fn parse_radix_digits(is_negative: bool, digits: &str, radix: u32) -> Result<TextValue, ()> {
    let value = if let Ok(small) = i64::from_str_radix(digits, radix) {
        Int::I64(if is_negative { -small } else { small })
    } else {
        let big = BigInt::parse_bytes(digits.as_bytes(), radix).ok_or(())?;
        Int::from(if is_negative { -big } else { big })
    };
    Ok(TextValue::Int(value))
}

#[cfg(test)]
mod integer_parsing_tests {
    use super::*;
    use rstest::*;
    use std::str::FromStr;

    fn int(value: i64) -> TextValue {
        TextValue::Int(Int::I64(value))
    }

    #[rstest]
    #[case("0 ", int(0))]
    #[case("42 ", int(42))]
    #[case("-42,", int(-42))]
    #[case("1_000_000 ", int(1_000_000))]
    #[case("0x2A ", int(42))]
    #[case("0X2a ", int(42))]
    #[case("-0xFF ", int(-255))]
    #[case("0xFF_FF ", int(65535))]
    #[case("0b101 ", int(5))]
    #[case("-0b1_0 ", int(-2))]
    fn recognized_integers(#[case] text: &str, #[case] expected: TextValue) {
        let (_, value) = parse_integer(text).unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn big_integers_are_promoted() {
        let text = "123456789123456789123456789123456789 ";
        let (_, value) = parse_integer(text).unwrap();
        let expected = BigInt::from_str(text.trim()).unwrap();
        assert_eq!(value, TextValue::Int(Int::BigInt(expected)));
    }

    #[rstest]
    #[case("0123 ")] // leading zero
    #[case("1_ ")] // trailing underscore
    #[case("-_1 ")] // leading underscore
    #[case("1x ")] // trailing garbage
    #[case("+1 ")] // explicit plus sign is not part of the grammar
    fn rejected_integers(#[case] text: &str) {
        assert!(parse_integer(text).is_err());
    }
}
