use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, one_of};
use nom::combinator::{map, map_res, opt, recognize};
use nom::sequence::{pair, preceded, terminated, tuple};
use nom::IResult;

use crate::text::parsers::numeric_support::{digits_with_underscores, strip_underscores};
use crate::text::parsers::text_support::stop_character;
use crate::text::text_value::TextValue;

/// Matches the text representation of a float value and returns the resulting f64 as a
/// [TextValue::Float]. A numeric literal is only a float if it carries an `e` exponent;
/// the keyword forms `nan`, `+inf`, and `-inf` are also recognized.
pub(crate) fn parse_float(input: &str) -> IResult<&str, TextValue> {
    terminated(
        alt((float_special_value, float_numeric_value)),
        stop_character,
    )(input)
}

fn float_special_value(input: &str) -> IResult<&str, TextValue> {
    alt((
        map(tag("nan"), |_| TextValue::Float(f64::NAN)),
        map(tag("+inf"), |_| TextValue::Float(f64::INFINITY)),
        map(tag("-inf"), |_| TextValue::Float(f64::NEG_INFINITY)),
    ))(input)
}

fn float_numeric_value(input: &str) -> IResult<&str, TextValue> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digits_with_underscores,
            opt(preceded(char('.'), opt(digits_with_underscores))),
            one_of("eE"),
            recognize(pair(opt(one_of("+-")), digits_with_underscores)),
        ))),
        |text: &str| {
            let sanitized = strip_underscores(text);
            sanitized
                .parse::<f64>()
                .map(TextValue::Float)
                .map_err(|_| ())
        },
    )(input)
}

#[cfg(test)]
mod float_parsing_tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("0e0 ", 0f64)]
    #[case("-0e0 ", -0f64)]
    #[case("305e1 ", 3050f64)]
    #[case("305.0e1 ", 3050f64)]
    #[case("-3.14e4,", -31400f64)]
    #[case("2.5E0 ", 2.5f64)]
    #[case("1_000e0 ", 1000f64)]
    #[case("+inf ", f64::INFINITY)]
    #[case("-inf ", f64::NEG_INFINITY)]
    fn recognized_floats(#[case] text: &str, #[case] expected: f64) {
        let (_, value) = parse_float(text).unwrap();
        assert_eq!(value, TextValue::Float(expected));
        if expected == 0f64 {
            // The sign of a zero must be preserved
            if let TextValue::Float(f) = value {
                assert_eq!(f.is_sign_negative(), expected.is_sign_negative());
            }
        }
    }

    #[test]
    fn nan_is_a_float() {
        let (_, value) = parse_float("nan ").unwrap();
        match value {
            TextValue::Float(f) => assert!(f.is_nan()),
            other => panic!("expected nan, found {other:?}"),
        }
    }

    #[rstest]
    #[case("305 ")] // no exponent: this is an int
    #[case("305.0 ")] // no exponent: this is a decimal
    #[case("inf ")] // inf requires an explicit sign
    #[case("nane ")]
    fn rejected_floats(#[case] text: &str) {
        assert!(parse_float(text).is_err());
    }
}
