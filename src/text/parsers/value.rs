use nom::branch::alt;
use nom::character::complete::char;
use nom::combinator::{map, opt};
use nom::sequence::{pair, preceded};
use nom::IResult;

use crate::text::parsers::annotations::parse_annotations;
use crate::text::parsers::blob::parse_blob;
use crate::text::parsers::boolean::parse_boolean;
use crate::text::parsers::clob::parse_clob;
use crate::text::parsers::comments::whitespace_or_comments;
use crate::text::parsers::decimal::parse_decimal;
use crate::text::parsers::float::parse_float;
use crate::text::parsers::integer::parse_integer;
use crate::text::parsers::null::parse_null;
use crate::text::parsers::string::parse_string;
use crate::text::parsers::symbol::parse_symbol;
use crate::text::parsers::timestamp::parse_timestamp;
use crate::text::text_value::{AnnotatedTextValue, TextValue};

/// Matches a value at any position: leading trivia, optional annotations, then the value
/// itself. Container values are returned as their `*Start` marker; the reader parses their
/// contents as the application visits them.
pub(crate) fn annotated_value(input: &str) -> IResult<&str, AnnotatedTextValue> {
    map(
        preceded(
            whitespace_or_comments,
            pair(opt(parse_annotations), value_without_annotations),
        ),
        |(annotations, value)| AnnotatedTextValue::new(annotations.unwrap_or_default(), value),
    )(input)
}

/// Matches a value with no leading annotations.
pub(crate) fn value_without_annotations(input: &str) -> IResult<&str, TextValue> {
    preceded(
        whitespace_or_comments,
        alt((
            parse_null,
            parse_boolean,
            // Timestamps and numbers all begin with digits (or a sign); the longest,
            // most-specific shapes are tried first.
            parse_timestamp,
            parse_float,
            parse_decimal,
            parse_integer,
            parse_string,
            // Lobs open with `{{`, which must win over a struct's `{`.
            parse_blob,
            parse_clob,
            container_start,
            parse_symbol,
        )),
    )(input)
}

fn container_start(input: &str) -> IResult<&str, TextValue> {
    alt((
        map(char('['), |_| TextValue::ListStart),
        map(char('('), |_| TextValue::SExpStart),
        map(char('{'), |_| TextValue::StructStart),
    ))(input)
}

#[cfg(test)]
mod value_parsing_tests {
    use super::*;
    use crate::raw_symbol_token::RawSymbolToken;
    use crate::types::integer::Int;
    use crate::types::IonType;

    #[test]
    fn bare_value() {
        let (_, value) = annotated_value("  17 ").unwrap();
        assert_eq!(value.annotations(), &[]);
        assert_eq!(value.value(), &TextValue::Int(Int::I64(17)));
    }

    #[test]
    fn annotated_scalar() {
        let (_, value) = annotated_value("usd::17.00 ").unwrap();
        assert_eq!(
            value.annotations(),
            &[RawSymbolToken::Text("usd".to_string())]
        );
        assert_eq!(value.ion_type(), IonType::Decimal);
    }

    #[test]
    fn annotated_container_start() {
        let (remaining, value) = annotated_value("inventory::[1, 2] ").unwrap();
        assert_eq!(value.value(), &TextValue::ListStart);
        assert_eq!(remaining, "1, 2] ");
    }

    #[test]
    fn lob_is_not_a_struct() {
        let (_, value) = annotated_value("{{aGVsbG8=}} ").unwrap();
        assert_eq!(value.ion_type(), IonType::Blob);
        let (_, value) = annotated_value("{{\"hi\"}} ").unwrap();
        assert_eq!(value.ion_type(), IonType::Clob);
        let (_, value) = annotated_value("{a: 1} ").unwrap();
        assert_eq!(value.value(), &TextValue::StructStart);
    }

    #[test]
    fn keywords_beat_symbols() {
        let (_, value) = annotated_value("null.int ").unwrap();
        assert_eq!(value.value(), &TextValue::Null(IonType::Int));
        let (_, value) = annotated_value("nan ").unwrap();
        assert_eq!(value.ion_type(), IonType::Float);
        let (_, value) = annotated_value("nanites ").unwrap();
        assert_eq!(value.ion_type(), IonType::Symbol);
    }
}
