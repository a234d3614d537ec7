use nom::branch::alt;
use nom::character::complete::char;
use nom::combinator::{map, not, peek, value, verify};
use nom::sequence::{preceded, terminated, tuple};
use nom::IResult;

use crate::raw_symbol_token::RawSymbolToken;
use crate::text::parsers::comments::whitespace_or_comments;
use crate::text::parsers::string::parse_string_text;
use crate::text::parsers::symbol::{parse_operator, parse_symbol_token};
use crate::text::parsers::value::annotated_value;
use crate::text::text_value::AnnotatedTextValue;

/// Matches a list's next child value (with its trailing `,` or closing-`]` lookahead
/// consumed as appropriate), or the end of the list. `None` indicates the end.
pub(crate) fn list_value_or_end(input: &str) -> IResult<&str, Option<AnnotatedTextValue>> {
    preceded(
        whitespace_or_comments,
        alt((map(char(']'), |_| None), map(list_value, Some))),
    )(input)
}

fn list_value(input: &str) -> IResult<&str, AnnotatedTextValue> {
    // A scalar consumes the delimiter that follows it. A container start cannot: its
    // delimiter comes after the (not-yet-parsed) closing delimiter, and is consumed when
    // the reader steps out of it.
    alt((
        terminated(annotated_scalar, list_delimiter),
        annotated_container_start,
    ))(input)
}

/// Matches the `,` after a list element, or the `]` (without consuming it) that ends the
/// list.
pub(crate) fn list_delimiter(input: &str) -> IResult<&str, ()> {
    preceded(
        whitespace_or_comments,
        alt((value((), char(',')), value((), peek(char(']'))))),
    )(input)
}

fn annotated_scalar(input: &str) -> IResult<&str, AnnotatedTextValue> {
    verify(annotated_value, |value| !value.ion_type().is_container())(input)
}

fn annotated_container_start(input: &str) -> IResult<&str, AnnotatedTextValue> {
    verify(annotated_value, |value| value.ion_type().is_container())(input)
}

/// Matches an s-expression's next child value, or the end of the s-expression. Children are
/// separated only by whitespace; operator symbols (like `+` or `==`) are legal values in
/// this context.
pub(crate) fn s_expression_value_or_end(
    input: &str,
) -> IResult<&str, Option<AnnotatedTextValue>> {
    preceded(
        whitespace_or_comments,
        alt((map(char(')'), |_| None), map(s_expression_value, Some))),
    )(input)
}

fn s_expression_value(input: &str) -> IResult<&str, AnnotatedTextValue> {
    alt((
        annotated_value,
        map(
            preceded(whitespace_or_comments, parse_operator),
            AnnotatedTextValue::from,
        ),
    ))(input)
}

/// Matches a struct's next field name (consuming the `:` that follows it), or the end of the
/// struct. `None` indicates the end.
pub(crate) fn struct_field_name_or_end(input: &str) -> IResult<&str, Option<RawSymbolToken>> {
    preceded(
        whitespace_or_comments,
        alt((map(char('}'), |_| None), map(struct_field_name, Some))),
    )(input)
}

fn struct_field_name(input: &str) -> IResult<&str, RawSymbolToken> {
    terminated(
        struct_field_name_token,
        // A single ':'; a '::' here would be an annotation on a misplaced value
        tuple((whitespace_or_comments, char(':'), not(char(':')))),
    )(input)
}

// Field names may be symbols (in any form) or string literals
fn struct_field_name_token(input: &str) -> IResult<&str, RawSymbolToken> {
    alt((
        parse_symbol_token,
        map(parse_string_text, RawSymbolToken::Text),
    ))(input)
}

/// Matches a struct field's value. Scalar values consume their trailing delimiter;
/// container values leave it for [struct_delimiter] to consume at step-out.
pub(crate) fn struct_field_value(input: &str) -> IResult<&str, AnnotatedTextValue> {
    alt((
        terminated(annotated_scalar, struct_delimiter),
        annotated_container_start,
    ))(input)
}

/// Matches the `,` after a struct field, or the `}` (without consuming it) that ends the
/// struct.
pub(crate) fn struct_delimiter(input: &str) -> IResult<&str, ()> {
    preceded(
        whitespace_or_comments,
        alt((value((), char(',')), value((), peek(char('}'))))),
    )(input)
}

#[cfg(test)]
mod container_parsing_tests {
    use super::*;
    use crate::text::text_value::TextValue;
    use crate::types::integer::Int;

    fn int(value: i64) -> TextValue {
        TextValue::Int(Int::I64(value))
    }

    #[test]
    fn list_children() {
        let (rest, value) = list_value_or_end("1, 2]").unwrap();
        assert_eq!(value.unwrap().value(), &int(1));
        let (rest, value) = list_value_or_end(rest).unwrap();
        assert_eq!(value.unwrap().value(), &int(2));
        let (_, value) = list_value_or_end(rest).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn list_allows_trailing_comma() {
        let (rest, value) = list_value_or_end("1,]").unwrap();
        assert_eq!(value.unwrap().value(), &int(1));
        let (_, value) = list_value_or_end(rest).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn list_requires_commas() {
        assert!(list_value_or_end("1 2]").is_err());
    }

    #[test]
    fn sexp_children_are_whitespace_separated() {
        let (rest, value) = s_expression_value_or_end("a + 2)").unwrap();
        assert_eq!(
            value.unwrap().value(),
            &TextValue::Symbol(RawSymbolToken::Text("a".to_string()))
        );
        let (rest, value) = s_expression_value_or_end(rest).unwrap();
        assert_eq!(
            value.unwrap().value(),
            &TextValue::Symbol(RawSymbolToken::Text("+".to_string()))
        );
        let (rest, value) = s_expression_value_or_end(rest).unwrap();
        assert_eq!(value.unwrap().value(), &int(2));
        let (_, value) = s_expression_value_or_end(rest).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn struct_fields() {
        let (rest, name) = struct_field_name_or_end("a: 1, \"b\": 2}").unwrap();
        assert_eq!(name.unwrap(), RawSymbolToken::Text("a".to_string()));
        let (rest, value) = struct_field_value(rest).unwrap();
        assert_eq!(value.value(), &int(1));
        let (rest, name) = struct_field_name_or_end(rest).unwrap();
        assert_eq!(name.unwrap(), RawSymbolToken::Text("b".to_string()));
        let (rest, value) = struct_field_value(rest).unwrap();
        assert_eq!(value.value(), &int(2));
        let (_, name) = struct_field_name_or_end(rest).unwrap();
        assert!(name.is_none());
    }

    #[test]
    fn struct_field_value_can_be_annotated() {
        let (rest, name) = struct_field_name_or_end("a: usd::1}").unwrap();
        assert_eq!(name.unwrap(), RawSymbolToken::Text("a".to_string()));
        let (_, value) = struct_field_value(rest).unwrap();
        assert_eq!(value.annotations().len(), 1);
        assert_eq!(value.value(), &int(1));
    }

    #[test]
    fn empty_containers() {
        assert_eq!(list_value_or_end(" ]").unwrap().1, None);
        assert_eq!(s_expression_value_or_end(" )").unwrap().1, None);
        assert_eq!(struct_field_name_or_end(" }").unwrap().1, None);
    }
}
