use nom::branch::alt;
use nom::bytes::complete::{is_not, take_while, take_while1};
use nom::character::complete::{char, satisfy};
use nom::combinator::{map, recognize, verify};
use nom::multi::fold_many0;
use nom::sequence::{delimited, pair};
use nom::IResult;

use crate::raw_symbol_token::RawSymbolToken;
use crate::text::parsers::text_support::{
    append_fragment, escaped_char, escaped_newline, StringFragment,
};
use crate::text::text_value::TextValue;

/// Matches the text representation of a symbol value and returns it as a
/// [TextValue::Symbol]. This includes unquoted identifiers, quoted symbols, and `$n` symbol
/// ID references.
pub(crate) fn parse_symbol(input: &str) -> IResult<&str, TextValue> {
    map(parse_symbol_token, TextValue::Symbol)(input)
}

/// Matches an identifier or quoted symbol and returns the corresponding [RawSymbolToken].
/// Identifiers of the form `$n` (a `$` followed only by digits) refer to a symbol table
/// slot rather than carrying text.
pub(crate) fn parse_symbol_token(input: &str) -> IResult<&str, RawSymbolToken> {
    alt((identifier, quoted_symbol))(input)
}

/// Matches an operator symbol: a run of operator characters, legal only within an
/// s-expression.
pub(crate) fn parse_operator(input: &str) -> IResult<&str, TextValue> {
    map(
        take_while1(|c| "!#%&*+-./;<=>?@^`|~".contains(c)),
        |text: &str| TextValue::Symbol(RawSymbolToken::Text(text.to_string())),
    )(input)
}

fn identifier(input: &str) -> IResult<&str, RawSymbolToken> {
    map(
        verify(
            recognize(pair(identifier_initial_character, identifier_trailing_characters)),
            |text: &str| !matches!(text, "true" | "false" | "null" | "nan"),
        ),
        classify_identifier,
    )(input)
}

// `$10` refers to symbol table slot 10; `$10a` and `$foo` are ordinary identifiers.
fn classify_identifier(text: &str) -> RawSymbolToken {
    if let Some(digits) = text.strip_prefix('$') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(sid) = digits.parse::<usize>() {
                return RawSymbolToken::SymbolId(sid);
            }
        }
    }
    RawSymbolToken::Text(text.to_string())
}

fn identifier_initial_character(input: &str) -> IResult<&str, char> {
    satisfy(|c| c == '$' || c == '_' || c.is_ascii_alphabetic())(input)
}

fn identifier_trailing_characters(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c == '$' || c == '_' || c.is_ascii_alphanumeric())(input)
}

fn quoted_symbol(input: &str) -> IResult<&str, RawSymbolToken> {
    map(
        delimited(char('\''), quoted_symbol_body, char('\'')),
        RawSymbolToken::Text,
    )(input)
}

fn quoted_symbol_body(input: &str) -> IResult<&str, String> {
    fold_many0(quoted_symbol_fragment, String::new, |mut text, fragment| {
        append_fragment(&mut text, fragment);
        text
    })(input)
}

fn quoted_symbol_fragment(input: &str) -> IResult<&str, StringFragment> {
    alt((escaped_newline, escaped_char, quoted_symbol_substring))(input)
}

fn quoted_symbol_substring(input: &str) -> IResult<&str, StringFragment> {
    map(is_not("'\\\r\n"), StringFragment::Substring)(input)
}

#[cfg(test)]
mod symbol_parsing_tests {
    use super::*;
    use rstest::*;

    fn text_token(text: &str) -> TextValue {
        TextValue::Symbol(RawSymbolToken::Text(text.to_string()))
    }

    #[rstest]
    #[case("foo ", text_token("foo"))]
    #[case("_underscore ", text_token("_underscore"))]
    #[case("$dollar ", text_token("$dollar"))]
    #[case("name123 ", text_token("name123"))]
    #[case("$10a ", text_token("$10a"))]
    #[case("nanometers ", text_token("nanometers"))]
    #[case("'quoted symbol' ", text_token("quoted symbol"))]
    #[case("'' ", text_token(""))]
    #[case("'it\\'s' ", text_token("it's"))]
    #[case("$10 ", TextValue::Symbol(RawSymbolToken::SymbolId(10)))]
    #[case("$0 ", TextValue::Symbol(RawSymbolToken::SymbolId(0)))]
    fn recognized_symbols(#[case] text: &str, #[case] expected: TextValue) {
        let (_, value) = parse_symbol(text).unwrap();
        assert_eq!(value, expected);
    }

    #[rstest]
    #[case("true ")]
    #[case("null ")]
    #[case("nan ")]
    #[case("123abc ")] // identifiers cannot start with a digit
    fn rejected_symbols(#[case] text: &str) {
        assert!(parse_symbol(text).is_err());
    }

    #[rstest]
    #[case("+ ", "+")]
    #[case("== ", "==")]
    #[case("<=> ", "<=>")]
    fn operators(#[case] text: &str, #[case] expected: &str) {
        let (_, value) = parse_operator(text).unwrap();
        assert_eq!(value, text_token(expected));
    }
}
