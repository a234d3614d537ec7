use nom::branch::alt;
use nom::bytes::complete::{is_not, tag};
use nom::character::complete::char;
use nom::combinator::map;
use nom::error::{Error, ErrorKind};
use nom::multi::{fold_many0, many1};
use nom::sequence::{delimited, preceded};
use nom::IResult;

use crate::text::parsers::comments::whitespace_or_comments;
use crate::text::parsers::text_support::{
    append_fragment, escaped_char, escaped_newline, StringFragment,
};
use crate::text::text_value::TextValue;

/// Matches the text representation of a string value and returns it as a
/// [TextValue::String]. Long-form strings (`'''...'''`) concatenate with any number of
/// adjacent long-form segments, separated only by whitespace and comments.
pub(crate) fn parse_string(input: &str) -> IResult<&str, TextValue> {
    map(parse_string_text, TextValue::String)(input)
}

/// Matches a short- or long-form string and returns its unescaped text.
pub(crate) fn parse_string_text(input: &str) -> IResult<&str, String> {
    alt((long_string, short_string))(input)
}

fn short_string(input: &str) -> IResult<&str, String> {
    delimited(char('"'), short_string_body, char('"'))(input)
}

fn long_string(input: &str) -> IResult<&str, String> {
    map(
        many1(preceded(whitespace_or_comments, long_string_segment)),
        |segments| segments.concat(),
    )(input)
}

fn long_string_segment(input: &str) -> IResult<&str, String> {
    delimited(tag("'''"), long_string_body, tag("'''"))(input)
}

fn short_string_body(input: &str) -> IResult<&str, String> {
    fold_many0(short_string_fragment, String::new, |mut text, fragment| {
        append_fragment(&mut text, fragment);
        text
    })(input)
}

fn short_string_fragment(input: &str) -> IResult<&str, StringFragment> {
    alt((escaped_newline, escaped_char, short_string_substring))(input)
}

// A run of text that contains no quotes, escapes, or (illegal in a short string) raw
// line terminators.
fn short_string_substring(input: &str) -> IResult<&str, StringFragment> {
    map(is_not("\"\\\r\n"), StringFragment::Substring)(input)
}

fn long_string_body(input: &str) -> IResult<&str, String> {
    fold_many0(long_string_fragment, String::new, |mut text, fragment| {
        append_fragment(&mut text, fragment);
        text
    })(input)
}

fn long_string_fragment(input: &str) -> IResult<&str, StringFragment> {
    alt((escaped_newline, escaped_char, long_string_substring))(input)
}

// A run of text ending at an escape or at the segment-closing `'''`. A lone quote (or a
// pair of them) is ordinary content.
fn long_string_substring(input: &str) -> IResult<&str, StringFragment> {
    let mut end = 0;
    for (index, c) in input.char_indices() {
        if c == '\\' || (c == '\'' && input[index..].starts_with("'''")) {
            break;
        }
        end = index + c.len_utf8();
    }
    if end == 0 {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::TakeWhile1)));
    }
    Ok((&input[end..], StringFragment::Substring(&input[..end])))
}

#[cfg(test)]
mod string_parsing_tests {
    use super::*;
    use rstest::*;

    fn expect_string(text: &str, expected: &str) {
        let (_, value) = parse_string(text).unwrap();
        assert_eq!(value, TextValue::String(expected.to_string()));
    }

    #[rstest]
    #[case(r#""hello" "#, "hello")]
    #[case(r#""" "#, "")]
    #[case(r#""foo bar baz" "#, "foo bar baz")]
    #[case(r#""with \"escaped\" quotes" "#, "with \"escaped\" quotes")]
    #[case(r#""tab\tnewline\n" "#, "tab\tnewline\n")]
    #[case(r#""étude" "#, "étude")]
    #[case("\"split \\\nline\" ", "split line")]
    fn short_strings(#[case] text: &str, #[case] expected: &str) {
        expect_string(text, expected);
    }

    #[rstest]
    #[case("'''hello''' ", "hello")]
    #[case("''''''", "")]
    #[case("'''it''s''' ", "it's")]
    #[case("'''multi\nline''' ", "multi\nline")]
    #[case("'''seg''' '''ments''' ", "segments")]
    #[case("'''seg''' // comment\n '''ments''' ", "segments")]
    fn long_strings(#[case] text: &str, #[case] expected: &str) {
        expect_string(text, expected);
    }

    #[test]
    fn raw_newline_in_short_string_is_rejected() {
        assert!(parse_string("\"multi\nline\"").is_err());
    }

    #[test]
    fn unterminated_strings_are_rejected() {
        assert!(parse_string("\"no closing quote").is_err());
        assert!(parse_string("'''no closing quotes").is_err());
    }
}
