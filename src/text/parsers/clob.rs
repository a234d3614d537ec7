use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::char;
use nom::combinator::{map, map_res};
use nom::error::{Error, ErrorKind};
use nom::multi::{fold_many0, many1};
use nom::sequence::{delimited, preceded};
use nom::IResult;

use crate::text::parsers::text_support::{
    append_fragment, escaped_char_clob, escaped_newline, StringFragment,
};
use crate::text::text_value::TextValue;

/// Matches the text representation of a clob value and returns its raw bytes as a
/// [TextValue::Clob]. A clob is a short- or long-form string inside `{{ }}` delimiters
/// whose content is restricted to printable ASCII; anything else must be escaped. Unicode
/// escapes are not permitted.
pub(crate) fn parse_clob(input: &str) -> IResult<&str, TextValue> {
    map_res(
        delimited(
            preceded(tag("{{"), clob_whitespace),
            alt((short_clob_body, long_clob_body)),
            preceded(clob_whitespace, tag("}}")),
        ),
        text_to_clob_bytes,
    )(input)
}

// Clob delimiters may be padded with whitespace, but not comments.
fn clob_whitespace(input: &str) -> IResult<&str, &str> {
    map(
        nom::bytes::complete::take_while(|c: char| c.is_ascii_whitespace()),
        |ws| ws,
    )(input)
}

// Every character in a clob must fall in the one-byte range.
fn text_to_clob_bytes(text: String) -> Result<TextValue, ()> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        let code_point = c as u32;
        if code_point > 0xFF {
            return Err(());
        }
        bytes.push(code_point as u8);
    }
    Ok(TextValue::Clob(bytes))
}

fn short_clob_body(input: &str) -> IResult<&str, String> {
    delimited(char('"'), short_clob_text, char('"'))(input)
}

// Long-form clob segments concatenate just as long strings do, but with whitespace-only
// separators.
fn long_clob_body(input: &str) -> IResult<&str, String> {
    map(
        many1(preceded(clob_whitespace, long_clob_segment)),
        |segments| segments.concat(),
    )(input)
}

fn long_clob_segment(input: &str) -> IResult<&str, String> {
    delimited(tag("'''"), long_clob_text, tag("'''"))(input)
}

fn short_clob_text(input: &str) -> IResult<&str, String> {
    fold_many0(short_clob_fragment, String::new, |mut text, fragment| {
        append_fragment(&mut text, fragment);
        text
    })(input)
}

fn short_clob_fragment(input: &str) -> IResult<&str, StringFragment> {
    alt((escaped_newline, escaped_char_clob, short_clob_substring))(input)
}

fn short_clob_substring(input: &str) -> IResult<&str, StringFragment> {
    map(
        take_while1(|c: char| is_clob_text_character(c) && c != '"'),
        StringFragment::Substring,
    )(input)
}

fn long_clob_text(input: &str) -> IResult<&str, String> {
    fold_many0(long_clob_fragment, String::new, |mut text, fragment| {
        append_fragment(&mut text, fragment);
        text
    })(input)
}

fn long_clob_fragment(input: &str) -> IResult<&str, StringFragment> {
    alt((escaped_newline, escaped_char_clob, long_clob_substring))(input)
}

fn long_clob_substring(input: &str) -> IResult<&str, StringFragment> {
    let mut end = 0;
    for (index, c) in input.char_indices() {
        if c == '\\' || (c == '\'' && input[index..].starts_with("'''")) {
            break;
        }
        if !is_clob_text_character(c) && c != '\n' && c != '\r' {
            break;
        }
        end = index + c.len_utf8();
    }
    if end == 0 {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::TakeWhile1)));
    }
    Ok((&input[end..], StringFragment::Substring(&input[..end])))
}

fn is_clob_text_character(c: char) -> bool {
    // Printable ASCII plus horizontal tab; everything else requires an escape
    matches!(c, ' '..='~' | '\t')
}
