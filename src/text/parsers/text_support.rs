use nom::branch::alt;
use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::{char, one_of};
use nom::combinator::{eof, map, map_opt, peek, value};
use nom::sequence::preceded;
use nom::IResult;

/// Matches (without consuming) a character that can legally follow a keyword or numeric
/// value: whitespace, a container delimiter, a separator, the start of a comment, or the
/// start of a quoted value.
pub(crate) fn stop_character(input: &str) -> IResult<&str, ()> {
    alt((
        value((), peek(one_of(" \t\r\n\u{0b}\u{0c}{}[](),\"'/"))),
        value((), eof),
    ))(input)
}

/// A fragment of a quoted string or symbol: either a run of unescaped text, a single
/// character produced by an escape sequence, or an escaped newline (which produces nothing).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StringFragment<'a> {
    EscapedNewline,
    EscapedChar(char),
    Substring(&'a str),
}

/// Appends the content of a [StringFragment] to the text being assembled.
pub(crate) fn append_fragment(sink: &mut String, fragment: StringFragment) {
    match fragment {
        StringFragment::EscapedNewline => {}
        StringFragment::EscapedChar(c) => sink.push(c),
        StringFragment::Substring(s) => sink.push_str(s),
    }
}

/// Matches a backslash followed by a line terminator; the pair joins adjacent lines without
/// contributing any text.
pub(crate) fn escaped_newline(input: &str) -> IResult<&str, StringFragment> {
    value(
        StringFragment::EscapedNewline,
        alt((tag("\\\r\n"), tag("\\\n"), tag("\\\r"))),
    )(input)
}

/// Matches an escape sequence of any kind and returns the character it represents.
pub(crate) fn escaped_char(input: &str) -> IResult<&str, StringFragment> {
    map(
        preceded(
            char('\\'),
            alt((escaped_char_unicode, escaped_char_no_unicode)),
        ),
        StringFragment::EscapedChar,
    )(input)
}

/// Matches an escape sequence allowed in clobs (no `\u`/`\U`; clob content stays in the
/// one-byte range) and returns the character it represents.
pub(crate) fn escaped_char_clob(input: &str) -> IResult<&str, StringFragment> {
    map(
        preceded(
            char('\\'),
            alt((escaped_char_hex_byte, escaped_char_no_unicode)),
        ),
        StringFragment::EscapedChar,
    )(input)
}

/// Matches the C-style single-character escape codes.
pub(crate) fn escaped_char_no_unicode(input: &str) -> IResult<&str, char> {
    map_opt(one_of("ntr\\/\"'?0abvf"), |c| match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '\\' => Some('\\'),
        '/' => Some('/'),
        '"' => Some('"'),
        '\'' => Some('\''),
        '?' => Some('?'),
        '0' => Some('\0'),
        'a' => Some('\u{07}'),
        'b' => Some('\u{08}'),
        'v' => Some('\u{0b}'),
        'f' => Some('\u{0c}'),
        _ => None,
    })(input)
}

/// Matches a `\xHH` escape.
fn escaped_char_hex_byte(input: &str) -> IResult<&str, char> {
    map_opt(
        preceded(char('x'), hex_digits_of_length(2)),
        |hex: &str| {
            u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
        },
    )(input)
}

/// Matches a `\xHH`, `\uHHHH`, or `\UHHHHHHHH` escape and returns the code point it names.
pub(crate) fn escaped_char_unicode(input: &str) -> IResult<&str, char> {
    map_opt(
        alt((
            preceded(char('x'), hex_digits_of_length(2)),
            preceded(char('u'), hex_digits_of_length(4)),
            preceded(char('U'), hex_digits_of_length(8)),
        )),
        |hex: &str| {
            u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
        },
    )(input)
}

fn hex_digits_of_length(length: usize) -> impl Fn(&str) -> IResult<&str, &str> {
    move |input| take_while_m_n(length, length, |c: char| c.is_ascii_hexdigit())(input)
}

#[cfg(test)]
mod text_support_tests {
    use super::*;

    #[test]
    fn stop_characters() {
        assert!(stop_character(" after").is_ok());
        assert!(stop_character(",").is_ok());
        assert!(stop_character("]").is_ok());
        assert!(stop_character("").is_ok());
        assert!(stop_character("x").is_err());
        assert!(stop_character(":").is_err());
    }

    #[test]
    fn escapes() {
        assert_eq!(
            escaped_char("\\n"),
            Ok(("", StringFragment::EscapedChar('\n')))
        );
        assert_eq!(
            escaped_char("\\x41"),
            Ok(("", StringFragment::EscapedChar('A')))
        );
        assert_eq!(
            escaped_char("\\u00e9"),
            Ok(("", StringFragment::EscapedChar('é')))
        );
        assert_eq!(
            escaped_char("\\U0001f600x"),
            Ok(("x", StringFragment::EscapedChar('\u{1f600}')))
        );
        assert!(escaped_char("\\q").is_err());
    }

    #[test]
    fn clob_escapes_exclude_unicode() {
        assert!(escaped_char_clob("\\u00e9").is_err());
        assert_eq!(
            escaped_char_clob("\\x41"),
            Ok(("", StringFragment::EscapedChar('A')))
        );
    }

}
