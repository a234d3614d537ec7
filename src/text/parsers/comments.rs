use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while, take_while1};
use nom::combinator::recognize;
use nom::multi::many0_count;
use nom::sequence::{delimited, preceded};
use nom::IResult;

fn is_ion_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{0b}' | '\u{0c}')
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while1(is_ion_whitespace)(input)
}

/// Matches a `//` comment, which continues until the end of the current line.
fn rest_of_line_comment(input: &str) -> IResult<&str, &str> {
    preceded(tag("//"), take_while(|c| c != '\n'))(input)
}

/// Matches a `/* */` comment, which continues until the closing delimiter.
fn block_comment(input: &str) -> IResult<&str, &str> {
    delimited(tag("/*"), take_until("*/"), tag("*/"))(input)
}

/// Matches any amount of whitespace and comments, including none at all.
pub(crate) fn whitespace_or_comments(input: &str) -> IResult<&str, &str> {
    recognize(many0_count(alt((
        whitespace,
        rest_of_line_comment,
        block_comment,
    ))))(input)
}

#[cfg(test)]
mod comment_parsing_tests {
    use super::*;

    #[test]
    fn trivia_is_consumed() {
        let (remaining, _) = whitespace_or_comments(" \t\n// a comment\n/* another\n one */5").unwrap();
        assert_eq!(remaining, "5");
    }

    #[test]
    fn no_trivia_is_fine() {
        let (remaining, consumed) = whitespace_or_comments("5").unwrap();
        assert_eq!(remaining, "5");
        assert_eq!(consumed, "");
    }

    #[test]
    fn unterminated_block_comment_fails() {
        // The comment parser matches zero comments, leaving the `/*` behind for the value
        // parser to reject.
        let (remaining, _) = whitespace_or_comments("/* no closing delimiter").unwrap();
        assert_eq!(remaining, "/* no closing delimiter");
    }
}
