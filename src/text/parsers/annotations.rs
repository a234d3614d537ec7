use nom::bytes::complete::tag;
use nom::multi::many1;
use nom::sequence::{delimited, terminated};
use nom::IResult;

use crate::raw_symbol_token::RawSymbolToken;
use crate::text::parsers::comments::whitespace_or_comments;
use crate::text::parsers::symbol::parse_symbol_token;

/// Matches one or more annotations, each a symbol followed by `::`. Annotations bind more
/// tightly than any other syntax: in `a::b::7`, both symbols annotate the integer.
pub(crate) fn parse_annotations(input: &str) -> IResult<&str, Vec<RawSymbolToken>> {
    many1(parse_annotation)(input)
}

fn parse_annotation(input: &str) -> IResult<&str, RawSymbolToken> {
    terminated(
        parse_symbol_token,
        delimited(whitespace_or_comments, tag("::"), whitespace_or_comments),
    )(input)
}

#[cfg(test)]
mod annotation_parsing_tests {
    use super::*;

    fn text_token(text: &str) -> RawSymbolToken {
        RawSymbolToken::Text(text.to_string())
    }

    #[test]
    fn single_annotation() {
        let (remaining, annotations) = parse_annotations("foo::bar ").unwrap();
        assert_eq!(annotations, vec![text_token("foo")]);
        assert_eq!(remaining, "bar ");
    }

    #[test]
    fn multiple_annotations_with_whitespace() {
        let (remaining, annotations) = parse_annotations("foo :: 'bar baz' :: 7 ").unwrap();
        assert_eq!(
            annotations,
            vec![text_token("foo"), text_token("bar baz")]
        );
        assert_eq!(remaining, "7 ");
    }

    #[test]
    fn symbol_id_annotation() {
        let (_, annotations) = parse_annotations("$10::x ").unwrap();
        assert_eq!(annotations, vec![RawSymbolToken::SymbolId(10)]);
    }

    #[test]
    fn no_annotations() {
        assert!(parse_annotations("foo ").is_err());
        assert!(parse_annotations("foo:bar ").is_err());
    }
}
