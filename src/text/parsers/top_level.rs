use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1};
use nom::combinator::map_res;
use nom::sequence::{preceded, separated_pair, terminated};
use nom::IResult;

use crate::text::parsers::comments::whitespace_or_comments;
use crate::text::parsers::text_support::stop_character;
use crate::text::parsers::value::annotated_value;
use crate::text::text_value::AnnotatedTextValue;

/// Matches a value in stream position.
pub(crate) fn top_level_value(input: &str) -> IResult<&str, AnnotatedTextValue> {
    annotated_value(input)
}

/// Matches an Ion version marker: a bare, unannotated, unquoted symbol of the form
/// `$ion_X_Y` at the top level. Returns the (major, minor) version pair; the reader rejects
/// versions other than 1.0. A quoted or annotated `'$ion_1_0'` is an ordinary symbol and is
/// not matched here.
pub(crate) fn ion_version_marker(input: &str) -> IResult<&str, (u8, u8)> {
    preceded(
        whitespace_or_comments,
        terminated(
            preceded(
                tag("$ion_"),
                separated_pair(version_number, char('_'), version_number),
            ),
            stop_character,
        ),
    )(input)
}

fn version_number(input: &str) -> IResult<&str, u8> {
    map_res(digit1, |digits: &str| digits.parse::<u8>())(input)
}

#[cfg(test)]
mod top_level_parsing_tests {
    use super::*;
    use crate::text::text_value::TextValue;
    use crate::types::IonType;

    #[test]
    fn version_markers() {
        assert_eq!(ion_version_marker("$ion_1_0 ").unwrap().1, (1, 0));
        assert_eq!(ion_version_marker("  $ion_2_3\n").unwrap().1, (2, 3));
    }

    #[test]
    fn lookalikes_are_not_markers() {
        // An annotated or suffixed $ion_1_0 is a symbol
        assert!(ion_version_marker("$ion_1_0::foo ").is_err());
        assert!(ion_version_marker("$ion_1_0x ").is_err());
        assert!(ion_version_marker("'$ion_1_0' ").is_err());
        assert!(ion_version_marker("$ion_10 ").is_err());
    }

    #[test]
    fn top_level_values() {
        let (_, value) = top_level_value(" {a: 1} ").unwrap();
        assert_eq!(value.value(), &TextValue::StructStart);
        let (_, value) = top_level_value("// comment\n5 ").unwrap();
        assert_eq!(value.ion_type(), IonType::Int);
    }
}
