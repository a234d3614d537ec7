use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::combinator::map;
use nom::sequence::terminated;
use nom::IResult;

use crate::text::parsers::text_support::stop_character;
use crate::text::text_value::TextValue;

/// Matches the text representation of a boolean value and returns the resulting `true` or
/// `false` as a [TextValue::Bool].
pub(crate) fn parse_boolean(input: &str) -> IResult<&str, TextValue> {
    map(
        terminated(alt((tag("true"), tag("false"))), stop_character),
        |bool_text: &str| TextValue::Bool(bool_text == "true"),
    )(input)
}
