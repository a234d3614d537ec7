use nom::bytes::complete::{tag, take_while};
use nom::combinator::map_res;
use nom::sequence::delimited;
use nom::IResult;

use crate::text::text_value::TextValue;

/// Matches the text representation of a blob value and returns the decoded bytes as a
/// [TextValue::Blob]. The base64 data between the `{{` and `}}` delimiters may contain
/// whitespace but not comments.
pub(crate) fn parse_blob(input: &str) -> IResult<&str, TextValue> {
    map_res(
        delimited(tag("{{"), base64_data, tag("}}")),
        |base64_text: &str| {
            let sanitized: String = base64_text
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            base64::decode(sanitized).map(TextValue::Blob).map_err(|_| ())
        },
    )(input)
}

fn base64_data(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| {
        c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || matches!(c, '+' | '/' | '=')
    })(input)
}
