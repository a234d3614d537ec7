use nom::bytes::complete::take_while1;
use nom::character::complete::{char, digit1};
use nom::combinator::recognize;
use nom::multi::many0_count;
use nom::sequence::pair;
use nom::IResult;

/// Matches one or more base-10 digits, allowing an underscore between any two digits.
/// (`1_000` is legal; `_1`, `1_`, and `1__0` are not.) A trailing underscore is simply left
/// unconsumed, where it will fail the value's terminator check.
pub(crate) fn digits_with_underscores(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, many0_count(pair(char('_'), digit1))))(input)
}

/// Matches one or more hexadecimal digits with optional underscores between them.
pub(crate) fn hex_digits_with_underscores(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_hexdigit()),
        many0_count(pair(char('_'), take_while1(|c: char| c.is_ascii_hexdigit()))),
    ))(input)
}

/// Matches one or more binary digits with optional underscores between them.
pub(crate) fn binary_digits_with_underscores(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c| c == '0' || c == '1'),
        many0_count(pair(char('_'), take_while1(|c| c == '0' || c == '1'))),
    ))(input)
}

/// Removes the underscore digit separators from a matched numeric lexeme.
pub(crate) fn strip_underscores(text: &str) -> String {
    text.replace('_', "")
}

/// Returns true if `digits` (with separators already stripped) has an illegal leading zero.
pub(crate) fn has_leading_zero(digits: &str) -> bool {
    digits.len() > 1 && digits.starts_with('0')
}
