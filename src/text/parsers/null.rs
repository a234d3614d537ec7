use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::char;
use nom::combinator::{map, map_opt, opt};
use nom::sequence::{preceded, terminated};
use nom::IResult;

use crate::text::parsers::text_support::stop_character;
use crate::text::text_value::TextValue;
use crate::types::IonType;

/// Matches the text representation of a null and returns the null's type as a
/// [TextValue::Null]. An unqualified `null` is `null.null`.
pub(crate) fn parse_null(input: &str) -> IResult<&str, TextValue> {
    map(
        terminated(
            preceded(tag("null"), opt(preceded(char('.'), ion_type_name))),
            stop_character,
        ),
        |ion_type| TextValue::Null(ion_type.unwrap_or(IonType::Null)),
    )(input)
}

fn ion_type_name(input: &str) -> IResult<&str, IonType> {
    map_opt(
        alt((
            tag("null"),
            tag("bool"),
            tag("int"),
            tag("float"),
            tag("decimal"),
            tag("timestamp"),
            tag("symbol"),
            tag("string"),
            tag("clob"),
            tag("blob"),
            tag("list"),
            tag("sexp"),
            tag("struct"),
        )),
        |name: &str| match name {
            "null" => Some(IonType::Null),
            "bool" => Some(IonType::Bool),
            "int" => Some(IonType::Int),
            "float" => Some(IonType::Float),
            "decimal" => Some(IonType::Decimal),
            "timestamp" => Some(IonType::Timestamp),
            "symbol" => Some(IonType::Symbol),
            "string" => Some(IonType::String),
            "clob" => Some(IonType::Clob),
            "blob" => Some(IonType::Blob),
            "list" => Some(IonType::List),
            "sexp" => Some(IonType::SExp),
            "struct" => Some(IonType::Struct),
            _ => None,
        },
    )(input)
}
