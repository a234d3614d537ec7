use nom::branch::alt;
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{map, map_res, opt};
use nom::sequence::{pair, preceded, separated_pair, terminated, tuple};
use nom::IResult;

use num_bigint::BigUint;

use crate::text::parsers::text_support::stop_character;
use crate::text::text_value::TextValue;
use crate::types::coefficient::{Coefficient, Sign};
use crate::types::decimal::Decimal;
use crate::types::integer::UInt;
use crate::types::timestamp::{FractionalSecondSetter, Timestamp};

/// Matches the text representation of a timestamp and returns it as a
/// [TextValue::Timestamp]. The lexical shape determines the timestamp's precision; the
/// fraction's digit count (including trailing zeros) and the offset's known-ness are
/// preserved.
pub(crate) fn parse_timestamp(input: &str) -> IResult<&str, TextValue> {
    terminated(
        alt((
            timestamp_precision_fractional_second,
            timestamp_precision_second,
            timestamp_precision_minute,
            timestamp_precision_day,
            timestamp_precision_month,
            timestamp_precision_year,
        )),
        stop_character,
    )(input)
}

fn timestamp_precision_year(input: &str) -> IResult<&str, TextValue> {
    map_res(terminated(year, char('T')), |year| {
        Timestamp::with_year(year)
            .build()
            .map(TextValue::Timestamp)
            .map_err(|_| ())
    })(input)
}

fn timestamp_precision_month(input: &str) -> IResult<&str, TextValue> {
    map_res(
        terminated(pair(year, preceded(char('-'), month)), char('T')),
        |(year, month)| {
            Timestamp::with_year(year)
                .with_month(month)
                .build()
                .map(TextValue::Timestamp)
                .map_err(|_| ())
        },
    )(input)
}

fn timestamp_precision_day(input: &str) -> IResult<&str, TextValue> {
    map_res(terminated(date, opt(char('T'))), |(year, month, day)| {
        Timestamp::with_ymd(year, month, day)
            .build()
            .map(TextValue::Timestamp)
            .map_err(|_| ())
    })(input)
}

fn timestamp_precision_minute(input: &str) -> IResult<&str, TextValue> {
    map_res(
        tuple((date, preceded(char('T'), hour_and_minute), timezone_offset)),
        |((year, month, day), (hour, minute), offset)| {
            let builder = Timestamp::with_ymd(year, month, day).with_hour_and_minute(hour, minute);
            match offset {
                Some(minutes) => builder.build_at_offset(minutes),
                None => builder.build_at_unknown_offset(),
            }
            .map(TextValue::Timestamp)
            .map_err(|_| ())
        },
    )(input)
}

fn timestamp_precision_second(input: &str) -> IResult<&str, TextValue> {
    map_res(
        tuple((
            date,
            preceded(char('T'), hour_and_minute),
            preceded(char(':'), second),
            timezone_offset,
        )),
        |((year, month, day), (hour, minute), second, offset)| {
            let builder = Timestamp::with_ymd_hms(year, month, day, hour, minute, second);
            match offset {
                Some(minutes) => builder.build_at_offset(minutes),
                None => builder.build_at_unknown_offset(),
            }
            .map(TextValue::Timestamp)
            .map_err(|_| ())
        },
    )(input)
}

fn timestamp_precision_fractional_second(input: &str) -> IResult<&str, TextValue> {
    map_res(
        tuple((
            date,
            preceded(char('T'), hour_and_minute),
            preceded(char(':'), second),
            preceded(char('.'), digit1),
            timezone_offset,
        )),
        |((year, month, day), (hour, minute), second, fraction_digits, offset)| {
            let setter = Timestamp::with_ymd_hms(year, month, day, hour, minute, second);
            let setter = with_parsed_fraction(setter, fraction_digits)?;
            match offset {
                Some(minutes) => setter.build_at_offset(minutes),
                None => setter.build_at_unknown_offset(),
            }
            .map(TextValue::Timestamp)
            .map_err(|_| ())
        },
    )(input)
}

// Applies the fraction's digits to the builder, preserving the declared digit count.
// Fractions of more than nine digits cannot be represented as nanoseconds and are stored
// as an exact decimal instead.
fn with_parsed_fraction(
    setter: FractionalSecondSetter,
    fraction_digits: &str,
) -> Result<FractionalSecondSetter, ()> {
    let number_of_digits = fraction_digits.len() as u32;
    if number_of_digits <= 9 {
        let magnitude: u32 = fraction_digits.parse().map_err(|_| ())?;
        let nanoseconds = magnitude * 10u32.pow(9 - number_of_digits);
        return Ok(setter.with_nanoseconds_and_precision(nanoseconds, number_of_digits));
    }
    let magnitude = BigUint::parse_bytes(fraction_digits.as_bytes(), 10).ok_or(())?;
    let coefficient = Coefficient::new(Sign::Positive, UInt::from(magnitude));
    let fraction = Decimal::new(coefficient, -(number_of_digits as i64));
    Ok(setter.with_fractional_seconds(fraction))
}

fn year(input: &str) -> IResult<&str, u32> {
    digit_field(input, 4)
}

fn month(input: &str) -> IResult<&str, u32> {
    digit_field(input, 2)
}

fn date(input: &str) -> IResult<&str, (u32, u32, u32)> {
    map(
        tuple((
            year,
            preceded(char('-'), month),
            preceded(char('-'), |i| digit_field(i, 2)),
        )),
        |(year, month, day)| (year, month, day),
    )(input)
}

fn hour_and_minute(input: &str) -> IResult<&str, (u32, u32)> {
    separated_pair(|i| digit_field(i, 2), char(':'), |i| digit_field(i, 2))(input)
}

fn second(input: &str) -> IResult<&str, u32> {
    digit_field(input, 2)
}

fn digit_field(input: &str, length: usize) -> IResult<&str, u32> {
    map_res(
        take_while_m_n(length, length, |c: char| c.is_ascii_digit()),
        |digits: &str| digits.parse::<u32>(),
    )(input)
}

/// Matches a timezone offset: `Z`, `+hh:mm`, or `-hh:mm`. `-00:00` is the unknown offset,
/// returned as `None`.
fn timezone_offset(input: &str) -> IResult<&str, Option<i32>> {
    alt((
        map(char('Z'), |_| Some(0)),
        map(
            tuple((
                one_of("+-"),
                |i| digit_field(i, 2),
                preceded(char(':'), |i| digit_field(i, 2)),
            )),
            |(sign, hours, minutes)| {
                let offset_minutes = (hours * 60 + minutes) as i32;
                match (sign, offset_minutes) {
                    ('-', 0) => None, // unknown offset
                    ('-', _) => Some(-offset_minutes),
                    _ => Some(offset_minutes),
                }
            },
        ),
    ))(input)
}

#[cfg(test)]
mod timestamp_parsing_tests {
    use super::*;
    use crate::ion_eq::IonEq;
    use crate::result::IonResult;
    use crate::types::timestamp::Precision;

    fn expect_timestamp(text: &str, expected: Timestamp) {
        let (_, value) = parse_timestamp(text).unwrap();
        match value {
            TextValue::Timestamp(actual) => assert!(
                actual.ion_eq(&expected),
                "expected {expected:?}, found {actual:?}"
            ),
            other => panic!("expected a timestamp, found {other:?}"),
        }
    }

    #[test]
    fn year_precision() -> IonResult<()> {
        expect_timestamp("2007T ", Timestamp::with_year(2007).build()?);
        Ok(())
    }

    #[test]
    fn month_precision() -> IonResult<()> {
        expect_timestamp("2007-02T ", Timestamp::with_year(2007).with_month(2).build()?);
        Ok(())
    }

    #[test]
    fn day_precision_with_and_without_t() -> IonResult<()> {
        let expected = Timestamp::with_ymd(2007, 2, 23).build()?;
        expect_timestamp("2007-02-23 ", expected.clone());
        expect_timestamp("2007-02-23T ", expected);
        Ok(())
    }

    #[test]
    fn minute_precision() -> IonResult<()> {
        expect_timestamp(
            "2007-02-23T12:14Z ",
            Timestamp::with_ymd(2007, 2, 23)
                .with_hour_and_minute(12, 14)
                .build_at_offset(0)?,
        );
        expect_timestamp(
            "2007-02-23T12:14-00:00 ",
            Timestamp::with_ymd(2007, 2, 23)
                .with_hour_and_minute(12, 14)
                .build_at_unknown_offset()?,
        );
        Ok(())
    }

    #[test]
    fn second_precision() -> IonResult<()> {
        expect_timestamp(
            "2007-02-23T12:14:33Z ",
            Timestamp::with_ymd_hms(2007, 2, 23, 12, 14, 33).build_at_offset(0)?,
        );
        Ok(())
    }

    #[test]
    fn fractional_second_precision_preserves_digit_count() -> IonResult<()> {
        expect_timestamp(
            "2007-02-23T00:00:00.456+23:59 ",
            Timestamp::with_ymd_hms(2007, 2, 23, 0, 0, 0)
                .with_milliseconds(456)
                .build_at_offset(23 * 60 + 59)?,
        );
        expect_timestamp(
            "2007-02-23T00:00:00.10Z ",
            Timestamp::with_ymd_hms(2007, 2, 23, 0, 0, 0)
                .with_nanoseconds_and_precision(100_000_000, 2)
                .build_at_offset(0)?,
        );
        Ok(())
    }

    #[test]
    fn more_than_nine_fractional_digits_are_exact() {
        let (_, value) = parse_timestamp("2007-02-23T00:00:00.000000000005Z ").unwrap();
        match value {
            TextValue::Timestamp(timestamp) => {
                assert_eq!(timestamp.fractional_seconds_scale(), Some(12));
            }
            other => panic!("expected a timestamp, found {other:?}"),
        }
    }

    #[test]
    fn negative_offset() -> IonResult<()> {
        expect_timestamp(
            "2007-02-23T12:14-05:00 ",
            Timestamp::with_ymd(2007, 2, 23)
                .with_hour_and_minute(12, 14)
                .build_at_offset(-5 * 60)?,
        );
        Ok(())
    }

    #[test]
    fn rejected_timestamps() {
        // Dates at day precision or coarser never have an offset
        assert!(parse_timestamp("2007-02-23T12 ").is_err()); // hour requires minute
        assert!(parse_timestamp("2007 ").is_err()); // int, not a timestamp
        assert!(parse_timestamp("2007-02 ").is_err()); // month requires T
        assert!(parse_timestamp("2007-13-01 ").is_err()); // no 13th month
        assert!(parse_timestamp("2007-02-30 ").is_err()); // no Feb 30th
        assert!(parse_timestamp("2007-02-23T12:14 ").is_err()); // time requires an offset
    }

    #[test]
    fn instant_equality_across_offsets() {
        let (_, v1) = parse_timestamp("2000-01-01T00:00:00+00:00 ").unwrap();
        let (_, v2) = parse_timestamp("1999-12-31T19:00:00-05:00 ").unwrap();
        let (t1, t2) = match (v1, v2) {
            (TextValue::Timestamp(t1), TextValue::Timestamp(t2)) => (t1, t2),
            _ => unreachable!(),
        };
        assert_eq!(t1, t2);
        assert_eq!(t1.precision(), Precision::Second);
        assert!(!t1.ion_eq(&t2)); // offsets differ
    }
}
