use std::cmp::Ordering;
use std::fmt;

use chrono::{
    DateTime, Datelike, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike,
};
use num_traits::ToPrimitive;

use crate::ion_eq::IonEq;
use crate::result::{invalid_timestamp, invalid_timestamp_raw, IonError, IonResult};
use crate::types::decimal::Decimal;
use crate::types::integer::UInt;

/// Indicates the most precise time unit that has been specified in the accompanying [Timestamp].
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub enum Precision {
    /// Year-level precision (e.g. `2020T`)
    Year,
    /// Month-level precision (e.g. `2020-08T`)
    Month,
    /// Day-level precision (e.g. `2020-08-01`)
    Day,
    /// Minute-level precision (e.g. `2020-08-01T12:34Z`)
    HourAndMinute,
    /// Second-level precision or greater (e.g. `2020-08-01T12:34:56.123Z`)
    Second,
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Year
    }
}

/// The fractional seconds of a [Timestamp], stored in whichever representation suits the
/// declared number of digits. Nine or fewer digits ride along in the timestamp's
/// [NaiveDateTime] nanoseconds field; `Digits` records how many of those digits are
/// significant. More than nine digits (or fractions parsed from arbitrary-precision text)
/// are stored exactly as a [Decimal] in the range `[0, 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mantissa {
    /// The number of digits of precision in the fractional seconds. For example, a value of
    /// `3` would indicate millisecond precision.
    Digits(u32),
    /// The fractional seconds stored exactly as a `Decimal`.
    Arbitrary(Decimal),
}

impl Mantissa {
    fn is_empty(&self) -> bool {
        match self {
            Mantissa::Digits(0) => true,
            Mantissa::Digits(_) => false,
            Mantissa::Arbitrary(d) => d.coefficient().is_zero() && d.exponent() == 0,
        }
    }

    fn decimals_equal(d1: &Decimal, d2: &Decimal) -> bool {
        // Coefficient zeros' signs don't have to match for fractional seconds.
        d1.ion_eq(d2)
            || (d1.coefficient().is_zero()
                && d2.coefficient().is_zero()
                && d1.exponent() == d2.exponent())
    }
}

const MAX_NANOSECOND_DIGITS: u32 = 9;
const NANOSECONDS_EXPONENT: i64 = -(MAX_NANOSECOND_DIGITS as i64);

/// Returns the first `num_digits` decimal digits of `value`, discarding the rest.
fn first_n_digits_of(num_digits: u32, value: u32) -> u32 {
    let total_digits = super::num_decimal_digits_in_u64(value as u64) as u32;
    if total_digits <= num_digits {
        return value;
    }
    value / 10u32.pow(total_digits - num_digits)
}

/// Represents a point in time to a specified degree of precision. Unlike `chrono`'s
/// [NaiveDateTime] and [DateTime], a `Timestamp` has variable precision ranging from a year
/// to fractional seconds of arbitrary resolution, and tracks whether its offset from UTC is
/// known.
///
/// The `date_time` field always stores its fields in UTC; a known `offset` is applied when
/// the timestamp is rendered as text or inspected via [DateTime].
#[derive(Debug, Clone)]
pub struct Timestamp {
    pub(crate) date_time: NaiveDateTime,
    pub(crate) offset: Option<FixedOffset>,
    pub(crate) precision: Precision,
    pub(crate) fractional_seconds: Option<Mantissa>,
}

impl Timestamp {
    /// Converts a [NaiveDateTime] or [DateTime<FixedOffset>] to a Timestamp with the specified
    /// precision. If the precision is [Precision::Second], nanosecond resolution is assumed.
    pub fn from_datetime<D>(datetime: D, precision: Precision) -> Timestamp
    where
        D: Datelike + Timelike + Into<Timestamp>,
    {
        let mut timestamp: Timestamp = datetime.into();
        if precision < Precision::Second {
            timestamp.fractional_seconds = None;
        }
        timestamp.precision = precision;
        timestamp
    }

    /// Creates a TimestampBuilder with the specified year and [Precision::Year].
    pub fn with_year(year: u32) -> MonthSetter {
        let builder = TimestampBuilder {
            year: year as u16,
            ..Default::default()
        };
        MonthSetter { builder }
    }

    /// Creates a TimestampBuilder with the specified year, month, and day and
    /// [Precision::Day].
    pub fn with_ymd(year: u32, month: u32, day: u32) -> HourAndMinuteSetter {
        let builder = Timestamp::with_year(year)
            .with_month(month)
            .with_day(day)
            .into_builder();
        HourAndMinuteSetter { builder }
    }

    /// Creates a TimestampBuilder with [Precision::Second].
    pub fn with_ymd_hms(
        year: u32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> FractionalSecondSetter {
        let builder = Timestamp::with_ymd(year, month, day)
            .with_hms(hour, minute, second)
            .into_builder();
        FractionalSecondSetter { builder }
    }

    /// Returns this Timestamp's offset from UTC in minutes, or `None` if the offset is
    /// unknown.
    pub fn offset(&self) -> Option<i32> {
        self.offset.map(|offset| offset.local_minus_utc() / 60)
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// If the precision is [Precision::Second], returns the number of digits declared for
    /// this Timestamp's fractional seconds; otherwise, returns None. The count may exceed
    /// the number of significant digits (`.120` has three digits of precision).
    pub fn fractional_seconds_scale(&self) -> Option<i64> {
        use Mantissa::*;
        match self.fractional_seconds.as_ref() {
            Some(Digits(number_of_digits)) => Some(*number_of_digits as i64),
            Some(Arbitrary(decimal)) => Some(decimal.scale()),
            None => None,
        }
    }

    /// If this Timestamp has fractional seconds, returns them as a [Decimal] in `[0, 1)`;
    /// otherwise, returns None.
    pub(crate) fn fractional_seconds_as_decimal(&self) -> Option<Decimal> {
        use Mantissa::*;
        match self.fractional_seconds.as_ref() {
            Some(Digits(number_of_digits)) => {
                let nanoseconds = self.date_time.nanosecond();
                let coefficient = if *number_of_digits <= MAX_NANOSECOND_DIGITS {
                    nanoseconds / 10u32.pow(MAX_NANOSECOND_DIGITS - *number_of_digits)
                } else {
                    nanoseconds
                };
                Some(Decimal::new(coefficient as u64, -i64::from(*number_of_digits)))
            }
            Some(Arbitrary(decimal)) => Some(decimal.clone()),
            None => None,
        }
    }

    /// Down-converts this Timestamp's fractional seconds to a number of nanoseconds,
    /// truncating digits beyond the ninth.
    fn fractional_seconds_as_nanoseconds(&self) -> Option<u32> {
        use Mantissa::*;
        match self.fractional_seconds.as_ref() {
            Some(Digits(_)) => Some(self.date_time.nanosecond()),
            Some(Arbitrary(decimal)) => {
                let exponent_delta = decimal.exponent() - NANOSECONDS_EXPONENT;
                let magnitude = match decimal.coefficient().magnitude() {
                    UInt::U64(magnitude) => *magnitude as u128,
                    UInt::BigUInt(magnitude) => match magnitude.to_u128() {
                        Some(magnitude) => magnitude,
                        // Magnitudes this large represent sub-nanosecond digits only.
                        None => return Some(0),
                    },
                };
                let nanoseconds = if exponent_delta >= 0 {
                    magnitude.saturating_mul(10u128.pow(exponent_delta as u32))
                } else if exponent_delta > -39 {
                    magnitude / 10u128.pow(exponent_delta.unsigned_abs() as u32)
                } else {
                    0
                };
                Some(nanoseconds as u32)
            }
            None => None,
        }
    }

    /// Tests the fractional seconds fields of two timestamps for Ion equivalence.
    fn fractional_seconds_equal(&self, other: &Timestamp) -> bool {
        use Mantissa::*;
        match (
            self.fractional_seconds.as_ref(),
            other.fractional_seconds.as_ref(),
        ) {
            (None, None) => true,
            (Some(m), None) => m.is_empty(),
            (None, Some(m)) => m.is_empty(),
            (Some(Digits(d1)), Some(Digits(d2))) => {
                if d1 != d2 {
                    return false;
                }
                let n1 = first_n_digits_of(*d1, self.date_time.nanosecond());
                let n2 = first_n_digits_of(*d2, other.date_time.nanosecond());
                n1 == n2
            }
            (Some(Arbitrary(d1)), Some(Arbitrary(d2))) => Mantissa::decimals_equal(d1, d2),
            _ => {
                let d1 = self.fractional_seconds_as_decimal().unwrap();
                let d2 = other.fractional_seconds_as_decimal().unwrap();
                Mantissa::decimals_equal(&d1, &d2)
            }
        }
    }

    /// Writes the fractional seconds portion of a text timestamp, including the leading `.`.
    pub(crate) fn format_fractional_seconds<W: fmt::Write>(&self, mut output: W) -> IonResult<()> {
        let mantissa = match self.fractional_seconds.as_ref() {
            None => return Ok(()),
            Some(mantissa) if mantissa.is_empty() => return Ok(()),
            Some(mantissa) => mantissa,
        };
        match mantissa {
            Mantissa::Digits(num_digits) => {
                // Scale the nanoseconds down to the requested number of digits.
                let scaled =
                    self.date_time.nanosecond() / 10u32.pow(MAX_NANOSECOND_DIGITS.saturating_sub(*num_digits));
                let actual_num_digits = super::num_decimal_digits_in_u64(scaled as u64) as u32;
                write!(output, ".")?;
                for _ in 0..num_digits.saturating_sub(actual_num_digits) {
                    write!(output, "0")?;
                }
                write!(output, "{scaled}")?;
            }
            Mantissa::Arbitrary(decimal) => {
                let num_digits = decimal.coefficient().number_of_decimal_digits();
                let abs_exponent = decimal.exponent().unsigned_abs();
                // The decimal is in [0, 1), so its exponent covers all of its digits.
                let num_leading_zeros = abs_exponent - num_digits.min(abs_exponent);
                write!(output, ".")?;
                for _ in 0..num_leading_zeros {
                    write!(output, "0")?;
                }
                if decimal.coefficient().is_zero() {
                    write!(output, "0")?;
                } else {
                    write!(output, "{}", decimal.coefficient().magnitude())?;
                }
            }
        }
        Ok(())
    }
}

/// Two Timestamps are considered equal if they represent the same instant in time, regardless
/// of precision or offset. Use [IonEq] when precision and offset-known-ness must also match.
impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        if !self.fractional_seconds_equal(other) {
            return false;
        }
        // Fields beyond a Timestamp's precision are set to their lowest legal value at
        // construction time, and `date_time` is already UTC, so the instants can be
        // compared directly once the fractional seconds have been checked.
        let self_datetime = self.date_time.with_nanosecond(0).unwrap();
        let other_datetime = other.date_time.with_nanosecond(0).unwrap();
        self_datetime == other_datetime
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let instant_ordering = self
            .date_time
            .with_nanosecond(0)
            .unwrap()
            .cmp(&other.date_time.with_nanosecond(0).unwrap());
        if instant_ordering != Ordering::Equal {
            return Some(instant_ordering);
        }
        let d1 = self
            .fractional_seconds_as_decimal()
            .unwrap_or_else(|| Decimal::new(0, 0));
        let d2 = other
            .fractional_seconds_as_decimal()
            .unwrap_or_else(|| Decimal::new(0, 0));
        d1.partial_cmp(&d2)
    }
}

impl IonEq for Timestamp {
    fn ion_eq(&self, other: &Self) -> bool {
        if self.precision != other.precision {
            return false;
        }
        // Offsets must match, including "unknown".
        if self.offset != other.offset {
            return false;
        }
        let self_dt = self.date_time;
        let other_dt = other.date_time;
        if self_dt.year() != other_dt.year() {
            return false;
        }
        if self.precision >= Precision::Month && self_dt.month() != other_dt.month() {
            return false;
        }
        if self.precision >= Precision::Day && self_dt.day() != other_dt.day() {
            return false;
        }
        if self.precision >= Precision::HourAndMinute
            && (self_dt.hour() != other_dt.hour() || self_dt.minute() != other_dt.minute())
        {
            return false;
        }
        if self.precision <= Precision::HourAndMinute {
            return true;
        }
        self_dt.second() == other_dt.second() && self.fractional_seconds_equal(other)
    }
}

/// A builder for incrementally configuring and finally instantiating a [Timestamp]. Users
/// interact with the typestate wrappers ([MonthSetter] through [FractionalSecondSetter]),
/// which only expose the transitions that can produce a valid Timestamp.
#[derive(Debug, Clone, Default)]
struct TimestampBuilder {
    fields_are_utc: bool,
    precision: Precision,
    offset: Option<i32>,
    year: u16,
    month: Option<u8>,
    day: Option<u8>,
    hour: Option<u8>,
    minute: Option<u8>,
    second: Option<u8>,
    fractional_seconds: Option<Mantissa>,
    nanoseconds: Option<u32>,
}

impl TimestampBuilder {
    fn configure_datetime<D>(&mut self, mut datetime: D) -> IonResult<D>
    where
        D: Datelike + Timelike + fmt::Debug,
    {
        if self.year == 0 || self.year > 9999 {
            return invalid_timestamp(format!("year '{}' is out of range (1-9999)", self.year));
        }
        datetime = datetime
            .with_year(self.year as i32)
            .ok_or_else(|| invalid_timestamp_raw(format!("year '{}' is invalid", self.year)))?;
        if self.precision == Precision::Year {
            return Ok(datetime);
        }

        let month = self.month.unwrap_or(1);
        datetime = datetime
            .with_month(month as u32)
            .ok_or_else(|| invalid_timestamp_raw(format!("month '{month}' is invalid")))?;
        if self.precision == Precision::Month {
            return Ok(datetime);
        }

        let day = self.day.unwrap_or(1);
        datetime = datetime.with_day(day as u32).ok_or_else(|| {
            invalid_timestamp_raw(format!(
                "day '{}' is invalid for {:0>4}-{:0>2}",
                day, self.year, month
            ))
        })?;
        if self.precision == Precision::Day {
            return Ok(datetime);
        }

        let hour = self.hour.unwrap_or(0);
        datetime = datetime
            .with_hour(hour as u32)
            .ok_or_else(|| invalid_timestamp_raw(format!("hour '{hour}' is invalid")))?;
        let minute = self.minute.unwrap_or(0);
        datetime = datetime
            .with_minute(minute as u32)
            .ok_or_else(|| invalid_timestamp_raw(format!("minute '{minute}' is invalid")))?;
        if self.precision == Precision::HourAndMinute {
            return Ok(datetime);
        }

        let second = self.second.unwrap_or(0);
        datetime = datetime
            .with_second(second as u32)
            .ok_or_else(|| invalid_timestamp_raw(format!("second '{second}' is invalid")))?;

        // If the fractional seconds are Digits, self.nanoseconds holds their value. If they
        // are Arbitrary, they live in the Timestamp beside the DateTime and the nanoseconds
        // field stays zero.
        datetime = datetime
            .with_nanosecond(self.nanoseconds.unwrap_or(0))
            .ok_or_else(|| {
                invalid_timestamp_raw(format!(
                    "nanosecond '{}' is invalid",
                    self.nanoseconds.unwrap_or(0)
                ))
            })?;

        Ok(datetime)
    }

    // Applies the provided offset to the NaiveDateTime, producing a DateTime<FixedOffset>.
    fn apply_offset(
        offset_minutes: i32,
        fields_are_utc: bool,
        datetime: NaiveDateTime,
    ) -> IonResult<DateTime<FixedOffset>> {
        const SECONDS_PER_MINUTE: i32 = 60;
        const MAX_OFFSET_MINUTES: i32 = 23 * 60 + 59;
        if offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return invalid_timestamp(format!(
                "offset ({offset_minutes} minutes) is outside of +/-23:59"
            ));
        }
        let offset_seconds = offset_minutes * SECONDS_PER_MINUTE;
        let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
            invalid_timestamp_raw(format!("offset ({offset_minutes} minutes) is invalid"))
        })?;

        if fields_are_utc {
            return Ok(offset.from_utc_datetime(&datetime));
        }

        match offset.from_local_datetime(&datetime) {
            LocalResult::Single(datetime) => Ok(datetime),
            LocalResult::None | LocalResult::Ambiguous(_, _) => invalid_timestamp(format!(
                "offset/datetime pair is invalid (offset={offset_minutes}, datetime={datetime})"
            )),
        }
    }

    fn build(mut self) -> IonResult<Timestamp> {
        // Offsets are only legal at minute precision and finer.
        if self.offset.is_some() && self.precision < Precision::HourAndMinute {
            return invalid_timestamp(format!(
                "a timestamp with {:?} precision cannot have an offset",
                self.precision
            ));
        }
        let mut datetime: NaiveDateTime = NaiveDate::from_ymd_opt(1, 1, 1)
            .unwrap()
            .and_hms_nano_opt(0, 0, 0, 0)
            .unwrap();
        datetime = self.configure_datetime(datetime)?;
        let mut timestamp: Timestamp = if let Some(offset_minutes) = self.offset {
            let datetime_with_offset =
                Self::apply_offset(offset_minutes, self.fields_are_utc, datetime)?;
            Timestamp::from_datetime(datetime_with_offset, self.precision)
        } else {
            Timestamp::from_datetime(datetime, self.precision)
        };

        if self.precision == Precision::Second {
            if let Some(Mantissa::Arbitrary(ref decimal)) = self.fractional_seconds {
                if decimal.is_less_than_zero() {
                    return invalid_timestamp("fractional seconds cannot be negative");
                }
                if decimal.is_greater_than_or_equal_to_one() {
                    return invalid_timestamp("fractional seconds must be less than 1.0");
                }
            }
            timestamp.fractional_seconds = self.fractional_seconds;
        }
        Ok(timestamp)
    }
}

/// Sets the `month` field, or builds a [Timestamp] with [Precision::Year].
#[derive(Debug, Clone)]
pub struct MonthSetter {
    builder: TimestampBuilder,
}

impl MonthSetter {
    // 1-indexed month
    pub fn with_month(self, month: u32) -> DaySetter {
        let mut builder = self.builder;
        builder.precision = Precision::Month;
        builder.month = Some(month as u8);
        DaySetter { builder }
    }

    pub fn build(self) -> IonResult<Timestamp> {
        self.into_builder().build()
    }
}

/// Sets the `day` field, or builds a [Timestamp] with [Precision::Month].
#[derive(Debug, Clone)]
pub struct DaySetter {
    builder: TimestampBuilder,
}

impl DaySetter {
    // 1-indexed day
    pub fn with_day(self, day: u32) -> HourAndMinuteSetter {
        let mut builder = self.builder;
        builder.precision = Precision::Day;
        builder.day = Some(day as u8);
        HourAndMinuteSetter { builder }
    }

    pub fn build(self) -> IonResult<Timestamp> {
        self.into_builder().build()
    }
}

/// Sets the `hour`/`minute` (or hour/minute/second) fields, or builds a [Timestamp] with
/// [Precision::Day].
#[derive(Debug, Clone)]
pub struct HourAndMinuteSetter {
    builder: TimestampBuilder,
}

impl HourAndMinuteSetter {
    pub fn with_hms(self, hour: u32, minute: u32, second: u32) -> FractionalSecondSetter {
        let mut builder = self.builder;
        builder.hour = Some(hour as u8);
        builder.minute = Some(minute as u8);
        builder.second = Some(second as u8);
        builder.precision = Precision::Second;
        FractionalSecondSetter { builder }
    }

    pub fn with_hour_and_minute(self, hour: u32, minute: u32) -> SecondSetter {
        let mut builder = self.builder;
        builder.precision = Precision::HourAndMinute;
        builder.hour = Some(hour as u8);
        builder.minute = Some(minute as u8);
        SecondSetter { builder }
    }

    pub fn build(self) -> IonResult<Timestamp> {
        self.into_builder().build()
    }
}

/// Sets the `second` field, or builds a [Timestamp] with [Precision::HourAndMinute] at a
/// known or unknown offset.
#[derive(Debug, Clone)]
pub struct SecondSetter {
    builder: TimestampBuilder,
}

impl SecondSetter {
    pub fn with_second(self, second: u32) -> FractionalSecondSetter {
        let mut builder = self.builder;
        builder.precision = Precision::Second;
        builder.second = Some(second as u8);
        FractionalSecondSetter { builder }
    }

    /// Sets the difference, in minutes, from UTC. The hour/minute fields already provided
    /// are interpreted as local to this offset.
    pub fn build_at_offset(mut self, offset_minutes: i32) -> IonResult<Timestamp> {
        self.builder.offset = Some(offset_minutes);
        self.into_builder().build()
    }

    /// Like [Self::build_at_offset], but the fields provided for each time unit are
    /// understood to be in UTC rather than in the local time of the specified offset.
    pub fn build_utc_fields_at_offset(mut self, offset_minutes: i32) -> IonResult<Timestamp> {
        self.builder.fields_are_utc = true;
        self.build_at_offset(offset_minutes)
    }

    pub fn build_at_unknown_offset(mut self) -> IonResult<Timestamp> {
        self.builder.offset = None;
        self.into_builder().build()
    }
}

/// Sets the fractional seconds, or builds a [Timestamp] with [Precision::Second] at a known
/// or unknown offset.
#[derive(Debug, Clone)]
pub struct FractionalSecondSetter {
    builder: TimestampBuilder,
}

impl FractionalSecondSetter {
    pub fn with_nanoseconds(self, nanosecond: u32) -> FractionalSecondSetter {
        let mut builder = self.builder;
        builder.fractional_seconds = Some(Mantissa::Digits(9));
        builder.nanoseconds = Some(nanosecond);
        FractionalSecondSetter { builder }
    }

    pub fn with_microseconds(self, microsecond: u32) -> FractionalSecondSetter {
        let mut builder = self.builder;
        builder.fractional_seconds = Some(Mantissa::Digits(6));
        builder.nanoseconds = Some(microsecond * 1000);
        FractionalSecondSetter { builder }
    }

    pub fn with_milliseconds(self, millisecond: u32) -> FractionalSecondSetter {
        let mut builder = self.builder;
        builder.fractional_seconds = Some(Mantissa::Digits(3));
        builder.nanoseconds = Some(millisecond * 1_000_000);
        FractionalSecondSetter { builder }
    }

    /// Declares `precision_digits` digits of fractional precision, with the value given in
    /// nanoseconds. This allows trailing zeros (`.120`) to be represented faithfully.
    pub fn with_nanoseconds_and_precision(
        self,
        nanoseconds: u32,
        precision_digits: u32,
    ) -> FractionalSecondSetter {
        let mut builder = self.builder;
        builder.fractional_seconds = Some(Mantissa::Digits(precision_digits));
        builder.nanoseconds = Some(nanoseconds);
        FractionalSecondSetter { builder }
    }

    /// Stores the provided decimal as the exact fractional seconds value. Required when the
    /// fraction has more than nine digits.
    pub fn with_fractional_seconds(self, fractional_seconds: Decimal) -> FractionalSecondSetter {
        let mut builder = self.builder;
        builder.fractional_seconds = Some(Mantissa::Arbitrary(fractional_seconds));
        builder.nanoseconds = None;
        FractionalSecondSetter { builder }
    }

    pub fn build_at_offset(mut self, offset_minutes: i32) -> IonResult<Timestamp> {
        self.builder.offset = Some(offset_minutes);
        self.into_builder().build()
    }

    pub fn build_utc_fields_at_offset(mut self, offset_minutes: i32) -> IonResult<Timestamp> {
        self.builder.fields_are_utc = true;
        self.build_at_offset(offset_minutes)
    }

    pub fn build_at_unknown_offset(mut self) -> IonResult<Timestamp> {
        self.builder.offset = None;
        self.into_builder().build()
    }
}

trait TimeUnitSetter {
    fn into_builder(self) -> TimestampBuilder;
}

macro_rules! impl_time_unit_setter_for {
    ($type_name:ty) => {
        impl TimeUnitSetter for $type_name {
            fn into_builder(self) -> TimestampBuilder {
                self.builder
            }
        }
    };
}

impl_time_unit_setter_for!(MonthSetter);
impl_time_unit_setter_for!(DaySetter);
impl_time_unit_setter_for!(HourAndMinuteSetter);
impl_time_unit_setter_for!(SecondSetter);
impl_time_unit_setter_for!(FractionalSecondSetter);

fn downconvert_to_naive_datetime_with_nanoseconds(timestamp: &Timestamp) -> NaiveDateTime {
    if timestamp.precision == Precision::Second {
        let nanoseconds = timestamp.fractional_seconds_as_nanoseconds().unwrap_or(0);
        timestamp.date_time.with_nanosecond(nanoseconds).unwrap()
    } else {
        timestamp.date_time
    }
}

// Allows a Timestamp with an unknown offset to be converted to a NaiveDateTime.
impl TryFrom<Timestamp> for NaiveDateTime {
    type Error = IonError;

    fn try_from(timestamp: Timestamp) -> Result<Self, Self::Error> {
        if timestamp.offset.is_some() {
            return invalid_timestamp(
                "cannot convert a Timestamp with a known offset into a NaiveDateTime",
            );
        }
        Ok(downconvert_to_naive_datetime_with_nanoseconds(&timestamp))
    }
}

impl TryFrom<Timestamp> for DateTime<FixedOffset> {
    type Error = IonError;

    fn try_from(timestamp: Timestamp) -> Result<Self, Self::Error> {
        let offset = match timestamp.offset {
            Some(offset) => offset,
            None => {
                return invalid_timestamp(
                    "cannot convert a Timestamp with an unknown offset into a DateTime<FixedOffset>",
                )
            }
        };
        let date_time = downconvert_to_naive_datetime_with_nanoseconds(&timestamp);
        Ok(offset.from_utc_datetime(&date_time))
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(date_time: NaiveDateTime) -> Self {
        Timestamp {
            date_time,
            offset: None,
            precision: Precision::Second,
            fractional_seconds: Some(Mantissa::Digits(9)),
        }
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(fixed_offset_date_time: DateTime<FixedOffset>) -> Self {
        // Store the fields in UTC, keeping the offset to the side
        let date_time = fixed_offset_date_time.naive_utc();
        let offset = Some(*fixed_offset_date_time.offset());
        Timestamp {
            date_time,
            offset,
            precision: Precision::Second,
            fractional_seconds: Some(Mantissa::Digits(9)),
        }
    }
}

#[cfg(test)]
mod timestamp_tests {
    use super::*;
    use rstest::*;

    fn fraction(coefficient: i64, exponent: i64) -> Decimal {
        Decimal::new(coefficient, exponent)
    }

    #[test]
    fn year_precision() -> IonResult<()> {
        let timestamp = Timestamp::with_year(2021).build()?;
        assert_eq!(timestamp.precision(), Precision::Year);
        assert_eq!(timestamp.offset(), None);
        assert_eq!(timestamp.date_time.year(), 2021);
        Ok(())
    }

    #[test]
    fn day_precision_rejects_offset() {
        // There is no public API for this state; the builder enforces it for the readers.
        let mut builder = Timestamp::with_ymd(2021, 2, 3).into_builder();
        builder.offset = Some(300);
        assert!(matches!(
            builder.build(),
            Err(IonError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn invalid_fields_are_rejected() {
        assert!(Timestamp::with_year(0).build().is_err());
        assert!(Timestamp::with_year(10_000).build().is_err());
        assert!(Timestamp::with_ymd(2021, 13, 1).build().is_err());
        assert!(Timestamp::with_ymd(2021, 2, 30).build().is_err());
        assert!(Timestamp::with_ymd_hms(2021, 2, 3, 24, 0, 0)
            .build_at_unknown_offset()
            .is_err());
    }

    #[test]
    fn fraction_must_be_less_than_one() {
        let result = Timestamp::with_ymd_hms(2021, 2, 3, 4, 5, 6)
            .with_fractional_seconds(fraction(15, -1))
            .build_at_unknown_offset();
        assert!(matches!(result, Err(IonError::InvalidTimestamp { .. })));
    }

    #[test]
    fn offset_out_of_range() {
        let result = Timestamp::with_ymd_hms(2021, 2, 3, 4, 5, 6).build_at_offset(24 * 60);
        assert!(matches!(result, Err(IonError::InvalidTimestamp { .. })));
    }

    #[test]
    fn instant_equality_ignores_offset() -> IonResult<()> {
        // 2021-02-03T12:00-05:00 == 2021-02-03T17:00Z
        let t1 = Timestamp::with_ymd(2021, 2, 3)
            .with_hour_and_minute(12, 0)
            .build_at_offset(-5 * 60)?;
        let t2 = Timestamp::with_ymd(2021, 2, 3)
            .with_hour_and_minute(17, 0)
            .build_at_offset(0)?;
        assert_eq!(t1, t2);
        assert!(!t1.ion_eq(&t2));
        Ok(())
    }

    #[test]
    fn ion_eq_requires_matching_precision() -> IonResult<()> {
        let t1 = Timestamp::with_year(2021).build()?;
        let t2 = Timestamp::with_year(2021).with_month(1).build()?;
        assert_eq!(t1, t2); // same instant
        assert!(!t1.ion_eq(&t2));
        Ok(())
    }

    #[test]
    fn ion_eq_requires_matching_fractional_precision() -> IonResult<()> {
        let t1 = Timestamp::with_ymd_hms(2021, 2, 3, 4, 5, 6)
            .with_milliseconds(100)
            .build_at_offset(60)?;
        let t2 = Timestamp::with_ymd_hms(2021, 2, 3, 4, 5, 6)
            .with_nanoseconds_and_precision(100_000_000, 1)
            .build_at_offset(60)?;
        assert_eq!(t1, t2); // .100 and .1 are the same instant
        assert!(!t1.ion_eq(&t2));
        Ok(())
    }

    #[test]
    fn unknown_offset_is_distinct_from_utc() -> IonResult<()> {
        let utc = Timestamp::with_ymd(2021, 2, 3)
            .with_hour_and_minute(4, 5)
            .build_at_offset(0)?;
        let unknown = Timestamp::with_ymd(2021, 2, 3)
            .with_hour_and_minute(4, 5)
            .build_at_unknown_offset()?;
        assert_eq!(utc, unknown); // same instant
        assert!(!utc.ion_eq(&unknown));
        Ok(())
    }

    #[test]
    fn fields_are_stored_in_utc() -> IonResult<()> {
        // 2007-02-24T01:02:03+23:59 is 2007-02-23T01:03:03Z
        let t = Timestamp::with_ymd_hms(2007, 2, 24, 1, 2, 3).build_at_offset(23 * 60 + 59)?;
        assert_eq!(t.date_time.day(), 23);
        assert_eq!(t.date_time.hour(), 1);
        assert_eq!(t.date_time.minute(), 3);
        assert_eq!(t.offset(), Some(23 * 60 + 59));
        Ok(())
    }

    #[rstest]
    #[case::milliseconds(Timestamp::with_ymd_hms(2021, 1, 1, 0, 0, 0).with_milliseconds(456), Some(3))]
    #[case::trailing_zeros(Timestamp::with_ymd_hms(2021, 1, 1, 0, 0, 0).with_nanoseconds_and_precision(120_000_000, 4), Some(4))]
    #[case::arbitrary(
        Timestamp::with_ymd_hms(2021, 1, 1, 0, 0, 0)
            .with_fractional_seconds(Decimal::new(123456789123i64, -12)),
        Some(12)
    )]
    fn fractional_scale(
        #[case] setter: FractionalSecondSetter,
        #[case] expected: Option<i64>,
    ) -> IonResult<()> {
        let timestamp = setter.build_at_unknown_offset()?;
        assert_eq!(timestamp.fractional_seconds_scale(), expected);
        Ok(())
    }

    #[test]
    fn fractional_seconds_as_decimal_preserves_trailing_zeros() -> IonResult<()> {
        let t = Timestamp::with_ymd_hms(2021, 1, 1, 0, 0, 0)
            .with_nanoseconds_and_precision(100_000_000, 3)
            .build_at_unknown_offset()?;
        let decimal = t.fractional_seconds_as_decimal().unwrap();
        assert!(decimal.ion_eq(&Decimal::new(100, -3)));
        Ok(())
    }

    #[test]
    fn format_fractional_seconds_pads_leading_zeros() -> IonResult<()> {
        let t = Timestamp::with_ymd_hms(2021, 1, 1, 0, 0, 0)
            .with_microseconds(9500)
            .build_at_unknown_offset()?;
        let mut text = String::new();
        t.format_fractional_seconds(&mut text)?;
        assert_eq!(text, ".009500");
        Ok(())
    }

    #[test]
    fn format_arbitrary_fractional_seconds() -> IonResult<()> {
        let t = Timestamp::with_ymd_hms(2021, 1, 1, 0, 0, 0)
            .with_fractional_seconds(Decimal::new(3, -12))
            .build_at_unknown_offset()?;
        let mut text = String::new();
        t.format_fractional_seconds(&mut text)?;
        assert_eq!(text, ".000000000003");
        Ok(())
    }
}
