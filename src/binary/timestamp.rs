use std::io::Write;

use chrono::{Datelike, Timelike};

use crate::binary::decimal::DecimalBinaryEncoder;
use crate::binary::raw_binary_writer::MAX_INLINE_LENGTH;
use crate::binary::var_int::VarInt;
use crate::binary::var_uint::VarUInt;
use crate::result::IonResult;
use crate::types::timestamp::{Mantissa, Precision, Timestamp};

/// Provides support to write [Timestamp] into [Ion binary].
///
/// Timestamp bodies are encoded in UTC: the offset VarInt comes first (negative zero for an
/// unknown offset), followed by as many field VarUInts as the timestamp's precision calls
/// for, and finally the fractional seconds as a decimal exponent/coefficient pair.
///
/// [Ion binary]: https://amazon-ion.github.io/ion-docs/docs/binary.html#6-timestamp
pub trait TimestampBinaryEncoder {
    /// Encodes the content of a [Timestamp] as per the Ion binary encoding.
    /// Returns the length of the encoded bytes.
    ///
    /// This does not encode the type descriptor nor the associated length.
    /// Prefer [TimestampBinaryEncoder::encode_timestamp_value] for that.
    fn encode_timestamp(&mut self, timestamp: &Timestamp) -> IonResult<usize>;

    /// Encodes a [Timestamp] as an Ion value with the type descriptor and length.
    /// Returns the length of the encoded bytes.
    fn encode_timestamp_value(&mut self, timestamp: &Timestamp) -> IonResult<usize>;
}

impl<W> TimestampBinaryEncoder for W
where
    W: Write,
{
    fn encode_timestamp(&mut self, timestamp: &Timestamp) -> IonResult<usize> {
        const SECONDS_PER_MINUTE: i64 = 60;
        let mut bytes_written: usize = 0;

        // Each timestamp begins with its offset from UTC in minutes; an unknown offset is
        // negative zero.
        match timestamp.offset {
            Some(offset) => {
                let offset_minutes = offset.local_minus_utc() as i64 / SECONDS_PER_MINUTE;
                bytes_written += VarInt::write_i64(self, offset_minutes)?;
            }
            None => {
                bytes_written += VarInt::write_negative_zero(self)?;
            }
        }

        // The fields that follow are always UTC.
        let utc = &timestamp.date_time;
        bytes_written += VarUInt::write_u64(self, utc.year() as u64)?;
        if timestamp.precision >= Precision::Month {
            bytes_written += VarUInt::write_u64(self, utc.month() as u64)?;
        }
        if timestamp.precision >= Precision::Day {
            bytes_written += VarUInt::write_u64(self, utc.day() as u64)?;
        }
        if timestamp.precision >= Precision::HourAndMinute {
            bytes_written += VarUInt::write_u64(self, utc.hour() as u64)?;
            bytes_written += VarUInt::write_u64(self, utc.minute() as u64)?;
        }
        if timestamp.precision >= Precision::Second {
            bytes_written += VarUInt::write_u64(self, utc.second() as u64)?;
            match &timestamp.fractional_seconds {
                None => {}
                Some(Mantissa::Digits(0)) => {}
                Some(_) => {
                    // A fraction is encoded the way a decimal's body is; the coefficient
                    // subfield is omitted when it is zero.
                    let fraction = timestamp
                        .fractional_seconds_as_decimal()
                        .expect("a non-empty mantissa always converts to a decimal");
                    bytes_written += self.encode_decimal(&fraction)?;
                }
            }
        }

        Ok(bytes_written)
    }

    fn encode_timestamp_value(&mut self, timestamp: &Timestamp) -> IonResult<usize> {
        let mut bytes_written: usize = 0;
        // Encode the timestamp body first; its length is needed to write the type
        // descriptor.
        let mut encoded: Vec<u8> = Vec::with_capacity(16);
        encoded.encode_timestamp(timestamp)?;

        if encoded.len() <= MAX_INLINE_LENGTH {
            let type_descriptor: u8 = 0x60 | encoded.len() as u8;
            self.write_all(&[type_descriptor])?;
            bytes_written += 1;
        } else {
            self.write_all(&[0x6E])?;
            bytes_written += 1;
            bytes_written += VarUInt::write_u64(self, encoded.len() as u64)?;
        }

        self.write_all(&encoded[..])?;
        bytes_written += encoded.len();

        Ok(bytes_written)
    }
}
