use std::io::Write;
use std::mem;

use num_bigint::{BigInt, Sign};

use crate::binary::uint::read_exact_or_incomplete;
use crate::data_source::IonDataSource;
use crate::result::IonResult;
use crate::types::integer::Int;

type IntStorage = i64;
const INT_NEGATIVE_ZERO: u8 = 0x80;

/// Represents a fixed-length signed integer, the sign-and-magnitude encoding used for
/// decimal coefficients and timestamp fractions. See the
/// [UInt and Int Fields](https://amazon-ion.github.io/ion-docs/docs/binary.html#uint-and-int-fields)
/// section of the binary Ion spec for more details.
#[derive(Debug)]
pub struct DecodedInt {
    size_in_bytes: usize,
    value: Int,
    // The encoding of a sign bit over an otherwise-zero magnitude. This is not a value that
    // `Int` can represent, but a decimal coefficient can be negative zero.
    is_negative_zero: bool,
}

impl DecodedInt {
    /// Reads an Int with `length` bytes from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R, length: usize) -> IonResult<DecodedInt> {
        if length == 0 {
            return Ok(DecodedInt {
                size_in_bytes: 0,
                value: Int::I64(0),
                is_negative_zero: false,
            });
        }

        if length <= mem::size_of::<IntStorage>() {
            let mut buffer = [0u8; mem::size_of::<IntStorage>()];
            read_exact_or_incomplete(data_source, &mut buffer[..length], "an Int field")?;
            let first_byte = buffer[0];
            let is_negative = first_byte & 0b1000_0000 != 0;
            let mut magnitude = (first_byte & 0b0111_1111) as u64;
            for byte in &buffer[1..length] {
                magnitude = (magnitude << 8) | *byte as u64;
            }
            // The first byte contributes 7 bits and each later byte 8, so an 8-byte Int has
            // at most 63 magnitude bits and always fits in an i64.
            let value = if is_negative {
                -(magnitude as IntStorage)
            } else {
                magnitude as IntStorage
            };
            return Ok(DecodedInt {
                size_in_bytes: length,
                value: Int::I64(value),
                is_negative_zero: is_negative && magnitude == 0,
            });
        }

        let mut buffer = vec![0u8; length];
        read_exact_or_incomplete(data_source, buffer.as_mut_slice(), "an Int field")?;
        let is_negative = buffer[0] & 0b1000_0000 != 0;
        buffer[0] &= 0b0111_1111;
        let sign = if is_negative { Sign::Minus } else { Sign::Plus };
        let magnitude = BigInt::from_bytes_be(sign, buffer.as_slice());
        let is_negative_zero = is_negative && magnitude.sign() == Sign::NoSign;
        Ok(DecodedInt {
            size_in_bytes: length,
            value: Int::from(magnitude),
            is_negative_zero,
        })
    }

    /// Encodes `value` in Ion's sign-and-magnitude form using the smallest number of bytes
    /// that can represent it and writes it to the sink, returning the number of bytes
    /// written. Zero is encoded as a single `0x00` byte.
    pub fn write_i64<W: Write>(sink: &mut W, value: i64) -> IonResult<usize> {
        let magnitude = value.unsigned_abs();
        // Leave room for a leading sign byte
        let mut buffer = [0u8; mem::size_of::<u64>() + 1];
        buffer[1..].copy_from_slice(&magnitude.to_be_bytes());
        let mut first_occupied_byte = 1 + (magnitude.leading_zeros() as usize / 8).min(7);
        // If the most significant magnitude bit collides with the sign bit's position,
        // an extra leading byte is needed to hold the sign.
        if buffer[first_occupied_byte] & 0b1000_0000 != 0 {
            first_occupied_byte -= 1;
        }
        if value < 0 {
            buffer[first_occupied_byte] |= 0b1000_0000;
        }
        let encoded_bytes = &buffer[first_occupied_byte..];
        sink.write_all(encoded_bytes)?;
        Ok(encoded_bytes.len())
    }

    /// Writes a sign bit over a zero magnitude (`0x80`), the encoding of a `-0` decimal
    /// coefficient.
    pub fn write_negative_zero<W: Write>(sink: &mut W) -> IonResult<usize> {
        sink.write_all(&[INT_NEGATIVE_ZERO])?;
        Ok(1)
    }

    #[inline(always)]
    pub fn value(&self) -> &Int {
        &self.value
    }

    /// Returns `true` if the encoding was a sign bit over a zero magnitude.
    #[inline(always)]
    pub fn is_negative_zero(&self) -> bool {
        self.is_negative_zero
    }

    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use std::io::Cursor;
    use std::str::FromStr;

    #[test]
    fn read_positive_int() {
        let int = DecodedInt::read(&mut Cursor::new(&[0b0011_1100, 0b1000_0001]), 2).unwrap();
        assert_eq!(*int.value(), Int::I64(15_489));
        assert_eq!(int.size_in_bytes(), 2);
    }

    #[test]
    fn read_negative_int() {
        let int = DecodedInt::read(&mut Cursor::new(&[0b1011_1100, 0b1000_0001]), 2).unwrap();
        assert_eq!(*int.value(), Int::I64(-15_489));
    }

    #[test]
    fn read_zero_length_int() {
        let int = DecodedInt::read(&mut Cursor::new(&[]), 0).unwrap();
        assert_eq!(*int.value(), Int::I64(0));
        assert!(!int.is_negative_zero());
    }

    #[test]
    fn read_negative_zero() {
        let int = DecodedInt::read(&mut Cursor::new(&[0b1000_0000]), 1).unwrap();
        assert_eq!(*int.value(), Int::I64(0));
        assert!(int.is_negative_zero());
    }

    #[test]
    fn read_big_int() {
        let bytes = [0x81u8, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let int = DecodedInt::read(&mut Cursor::new(&bytes), bytes.len()).unwrap();
        let expected = BigInt::from_str("-9444732965739290427391").unwrap();
        assert_eq!(*int.value(), Int::BigInt(expected));
    }

    fn int_encoding_test(value: i64, expected_encoding: &[u8]) -> IonResult<()> {
        let mut buffer = vec![];
        DecodedInt::write_i64(&mut buffer, value)?;
        assert_eq!(buffer.as_slice(), expected_encoding);
        Ok(())
    }

    #[test]
    fn write_i64() -> IonResult<()> {
        int_encoding_test(0, &[0x00])?;
        int_encoding_test(1, &[0x01])?;
        int_encoding_test(-1, &[0x81])?;
        int_encoding_test(127, &[0x7F])?;
        // 128's high bit collides with the sign position, forcing a second byte
        int_encoding_test(128, &[0x00, 0x80])?;
        int_encoding_test(-128, &[0x80, 0x80])?;
        int_encoding_test(-15_489, &[0b1011_1100, 0b1000_0001])?;
        Ok(())
    }

    #[test]
    fn write_negative_zero() -> IonResult<()> {
        let mut buffer = vec![];
        DecodedInt::write_negative_zero(&mut buffer)?;
        assert_eq!(buffer.as_slice(), &[0x80]);
        Ok(())
    }

    #[test]
    fn roundtrip_i64_extremes() -> IonResult<()> {
        for value in [i64::MIN, i64::MIN + 1, -1, 0, 1, i64::MAX] {
            let mut buffer = vec![];
            DecodedInt::write_i64(&mut buffer, value)?;
            let decoded = DecodedInt::read(&mut buffer.as_slice(), buffer.len())?;
            assert_eq!(decoded.value().as_i64()?, value, "roundtrip failed for {value}");
        }
        Ok(())
    }
}
