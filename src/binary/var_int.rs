use std::io::Write;
use std::mem;

use crate::data_source::IonDataSource;
use crate::result::{decoding_error, IonResult};

type VarIntStorage = i64;

const BITS_PER_ENCODED_BYTE: u32 = 7;
const STORAGE_SIZE_IN_BITS: u32 = (mem::size_of::<VarIntStorage>() * 8) as u32;

const LOWER_6_BITMASK: u8 = 0b0011_1111;
const LOWER_7_BITMASK: u8 = 0b0111_1111;
const HIGHEST_BIT_VALUE: u8 = 0b1000_0000;

const VARINT_NEGATIVE_ZERO: u8 = 0b1100_0000;

/// A decoded
/// [VarInt](https://amazon-ion.github.io/ion-docs/docs/binary.html#varuint-and-varint-fields).
///
/// The sign bit is the second-highest bit of the first byte; the highest bit of every byte is
/// the end-of-encoding flag. A sign bit over a zero magnitude is negative zero, which Ion uses
/// to represent a timestamp's unknown offset.
#[derive(Debug)]
pub struct VarInt {
    size_in_bytes: usize,
    value: VarIntStorage,
    is_negative_zero: bool,
}

impl VarInt {
    /// Reads a VarInt from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R) -> IonResult<VarInt> {
        let mut magnitude: u64 = 0;
        let mut sign: VarIntStorage = 1;
        let mut is_first_byte = true;
        let mut overflowed = false;

        let mut byte_processor = |byte: u8| {
            if is_first_byte {
                is_first_byte = false;
                if byte & 0b0100_0000 != 0 {
                    sign = -1;
                }
                magnitude = (byte & LOWER_6_BITMASK) as u64;
            } else {
                // If the top seven bits are occupied, the next shift would lose them.
                overflowed |= magnitude >> (STORAGE_SIZE_IN_BITS - BITS_PER_ENCODED_BYTE) != 0;
                magnitude = (magnitude << BITS_PER_ENCODED_BYTE) | (byte & LOWER_7_BITMASK) as u64;
            }
            byte < HIGHEST_BIT_VALUE
        };

        let encoded_size_in_bytes = data_source.read_next_byte_while(&mut byte_processor)?;

        if overflowed || magnitude > VarIntStorage::MAX as u64 {
            return decoding_error(format!(
                "found a {encoded_size_in_bytes}-byte VarInt whose magnitude does not fit in an i64"
            ));
        }

        Ok(VarInt {
            size_in_bytes: encoded_size_in_bytes,
            value: magnitude as VarIntStorage * sign,
            is_negative_zero: magnitude == 0 && sign == -1,
        })
    }

    /// Encodes the provided value as a VarInt and writes it to the sink, returning the number
    /// of bytes written.
    pub fn write_i64<W: Write>(sink: &mut W, value: i64) -> IonResult<usize> {
        // An i64 has 63 bits of magnitude; that requires 10 VarInt bytes, of which the first
        // holds only six magnitude bits.
        const VAR_INT_BUFFER_SIZE: usize = 10;

        let mut buffer = [0u8; VAR_INT_BUFFER_SIZE];
        let is_negative = value < 0;
        let mut magnitude = value.unsigned_abs();

        if magnitude == 0 {
            let encoded: u8 = if is_negative {
                VARINT_NEGATIVE_ZERO
            } else {
                0b1000_0000
            };
            sink.write_all(&[encoded])?;
            return Ok(1);
        }

        // Fill the buffer from the rightmost byte backwards, seven bits at a time.
        let mut first_occupied_byte = VAR_INT_BUFFER_SIZE;
        for buffer_byte in buffer.iter_mut().rev() {
            first_occupied_byte -= 1;
            *buffer_byte = magnitude as u8 & LOWER_7_BITMASK;
            magnitude >>= BITS_PER_ENCODED_BYTE;
            if magnitude == 0 {
                break;
            }
        }

        // If the leading data byte has its sign-bit position occupied by a magnitude bit,
        // prepend a fresh byte to hold the sign.
        if buffer[first_occupied_byte] & 0b0100_0000 != 0 {
            first_occupied_byte -= 1;
        }
        if is_negative {
            buffer[first_occupied_byte] |= 0b0100_0000;
        }
        // Set the end flag on the final byte.
        buffer[VAR_INT_BUFFER_SIZE - 1] |= HIGHEST_BIT_VALUE;

        let encoded_bytes = &buffer[first_occupied_byte..];
        sink.write_all(encoded_bytes)?;
        Ok(encoded_bytes.len())
    }

    /// Writes a negative zero VarInt (`0b1100_0000`) to the sink. Used to encode a
    /// timestamp's unknown offset.
    pub fn write_negative_zero<W: Write>(sink: &mut W) -> IonResult<usize> {
        sink.write_all(&[VARINT_NEGATIVE_ZERO])?;
        Ok(1)
    }

    /// Returns the value of the signed integer. Note that a negative zero decodes to a value
    /// of zero; use [Self::is_negative_zero] to distinguish it.
    #[inline(always)]
    pub fn value(&self) -> VarIntStorage {
        self.value
    }

    /// Returns `true` if the encoding had a sign bit over a zero magnitude.
    #[inline(always)]
    pub fn is_negative_zero(&self) -> bool {
        self.is_negative_zero
    }

    /// Returns the number of bytes that were read from the data source to construct this
    /// signed integer.
    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::VarInt;
    use crate::result::IonResult;
    use std::io::Cursor;

    const ERROR_MESSAGE: &str = "Failed to read a VarInt from the provided data.";

    #[test]
    fn read_positive_var_int() {
        let var_int = VarInt::read(&mut Cursor::new(&[0b0011_1100, 0b0111_1111, 0b1111_1111]))
            .expect(ERROR_MESSAGE);
        assert_eq!(var_int.size_in_bytes(), 3);
        assert_eq!(var_int.value(), 985_983);
        assert!(!var_int.is_negative_zero());
    }

    #[test]
    fn read_negative_var_int() {
        let var_int = VarInt::read(&mut Cursor::new(&[0b0111_1100, 0b0111_1111, 0b1111_1111]))
            .expect(ERROR_MESSAGE);
        assert_eq!(var_int.size_in_bytes(), 3);
        assert_eq!(var_int.value(), -985_983);
    }

    #[test]
    fn read_var_int_zero() {
        let var_int = VarInt::read(&mut Cursor::new(&[0b1000_0000])).expect(ERROR_MESSAGE);
        assert_eq!(var_int.size_in_bytes(), 1);
        assert_eq!(var_int.value(), 0);
        assert!(!var_int.is_negative_zero());
    }

    #[test]
    fn read_negative_zero() {
        let var_int = VarInt::read(&mut Cursor::new(&[0b1100_0000])).expect(ERROR_MESSAGE);
        assert_eq!(var_int.size_in_bytes(), 1);
        assert_eq!(var_int.value(), 0);
        assert!(var_int.is_negative_zero());
    }

    #[test]
    fn read_var_int_minimum_two_byte_encoding() {
        let var_int =
            VarInt::read(&mut Cursor::new(&[0b0000_0000, 0b1100_0000])).expect(ERROR_MESSAGE);
        assert_eq!(var_int.size_in_bytes(), 2);
        assert_eq!(var_int.value(), 64);
    }

    fn var_int_encoding_test(value: i64, expected_encoding: &[u8]) -> IonResult<()> {
        let mut buffer = vec![];
        VarInt::write_i64(&mut buffer, value)?;
        assert_eq!(buffer.as_slice(), expected_encoding);
        Ok(())
    }

    #[test]
    fn write_var_int() -> IonResult<()> {
        var_int_encoding_test(0, &[0b1000_0000])?;
        var_int_encoding_test(17, &[0b1001_0001])?;
        var_int_encoding_test(-17, &[0b1101_0001])?;
        var_int_encoding_test(63, &[0b1011_1111])?;
        var_int_encoding_test(-63, &[0b1111_1111])?;
        // 64 needs a second byte; the first byte's sign-bit slot cannot hold magnitude
        var_int_encoding_test(64, &[0b0000_0000, 0b1100_0000])?;
        var_int_encoding_test(-64, &[0b0100_0000, 0b1100_0000])?;
        Ok(())
    }

    #[test]
    fn write_negative_zero() -> IonResult<()> {
        let mut buffer = vec![];
        VarInt::write_negative_zero(&mut buffer)?;
        assert_eq!(buffer.as_slice(), &[0b1100_0000]);
        Ok(())
    }

    #[test]
    fn roundtrip_extremes() -> IonResult<()> {
        for value in [i64::MAX, i64::MIN + 1, -1, 1, 0] {
            let mut buffer = vec![];
            VarInt::write_i64(&mut buffer, value)?;
            let decoded = VarInt::read(&mut buffer.as_slice())?;
            assert_eq!(decoded.value(), value, "roundtrip failed for {value}");
        }
        Ok(())
    }
}
