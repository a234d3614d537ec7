use std::io::Write;
use std::mem;

use crate::data_source::IonDataSource;
use crate::result::{decoding_error, IonResult};

const BITS_PER_ENCODED_BYTE: usize = 7;
const STORAGE_SIZE_IN_BITS: usize = mem::size_of::<usize>() * 8;
// Ceiling division without a conversion to f64:
// equivalent to ceil(STORAGE_SIZE_IN_BITS / BITS_PER_ENCODED_BYTE)
const MAX_ENCODED_SIZE_IN_BYTES: usize =
    (STORAGE_SIZE_IN_BITS + BITS_PER_ENCODED_BYTE - 1) / BITS_PER_ENCODED_BYTE;

const LOWER_7_BITMASK: u8 = 0b0111_1111;
const HIGHEST_BIT_VALUE: u8 = 0b1000_0000;

/// A decoded
/// [VarUInt](https://amazon-ion.github.io/ion-docs/docs/binary.html#varuint-and-varint-fields):
/// seven data bits per byte, big-endian, with the high bit of the final byte set as a
/// terminator.
#[derive(Debug)]
pub struct VarUInt {
    value: usize,
    size_in_bytes: usize,
}

impl VarUInt {
    /// Reads a VarUInt from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R) -> IonResult<VarUInt> {
        let mut magnitude: usize = 0;
        let mut is_first_byte = true;
        let mut overflow_risk = false;

        let mut byte_processor = |byte: u8| {
            overflow_risk |= is_first_byte && byte > 1u8;
            is_first_byte = false;
            let lower_seven = (LOWER_7_BITMASK & byte) as usize;
            magnitude = (magnitude << 7) | lower_seven;
            byte < HIGHEST_BIT_VALUE // A set high bit marks the final byte
        };

        let encoded_size_in_bytes = data_source.read_next_byte_while(&mut byte_processor)?;

        // Reject encodings that would not fit in the data type being used to house the decoded
        // value. An encoding of exactly MAX_ENCODED_SIZE_IN_BYTES bytes only fits if its first
        // byte contributed no more than a single bit. This single post-hoc branch keeps the
        // per-byte loop free of bookkeeping, at the cost of also rejecting inefficient
        // over-padded encodings of small values.
        if encoded_size_in_bytes > MAX_ENCODED_SIZE_IN_BYTES
            || encoded_size_in_bytes == MAX_ENCODED_SIZE_IN_BYTES && overflow_risk
        {
            return decoding_error(format!(
                "found a {encoded_size_in_bytes}-byte VarUInt. Max supported size is {MAX_ENCODED_SIZE_IN_BYTES} bytes."
            ));
        }

        Ok(VarUInt {
            size_in_bytes: encoded_size_in_bytes,
            value: magnitude,
        })
    }

    /// Encodes the given unsigned int value as a VarUInt and writes it to the
    /// sink, returning the number of bytes written.
    pub fn write_u64<W: Write>(sink: &mut W, mut magnitude: u64) -> IonResult<usize> {
        // A u64 is 8 bytes of data. The VarUInt encoding will add a continuation bit to every
        // byte, plus one more termination bit, so the largest encoded size of a u64 is 10
        // bytes.
        const VAR_UINT_BUFFER_SIZE: usize = 10;

        // The last byte carries the terminator bit from the start; every other byte is
        // filled in (or left unused) below.
        let mut buffer: [u8; VAR_UINT_BUFFER_SIZE] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0b1000_0000];

        if magnitude == 0 {
            sink.write_all(&[0b1000_0000])?;
            return Ok(1);
        }

        // Fill the buffer back to front, seven bits at a time; `first_byte` ends up at the
        // start of the occupied region.
        let mut first_byte = VAR_UINT_BUFFER_SIZE as u64;
        for buffer_byte in buffer.iter_mut().rev() {
            first_byte -= 1;
            *buffer_byte |= magnitude as u8 & LOWER_7_BITMASK;
            magnitude >>= BITS_PER_ENCODED_BYTE;
            if magnitude == 0 {
                break;
            }
        }

        let encoded_bytes = &buffer[(first_byte as usize)..];
        sink.write_all(encoded_bytes)?;
        Ok(encoded_bytes.len())
    }

    /// Returns the number of bytes that would be needed to encode `magnitude` as a VarUInt.
    pub fn encoded_size_of(magnitude: u64) -> usize {
        let empty_leading_bits = magnitude.leading_zeros() as usize;
        let occupied_bits = 64 - empty_leading_bits;
        if occupied_bits == 0 {
            return 1;
        }
        (occupied_bits + BITS_PER_ENCODED_BYTE - 1) / BITS_PER_ENCODED_BYTE
    }

    /// Returns the magnitude of the unsigned integer.
    #[inline(always)]
    pub fn value(&self) -> usize {
        self.value
    }

    /// Returns the number of bytes that were read from the data source to construct this
    /// unsigned integer.
    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::VarUInt;
    use crate::result::IonResult;
    use std::io::{BufReader, Cursor};

    const ERROR_MESSAGE: &str = "Failed to read a VarUInt from the provided data.";

    #[test]
    fn read_var_uint() {
        let var_uint = VarUInt::read(&mut Cursor::new(&[0b0111_1001, 0b0000_1111, 0b1000_0001]))
            .expect(ERROR_MESSAGE);
        assert_eq!(var_uint.size_in_bytes(), 3);
        assert_eq!(var_uint.value(), 1_984_385);
    }

    #[test]
    fn read_var_uint_spanning_buffer_boundaries() {
        // A BufReader whose input buffer cannot hold all of the data at once
        // ensures that reads spanning multiple I/O operations work as expected
        let var_uint = VarUInt::read(&mut BufReader::with_capacity(
            1,
            Cursor::new(&[0b0111_1001, 0b0000_1111, 0b1000_0001]),
        ))
        .expect(ERROR_MESSAGE);
        assert_eq!(var_uint.size_in_bytes(), 3);
        assert_eq!(var_uint.value(), 1_984_385);
    }

    #[test]
    fn read_var_uint_zero() {
        let var_uint = VarUInt::read(&mut Cursor::new(&[0b1000_0000])).expect(ERROR_MESSAGE);
        assert_eq!(var_uint.size_in_bytes(), 1);
        assert_eq!(var_uint.value(), 0);
    }

    #[test]
    fn read_var_uint_two_byte_max_value() {
        let var_uint =
            VarUInt::read(&mut Cursor::new(&[0b0111_1111, 0b1111_1111])).expect(ERROR_MESSAGE);
        assert_eq!(var_uint.size_in_bytes(), 2);
        assert_eq!(var_uint.value(), 16_383);
    }

    #[test]
    fn read_var_uint_truncated() {
        // Continuation bits promise another byte, but the input ends
        VarUInt::read(&mut Cursor::new(&[0b0111_1111, 0b0111_1111]))
            .expect_err("this should have failed due to eof");
    }

    #[test]
    fn read_var_uint_overflow_detection() {
        VarUInt::read(&mut Cursor::new(&[
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b1111_1111, // 1 byte more than the maximum allowed on 64-bit systems
        ]))
        .expect_err("this should have failed due to overflow");
    }

    fn var_uint_encoding_test(value: u64, expected_encoding: &[u8]) -> IonResult<()> {
        let mut buffer = vec![];
        let encoded = VarUInt::write_u64(&mut buffer, value)?;
        assert_eq!(buffer.as_slice(), expected_encoding);
        assert_eq!(encoded, expected_encoding.len());
        assert_eq!(VarUInt::encoded_size_of(value), expected_encoding.len());
        Ok(())
    }

    #[test]
    fn write_var_uint() -> IonResult<()> {
        var_uint_encoding_test(0, &[0b1000_0000])?;
        var_uint_encoding_test(6, &[0b1000_0110])?;
        var_uint_encoding_test(17, &[0b1001_0001])?;
        var_uint_encoding_test(127, &[0b1111_1111])?;
        var_uint_encoding_test(128, &[0b0000_0001, 0b1000_0000])?;
        var_uint_encoding_test(777, &[0b0000_0110, 0b1000_1001])?;
        var_uint_encoding_test(16_383, &[0b0111_1111, 0b1111_1111])?;
        var_uint_encoding_test(400_600, &[0b0001_1000, 0b0011_1001, 0b1101_1000])?;
        Ok(())
    }

    #[test]
    fn roundtrip_u64_max() -> IonResult<()> {
        let mut buffer = Vec::new();
        let encoded_size = VarUInt::write_u64(&mut buffer, u64::MAX)?;
        assert_eq!(encoded_size, 10);
        let value = VarUInt::read(&mut buffer.as_slice())?;
        assert_eq!(value.value() as u64, u64::MAX);
        Ok(())
    }
}
