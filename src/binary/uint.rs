use std::io;
use std::io::Write;
use std::mem;

use arrayvec::ArrayVec;
use num_bigint::BigUint;

use crate::data_source::IonDataSource;
use crate::result::{incomplete_data_error_raw, IonResult};
use crate::types::integer::UInt;

const MAX_UINT_SIZE_IN_BYTES: usize = mem::size_of::<u64>();

/// Represents a fixed-length unsigned integer. See the
/// [UInt and Int Fields](https://amazon-ion.github.io/ion-docs/docs/binary.html#uint-and-int-fields)
/// section of the binary Ion spec for more details.
#[derive(Debug)]
pub struct DecodedUInt {
    size_in_bytes: usize,
    value: UInt,
}

impl DecodedUInt {
    /// Reads a UInt with `length` bytes from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R, length: usize) -> IonResult<DecodedUInt> {
        if length <= MAX_UINT_SIZE_IN_BYTES {
            let mut buffer = [0u8; MAX_UINT_SIZE_IN_BYTES];
            read_exact_or_incomplete(data_source, &mut buffer[..length], "a UInt field")?;
            let magnitude = buffer[..length]
                .iter()
                .fold(0u64, |acc, byte| (acc << 8) | *byte as u64);
            return Ok(DecodedUInt {
                size_in_bytes: length,
                value: UInt::U64(magnitude),
            });
        }

        let mut buffer = vec![0u8; length];
        read_exact_or_incomplete(data_source, buffer.as_mut_slice(), "a UInt field")?;
        let magnitude = BigUint::from_bytes_be(buffer.as_slice());
        Ok(DecodedUInt {
            size_in_bytes: length,
            value: UInt::from(magnitude),
        })
    }

    /// Encodes the provided `magnitude` as a UInt using the smallest number of bytes that
    /// can represent it, and writes it to the sink. Returns the number of bytes written.
    pub fn write_u64<W: Write>(sink: &mut W, magnitude: u64) -> IonResult<usize> {
        let encoded = encode_u64(magnitude);
        sink.write_all(encoded.as_slice())?;
        Ok(encoded.len())
    }

    /// Encodes the provided [UInt] magnitude and writes it to the sink, returning the number
    /// of bytes written.
    pub fn write<W: Write>(sink: &mut W, magnitude: &UInt) -> IonResult<usize> {
        match magnitude {
            UInt::U64(magnitude) => Self::write_u64(sink, *magnitude),
            UInt::BigUInt(magnitude) => {
                let bytes = magnitude.to_bytes_be();
                sink.write_all(bytes.as_slice())?;
                Ok(bytes.len())
            }
        }
    }

    /// Returns the number of bytes needed to encode `magnitude` as a UInt. Zero requires no
    /// bytes at all, but many callsites must emit at least one; they handle that case
    /// themselves.
    pub fn encoded_size_of(magnitude: u64) -> usize {
        let leading_zero_bytes = magnitude.leading_zeros() as usize / 8;
        MAX_UINT_SIZE_IN_BYTES - leading_zero_bytes
    }

    /// Returns the magnitude of the unsigned integer.
    #[inline(always)]
    pub fn value(&self) -> &UInt {
        &self.value
    }

    /// Returns the number of bytes that were read from the data source to construct this
    /// unsigned integer.
    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

// Returns the minimal-length big-endian encoding of `magnitude` on the stack. Zero is
// encoded as a single 0x00 byte.
pub(crate) fn encode_u64(magnitude: u64) -> ArrayVec<u8, MAX_UINT_SIZE_IN_BYTES> {
    let be_bytes = magnitude.to_be_bytes();
    let first_occupied_byte = (magnitude.leading_zeros() as usize / 8).min(7);
    let mut encoded = ArrayVec::new();
    encoded
        .try_extend_from_slice(&be_bytes[first_occupied_byte..])
        .expect("an 8-byte buffer cannot overflow its own length");
    encoded
}

pub(crate) fn read_exact_or_incomplete<R: IonDataSource>(
    data_source: &mut R,
    buffer: &mut [u8],
    label: &'static str,
) -> IonResult<()> {
    let length = buffer.len();
    data_source.read_exact(buffer).map_err(|error| match error.kind() {
        io::ErrorKind::UnexpectedEof => incomplete_data_error_raw(label, length),
        _ => error.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use std::io::Cursor;
    use std::str::FromStr;

    #[test]
    fn read_one_byte_uint() {
        let uint = DecodedUInt::read(&mut Cursor::new(&[0b1000_0000]), 1).unwrap();
        assert_eq!(uint.size_in_bytes(), 1);
        assert_eq!(*uint.value(), UInt::U64(128));
    }

    #[test]
    fn read_two_byte_uint() {
        let uint = DecodedUInt::read(&mut Cursor::new(&[0b0111_1111, 0b1111_1111]), 2).unwrap();
        assert_eq!(uint.size_in_bytes(), 2);
        assert_eq!(*uint.value(), UInt::U64(32_767));
    }

    #[test]
    fn read_zero_length_uint_is_zero() {
        let uint = DecodedUInt::read(&mut Cursor::new(&[]), 0).unwrap();
        assert_eq!(uint.size_in_bytes(), 0);
        assert_eq!(*uint.value(), UInt::U64(0));
    }

    #[test]
    fn read_oversized_uint_promotes_to_big_uint() {
        let bytes = [0xFFu8; 12];
        let uint = DecodedUInt::read(&mut Cursor::new(&bytes), 12).unwrap();
        let expected = BigUint::from_str("79228162514264337593543950335").unwrap();
        assert_eq!(*uint.value(), UInt::BigUInt(expected));
    }

    #[test]
    fn read_truncated_uint_is_incomplete() {
        assert!(DecodedUInt::read(&mut Cursor::new(&[0x01]), 2).is_err());
    }

    #[test]
    fn write_u64_is_minimal() -> IonResult<()> {
        let mut buffer = vec![];
        DecodedUInt::write_u64(&mut buffer, 0x03_FF)?;
        assert_eq!(buffer.as_slice(), &[0x03, 0xFF]);
        assert_eq!(DecodedUInt::encoded_size_of(0x03_FF), 2);
        Ok(())
    }

    #[test]
    fn write_zero_occupies_one_byte() -> IonResult<()> {
        // UInt fields of length zero decode to zero, but when a length must be occupied
        // the canonical encoding is a single 0x00.
        let mut buffer = vec![];
        DecodedUInt::write_u64(&mut buffer, 0)?;
        assert_eq!(buffer.as_slice(), &[0x00]);
        Ok(())
    }

    #[test]
    fn roundtrip_u64_max() -> IonResult<()> {
        let mut buffer = vec![];
        let encoded_size = DecodedUInt::write_u64(&mut buffer, u64::MAX)?;
        assert_eq!(encoded_size, 8);
        let decoded = DecodedUInt::read(&mut buffer.as_slice(), 8)?;
        assert_eq!(*decoded.value(), UInt::U64(u64::MAX));
        Ok(())
    }
}
