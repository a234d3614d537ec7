use std::io::Write;

use crate::binary::int::DecodedInt;
use crate::binary::raw_binary_writer::MAX_INLINE_LENGTH;
use crate::binary::var_int::VarInt;
use crate::binary::var_uint::VarUInt;
use crate::ion_eq::IonEq;
use crate::result::IonResult;
use crate::types::coefficient::{Coefficient, Sign};
use crate::types::decimal::Decimal;
use crate::types::integer::UInt;

const DECIMAL_POSITIVE_ZERO: Decimal = Decimal {
    coefficient: Coefficient {
        sign: Sign::Positive,
        magnitude: UInt::U64(0),
    },
    exponent: 0,
};

/// Provides support to write [Decimal] into [Ion binary].
///
/// [Ion binary]: https://amazon-ion.github.io/ion-docs/docs/binary.html#5-decimal
pub trait DecimalBinaryEncoder {
    /// Encodes the content of a [Decimal] as per the Ion binary encoding.
    /// Returns the length of the encoded bytes.
    ///
    /// This does not encode the type descriptor nor the associated length.
    /// Prefer [DecimalBinaryEncoder::encode_decimal_value] for that.
    fn encode_decimal(&mut self, decimal: &Decimal) -> IonResult<usize>;

    /// Encodes a [Decimal] as an Ion value with the type descriptor and length.
    /// Returns the length of the encoded bytes.
    fn encode_decimal_value(&mut self, decimal: &Decimal) -> IonResult<usize>;
}

impl<W> DecimalBinaryEncoder for W
where
    W: Write,
{
    fn encode_decimal(&mut self, decimal: &Decimal) -> IonResult<usize> {
        // 0d0 has no representation, as per the spec.
        if decimal.ion_eq(&DECIMAL_POSITIVE_ZERO) {
            return Ok(0);
        }

        let mut bytes_written: usize = 0;

        bytes_written += VarInt::write_i64(self, decimal.exponent)?;

        if decimal.coefficient.is_negative_zero() {
            bytes_written += DecodedInt::write_negative_zero(self)?;
            return Ok(bytes_written);
        }

        // If the coefficient is small enough to safely fit in an i64, use that to avoid
        // allocating.
        if let Some(small_coefficient) = decimal.coefficient.as_i64() {
            // From the spec: "The subfield should not be present (that is, it has zero
            // length) when the coefficient's value is (positive) zero."
            if small_coefficient != 0 {
                bytes_written += DecodedInt::write_i64(self, small_coefficient)?;
            }
        } else {
            // Otherwise, encode the magnitude's big-endian bytes with an explicit sign bit.
            let mut coefficient_bytes = match &decimal.coefficient.magnitude {
                UInt::U64(unsigned) => unsigned.to_be_bytes().to_vec(),
                UInt::BigUInt(big) => big.to_bytes_be(),
            };

            let first_byte: &mut u8 = &mut coefficient_bytes[0];
            let first_bit_is_zero: bool = *first_byte & 0b1000_0000 == 0;
            if let Sign::Negative = decimal.coefficient.sign {
                if first_bit_is_zero {
                    // If the first bit is unset, it's now the sign bit.
                    *first_byte |= 0b1000_0000;
                } else {
                    // Otherwise, an extra leading byte is needed to hold the set sign bit.
                    self.write_all(&[0b1000_0000])?;
                    bytes_written += 1;
                }
            } else if !first_bit_is_zero {
                // A non-negative coefficient whose first bit is set needs an extra leading
                // byte with an unset sign bit.
                self.write_all(&[0b0000_0000])?;
                bytes_written += 1;
            }
            self.write_all(coefficient_bytes.as_slice())?;
            bytes_written += coefficient_bytes.len();
        }

        Ok(bytes_written)
    }

    fn encode_decimal_value(&mut self, decimal: &Decimal) -> IonResult<usize> {
        let mut bytes_written: usize = 0;
        // Encode the decimal body first; the encoded length is needed to write the type
        // descriptor.
        let mut encoded: Vec<u8> = Vec::with_capacity(16);
        encoded.encode_decimal(decimal)?;

        if encoded.len() <= MAX_INLINE_LENGTH {
            let type_descriptor: u8 = 0x50 | encoded.len() as u8;
            self.write_all(&[type_descriptor])?;
            bytes_written += 1;
        } else {
            self.write_all(&[0x5E])?;
            bytes_written += 1;
            bytes_written += VarUInt::write_u64(self, encoded.len() as u64)?;
        }

        self.write_all(&encoded[..])?;
        bytes_written += encoded.len();

        Ok(bytes_written)
    }
}

#[cfg(test)]
mod binary_decimal_tests {
    use super::*;
    use num_bigint::BigUint;
    use rstest::*;
    use std::str::FromStr;

    /// The special decimal value 0d0 is equal to, but not Ion-equivalent to, other zeros.
    #[test]
    fn decimal_0d0_is_a_special_zero_value() {
        assert_eq!(DECIMAL_POSITIVE_ZERO, Decimal::new(0, 0));
        assert!(DECIMAL_POSITIVE_ZERO.ion_eq(&Decimal::new(0, 0)));

        assert_eq!(DECIMAL_POSITIVE_ZERO, Decimal::new(0, 10));
        assert!(!DECIMAL_POSITIVE_ZERO.ion_eq(&Decimal::new(0, 10)));
    }

    #[rstest]
    #[case::exactly_zero(Decimal::new(0, 0), 1)]
    #[case::zero_with_nonzero_exponent(Decimal::new(0, 10), 2)]
    #[case::negative_zero(Decimal::negative_zero(), 3)]
    #[case::meaning_of_life(Decimal::new(42, 0), 3)]
    fn bytes_written(#[case] input: Decimal, #[case] expected: usize) -> IonResult<()> {
        let mut buf = vec![];
        let written = buf.encode_decimal_value(&input)?;
        assert_eq!(buf.len(), expected);
        assert_eq!(written, expected);
        Ok(())
    }

    #[test]
    fn large_coefficients_are_sign_extended() -> IonResult<()> {
        // A magnitude whose first bit is set requires a leading sign byte
        let decimal = Decimal::new(Coefficient::new(Sign::Positive, 0x80u64), 0);
        let mut buf = vec![];
        buf.encode_decimal(&decimal)?;
        assert_eq!(buf, &[0x80, 0x00, 0x80]);
        Ok(())
    }

    #[test]
    fn arbitrary_precision_coefficient() -> IonResult<()> {
        let big = BigUint::from_str("123456789123456789123456789123456789").unwrap();
        let decimal = Decimal::new(Coefficient::new(Sign::Negative, big), -35);
        let mut buf = vec![];
        let written = buf.encode_decimal(&decimal)?;
        assert!(written > 15);
        Ok(())
    }
}
