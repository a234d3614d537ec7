use std::convert::TryFrom;

use crate::binary::ion_type_code::IonTypeCode;
use crate::result::{decoding_error, IonResult};
use crate::types::IonType;

/// Contains all of the information found in the header byte of a binary Ion value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// The type of value that this header describes, if the type code maps to one.
    /// NOP pads, the IVM, and annotation wrappers have no corresponding IonType.
    pub ion_type: Option<IonType>,
    /// The type code from the header byte's high nibble.
    pub ion_type_code: IonTypeCode,
    /// The length code from the header byte's low nibble. Its interpretation depends on the
    /// type code; see [length_codes](crate::binary::constants::v1_0::length_codes).
    pub length_code: u8,
}

impl Header {
    /// Parses the provided byte into a [Header], rejecting the reserved type code.
    pub fn from_byte(byte: u8) -> IonResult<Header> {
        let ion_type_code = IonTypeCode::try_from(byte >> 4)?;
        if ion_type_code == IonTypeCode::Reserved {
            return decoding_error(format!(
                "found a type descriptor using the reserved type code: {byte:#04x}"
            ));
        }
        let length_code = byte & 0b0000_1111;
        let ion_type = IonType::try_from(ion_type_code).ok();
        Ok(Header {
            ion_type,
            ion_type_code,
            length_code,
        })
    }

    /// Assembles a header byte from a type code and length code.
    pub fn to_byte(ion_type_code: IonTypeCode, length_code: u8) -> u8 {
        (ion_type_code.to_u8() << 4) | (length_code & 0b0000_1111)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scalar_headers() -> IonResult<()> {
        let header = Header::from_byte(0x21)?;
        assert_eq!(header.ion_type, Some(IonType::Int));
        assert_eq!(header.ion_type_code, IonTypeCode::PositiveInteger);
        assert_eq!(header.length_code, 1);

        let header = Header::from_byte(0x5E)?;
        assert_eq!(header.ion_type, Some(IonType::Decimal));
        assert_eq!(header.length_code, 14);
        Ok(())
    }

    #[test]
    fn parse_nop_and_annotation_headers() -> IonResult<()> {
        let header = Header::from_byte(0x00)?;
        assert_eq!(header.ion_type, None);
        assert_eq!(header.ion_type_code, IonTypeCode::NullOrNop);

        let header = Header::from_byte(0xE5)?;
        assert_eq!(header.ion_type, None);
        assert_eq!(header.ion_type_code, IonTypeCode::AnnotationOrIvm);
        Ok(())
    }

    #[test]
    fn reserved_type_code_is_rejected() {
        assert!(Header::from_byte(0xF0).is_err());
        assert!(Header::from_byte(0xFF).is_err());
    }

    #[test]
    fn header_byte_assembly() {
        assert_eq!(Header::to_byte(IonTypeCode::String, 5), 0x85);
        assert_eq!(Header::to_byte(IonTypeCode::Struct, 14), 0xDE);
    }
}
