use num_bigint::BigInt;

use crate::binary::constants::v1_0::{length_codes, IVM};
use crate::binary::header::Header;
use crate::binary::int::DecodedInt;
use crate::binary::ion_type_code::IonTypeCode;
use crate::binary::uint::DecodedUInt;
use crate::binary::var_int::VarInt;
use crate::binary::var_uint::VarUInt;
use crate::data_source::IonDataSource;
use crate::raw_reader::{RawReader, RawStreamItem};
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{
    decoding_error, decoding_error_raw, illegal_operation, incomplete_data_error, IonError,
    IonResult,
};
use crate::types::integer::{Int, UInt};
use crate::types::timestamp::Timestamp;
use crate::types::{Decimal, IonType};

/// The header information and input positions of the value over which the reader is currently
/// parked.
#[derive(Copy, Clone, Debug)]
struct EncodedValue {
    header: Header,
    is_null: bool,
    // Offset of the first byte of the value's body
    value_start: usize,
    length_in_bytes: usize,
}

impl EncodedValue {
    fn value_end(&self) -> usize {
        self.value_start + self.length_in_bytes
    }
}

#[derive(Copy, Clone, Debug)]
struct Container {
    ion_type: IonType,
    // The absolute input offset one past this container's final byte
    end_position: usize,
}

/// A raw reader that parses binary Ion from any [IonDataSource].
///
/// The reader tracks its absolute position in the input; each container on the `parents`
/// stack records where its body ends, which is how end-of-container and overrun conditions
/// are detected. A structural error (malformed data, unexpected EOF, I/O failure) permanently
/// fails the reader: the offending error is stored and returned from every subsequent call.
pub struct RawBinaryReader<R: IonDataSource> {
    data_source: R,
    // Scratch space for read_slice calls that span input buffer boundaries
    buffer: Vec<u8>,
    bytes_read: usize,
    ion_version: (u8, u8),
    parents: Vec<Container>,
    annotations: Vec<RawSymbolToken>,
    field_name: Option<RawSymbolToken>,
    current_item: RawStreamItem,
    encoded_value: Option<EncodedValue>,
    value_consumed: bool,
    failure: Option<IonError>,
}

impl<R: IonDataSource> RawBinaryReader<R> {
    pub fn new(data_source: R) -> RawBinaryReader<R> {
        RawBinaryReader {
            data_source,
            buffer: Vec::with_capacity(512),
            bytes_read: 0,
            ion_version: (1, 0),
            parents: Vec::new(),
            annotations: Vec::new(),
            field_name: None,
            current_item: RawStreamItem::Nothing,
            encoded_value: None,
            value_consumed: false,
            failure: None,
        }
    }

    /// The number of bytes that have been consumed from the data source so far.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    fn check_failure(&self) -> IonResult<()> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    // Stores structural errors so that they can be resurfaced by later calls; the reader
    // cannot recover its position after one.
    fn fail<T>(&mut self, error: IonError) -> IonResult<T> {
        use IonError::*;
        if matches!(
            error,
            DecodingError { .. } | UnexpectedEof { .. } | IoError { .. }
        ) {
            self.failure = Some(error.clone());
        }
        Err(error)
    }

    fn next_byte(&mut self) -> IonResult<Option<u8>> {
        let byte = self.data_source.next_byte()?;
        if byte.is_some() {
            self.bytes_read += 1;
        }
        Ok(byte)
    }

    fn next_byte_required(&mut self, label: &'static str) -> IonResult<u8> {
        match self.next_byte()? {
            Some(byte) => Ok(byte),
            None => incomplete_data_error(label, self.bytes_read),
        }
    }

    fn skip_bytes(&mut self, number_of_bytes: usize) -> IonResult<()> {
        self.data_source.skip_bytes(number_of_bytes)?;
        self.bytes_read += number_of_bytes;
        Ok(())
    }

    fn read_var_uint(&mut self) -> IonResult<VarUInt> {
        let var_uint = VarUInt::read(&mut self.data_source)?;
        self.bytes_read += var_uint.size_in_bytes();
        Ok(var_uint)
    }

    fn read_var_int(&mut self) -> IonResult<VarInt> {
        let var_int = VarInt::read(&mut self.data_source)?;
        self.bytes_read += var_int.size_in_bytes();
        Ok(var_int)
    }

    fn read_uint(&mut self, length: usize) -> IonResult<DecodedUInt> {
        let uint = DecodedUInt::read(&mut self.data_source, length)?;
        self.bytes_read += uint.size_in_bytes();
        Ok(uint)
    }

    fn read_int_bytes(&mut self, length: usize) -> IonResult<DecodedInt> {
        let int = DecodedInt::read(&mut self.data_source, length)?;
        self.bytes_read += int.size_in_bytes();
        Ok(int)
    }

    // Discards any bytes of the current value that have not been consumed, leaving the
    // cursor at the start of the next item at this depth.
    fn skip_current_value(&mut self) -> IonResult<()> {
        if let Some(encoded_value) = self.encoded_value.take() {
            let remaining = encoded_value.value_end().saturating_sub(self.bytes_read);
            if remaining > 0 {
                self.skip_bytes(remaining)?;
            }
        }
        Ok(())
    }

    fn advance_to_next_item(&mut self) -> IonResult<RawStreamItem> {
        self.skip_current_value()?;
        self.annotations.clear();
        self.field_name = None;
        self.value_consumed = false;

        'next_item: loop {
            // If the cursor has reached the end of its parent container, park there until
            // the application calls step_out().
            if let Some(parent) = self.parents.last() {
                if self.bytes_read >= parent.end_position {
                    if self.bytes_read > parent.end_position {
                        return decoding_error(format!(
                            "a value overran the end of its parent {} at offset {}",
                            parent.ion_type, parent.end_position
                        ));
                    }
                    return Ok(RawStreamItem::Nothing);
                }
            }

            self.field_name = None;
            if self.parent_type() == Some(IonType::Struct) {
                let field_id = self.read_var_uint()?;
                self.field_name = Some(RawSymbolToken::SymbolId(field_id.value()));
            }

            let mut header_byte = match self.next_byte()? {
                Some(byte) => byte,
                None => {
                    if self.parents.is_empty() && self.field_name.is_none() {
                        return Ok(RawStreamItem::Nothing);
                    }
                    return incomplete_data_error("a type descriptor", self.bytes_read);
                }
            };

            // Offset one past the end of the enclosing annotation wrapper, if any
            let mut wrapper_end: Option<usize> = None;
            loop {
                if header_byte == 0xE0 && self.parents.is_empty() && wrapper_end.is_none() {
                    return self.read_ivm();
                }
                let header = Header::from_byte(header_byte)?;
                match header.ion_type_code {
                    IonTypeCode::NullOrNop if header.length_code != length_codes::NULL => {
                        // NOP padding
                        if wrapper_end.is_some() {
                            return decoding_error(
                                "found a NOP pad inside an annotation wrapper",
                            );
                        }
                        let pad_length = self.read_standard_length(header.length_code)?;
                        self.skip_bytes(pad_length)?;
                        continue 'next_item;
                    }
                    IonTypeCode::AnnotationOrIvm => {
                        if wrapper_end.is_some() {
                            return decoding_error(
                                "found an annotation wrapper inside another annotation wrapper",
                            );
                        }
                        wrapper_end = Some(self.read_annotations_wrapper(&header)?);
                        header_byte = self.next_byte_required("an annotated value")?;
                        continue;
                    }
                    _ => {
                        let (length_in_bytes, is_null) = self.read_value_length(&header)?;
                        let value_start = self.bytes_read;
                        let encoded_value = EncodedValue {
                            header,
                            is_null,
                            value_start,
                            length_in_bytes,
                        };
                        if let Some(wrapper_end) = wrapper_end {
                            if encoded_value.value_end() != wrapper_end {
                                return decoding_error(format!(
                                    "annotation wrapper length does not agree with its value's length (wrapper ends at {}, value at {})",
                                    wrapper_end, encoded_value.value_end()
                                ));
                            }
                        }
                        if let Some(parent) = self.parents.last() {
                            if encoded_value.value_end() > parent.end_position {
                                return decoding_error(format!(
                                    "a {} value runs past the end of its parent {}",
                                    header.ion_type.unwrap(),
                                    parent.ion_type
                                ));
                            }
                        }
                        // Only type codes with a corresponding IonType remain
                        let ion_type = header.ion_type.ok_or_else(|| {
                            decoding_error_raw(format!(
                                "type code {:?} cannot begin a value",
                                header.ion_type_code
                            ))
                        })?;
                        self.encoded_value = Some(encoded_value);
                        self.value_consumed = false;
                        return Ok(RawStreamItem::nullable_value(ion_type, is_null));
                    }
                }
            }
        }
    }

    // The `0xE0` that introduces an IVM has already been consumed.
    fn read_ivm(&mut self) -> IonResult<RawStreamItem> {
        let major = self.next_byte_required("an Ion version marker")?;
        let minor = self.next_byte_required("an Ion version marker")?;
        let end = self.next_byte_required("an Ion version marker")?;
        if end != IVM[3] {
            return decoding_error(format!(
                "invalid Ion version marker: E0 {major:02X} {minor:02X} {end:02X}"
            ));
        }
        if (major, minor) != (1, 0) {
            return decoding_error(format!(
                "this implementation only supports Ion v1.0, found v{major}.{minor}"
            ));
        }
        self.ion_version = (major, minor);
        Ok(RawStreamItem::VersionMarker(major, minor))
    }

    // Interprets a length code of 0-13 as a literal length and 14 as a VarUInt-prefixed
    // length. A length code of 15 (null) never reaches this method.
    fn read_standard_length(&mut self, length_code: u8) -> IonResult<usize> {
        match length_code {
            length_codes::VAR_UINT => Ok(self.read_var_uint()?.value()),
            code if code < length_codes::VAR_UINT => Ok(code as usize),
            code => decoding_error(format!("{code} is not a valid length code")),
        }
    }

    fn read_value_length(&mut self, header: &Header) -> IonResult<(usize, bool)> {
        use IonTypeCode::*;
        if header.length_code == length_codes::NULL {
            return Ok((0, true));
        }
        let length = match header.ion_type_code {
            Boolean => match header.length_code {
                0 | 1 => 0,
                code => {
                    return decoding_error(format!("{code} is not a valid boolean length code"))
                }
            },
            Float => match header.length_code {
                0 => 0,
                4 => 4,
                8 => 8,
                code => {
                    return decoding_error(format!(
                        "floats must be 0, 4, or 8 bytes long; found length code {code}"
                    ))
                }
            },
            NegativeInteger if header.length_code == 0 => {
                return decoding_error(
                    "found a negative integer (type code 3) with a zero magnitude",
                );
            }
            Struct if header.length_code == 1 => {
                // Length code 1 promises that the struct's fields are in ascending symbol ID
                // order. The ordering is not depended upon, but the encoding must be accepted.
                let length = self.read_var_uint()?.value();
                if length == 0 {
                    return decoding_error("found an empty struct claiming sorted field order");
                }
                length
            }
            _ => self.read_standard_length(header.length_code)?,
        };
        Ok((length, false))
    }

    // Reads the wrapper's own length, then the annotation sequence within it. Returns the
    // input offset at which the wrapper (and therefore its enclosed value) must end.
    fn read_annotations_wrapper(&mut self, header: &Header) -> IonResult<usize> {
        if header.length_code == length_codes::NULL {
            return decoding_error("annotation wrappers cannot be null");
        }
        let wrapper_length = self.read_standard_length(header.length_code)?;
        if wrapper_length == 0 {
            return decoding_error("found an annotation wrapper with no enclosed value");
        }
        let wrapper_end = self.bytes_read + wrapper_length;
        let annotations_length = self.read_var_uint()?;
        if annotations_length.value() == 0 {
            return decoding_error("found an annotation wrapper with no annotations");
        }
        let annotations_end = self.bytes_read + annotations_length.value();
        while self.bytes_read < annotations_end {
            let sid = self.read_var_uint()?;
            self.annotations.push(RawSymbolToken::SymbolId(sid.value()));
        }
        if self.bytes_read != annotations_end {
            return decoding_error("annotation symbol IDs overran their declared length");
        }
        Ok(wrapper_end)
    }

    // Confirms that the reader is parked on an unconsumed, non-null value of the expected
    // type and returns a copy of its encoding details.
    fn value_to_read(&mut self, expected: IonType, operation: &str) -> IonResult<EncodedValue> {
        self.check_failure()?;
        let encoded_value = match self.encoded_value {
            Some(encoded_value) => encoded_value,
            None => {
                return illegal_operation(format!(
                    "{operation} called when the reader was not positioned on a value"
                ))
            }
        };
        let ion_type = encoded_value
            .header
            .ion_type
            .expect("encoded values always have an ion type");
        if ion_type != expected {
            return illegal_operation(format!("{operation} called on a {ion_type} value"));
        }
        if encoded_value.is_null {
            return illegal_operation(format!("{operation} called on a null.{ion_type}"));
        }
        if self.value_consumed {
            return illegal_operation(format!(
                "{operation} called on a value that has already been consumed"
            ));
        }
        Ok(encoded_value)
    }

    fn read_body_bytes(&mut self, length: usize) -> IonResult<Vec<u8>> {
        let RawBinaryReader {
            data_source,
            buffer,
            ..
        } = self;
        let bytes =
            data_source.read_slice(length, buffer, |slice| Ok(slice.to_vec()))?;
        self.bytes_read += length;
        Ok(bytes)
    }

    fn read_timestamp_body(&mut self, encoded_value: EncodedValue) -> IonResult<Timestamp> {
        let value_end = encoded_value.value_end();
        let offset = self.read_var_int()?;
        let is_known_offset = !offset.is_negative_zero();
        let offset_minutes = offset.value() as i32;

        let year = self.read_var_uint()?.value() as u32;
        if self.bytes_read >= value_end {
            if is_known_offset {
                return decoding_error("a year-precision timestamp cannot have a known offset");
            }
            return Timestamp::with_year(year).build();
        }

        let month = self.read_var_uint()?.value() as u32;
        if self.bytes_read >= value_end {
            if is_known_offset {
                return decoding_error("a month-precision timestamp cannot have a known offset");
            }
            return Timestamp::with_year(year).with_month(month).build();
        }

        let day = self.read_var_uint()?.value() as u32;
        if self.bytes_read >= value_end {
            if is_known_offset {
                return decoding_error("a day-precision timestamp cannot have a known offset");
            }
            return Timestamp::with_ymd(year, month, day).build();
        }

        let hour = self.read_var_uint()?.value() as u32;
        if self.bytes_read >= value_end {
            return decoding_error("timestamps with an hour must also declare a minute");
        }
        let minute = self.read_var_uint()?.value() as u32;
        let builder = Timestamp::with_ymd(year, month, day).with_hour_and_minute(hour, minute);
        if self.bytes_read >= value_end {
            if is_known_offset {
                return builder.build_utc_fields_at_offset(offset_minutes);
            }
            return builder.build_at_unknown_offset();
        }

        let second = self.read_var_uint()?.value() as u32;
        let builder = builder.with_second(second);
        if self.bytes_read >= value_end {
            if is_known_offset {
                return builder.build_utc_fields_at_offset(offset_minutes);
            }
            return builder.build_at_unknown_offset();
        }

        // The remaining bytes are the fractional seconds: a VarInt exponent followed by an
        // Int coefficient that occupies the rest of the body.
        let exponent = self.read_var_int()?.value();
        let coefficient_size = value_end.saturating_sub(self.bytes_read);
        let coefficient = self.read_int_bytes(coefficient_size)?;
        if coefficient.value().is_negative() {
            return decoding_error("timestamp fractional seconds cannot be negative");
        }
        // A zero coefficient with a non-negative exponent (e.g. `0d0`) means no fractional
        // precision at all.
        if exponent >= 0 {
            if !coefficient.value().is_zero() {
                return decoding_error("timestamp fractional seconds must be less than 1");
            }
            if is_known_offset {
                return builder.build_utc_fields_at_offset(offset_minutes);
            }
            return builder.build_at_unknown_offset();
        }

        let number_of_digits = exponent.unsigned_abs() as u32;
        let builder = if number_of_digits <= 9 {
            let magnitude = coefficient.value().as_i64()? as u64;
            if magnitude >= 10u64.pow(number_of_digits) {
                return decoding_error("timestamp fractional seconds must be less than 1");
            }
            let nanoseconds = magnitude * 10u64.pow(9 - number_of_digits);
            builder.with_nanoseconds_and_precision(nanoseconds as u32, number_of_digits)
        } else {
            let fraction = Decimal::new(coefficient.value().clone(), exponent);
            builder.with_fractional_seconds(fraction)
        };
        if is_known_offset {
            builder.build_utc_fields_at_offset(offset_minutes)
        } else {
            builder.build_at_unknown_offset()
        }
    }
}

impl<R: IonDataSource> RawReader for RawBinaryReader<R> {
    fn ion_version(&self) -> (u8, u8) {
        self.ion_version
    }

    fn next(&mut self) -> IonResult<RawStreamItem> {
        self.check_failure()?;
        match self.advance_to_next_item() {
            Ok(item) => {
                self.current_item = item;
                Ok(item)
            }
            Err(error) => {
                self.current_item = RawStreamItem::Nothing;
                self.fail(error)
            }
        }
    }

    fn current(&self) -> RawStreamItem {
        self.current_item
    }

    fn ion_type(&self) -> Option<IonType> {
        self.encoded_value
            .as_ref()
            .and_then(|encoded_value| encoded_value.header.ion_type)
    }

    fn is_null(&self) -> bool {
        self.encoded_value
            .as_ref()
            .map(|encoded_value| encoded_value.is_null)
            .unwrap_or(false)
    }

    fn annotations(&self) -> &[RawSymbolToken] {
        if self.encoded_value.is_some() {
            self.annotations.as_slice()
        } else {
            &[]
        }
    }

    fn field_name(&self) -> Option<&RawSymbolToken> {
        self.field_name.as_ref()
    }

    fn read_null(&mut self) -> IonResult<IonType> {
        self.check_failure()?;
        match self.encoded_value.as_ref() {
            Some(encoded_value) if encoded_value.is_null => Ok(encoded_value
                .header
                .ion_type
                .expect("encoded values always have an ion type")),
            Some(_) => illegal_operation("read_null called on a non-null value"),
            None => illegal_operation("read_null called when the reader was not on a value"),
        }
    }

    fn read_bool(&mut self) -> IonResult<bool> {
        let encoded_value = self.value_to_read(IonType::Bool, "read_bool")?;
        match encoded_value.header.length_code {
            0 => Ok(false),
            1 => Ok(true),
            code => decoding_error(format!("{code} is not a valid boolean length code")),
        }
    }

    fn read_i64(&mut self) -> IonResult<i64> {
        self.read_int()?.as_i64()
    }

    fn read_int(&mut self) -> IonResult<Int> {
        let encoded_value = self.value_to_read(IonType::Int, "read_int")?;
        self.value_consumed = true;
        let magnitude = self.read_uint(encoded_value.length_in_bytes)?;
        let is_negative =
            encoded_value.header.ion_type_code == IonTypeCode::NegativeInteger;
        let value = match magnitude.value() {
            UInt::U64(magnitude) => {
                if is_negative {
                    if *magnitude == 0 {
                        return decoding_error(
                            "found a negative integer with a zero magnitude",
                        );
                    }
                    if *magnitude <= i64::MAX as u64 {
                        Int::I64(-(*magnitude as i64))
                    } else if *magnitude == (i64::MAX as u64) + 1 {
                        Int::I64(i64::MIN)
                    } else {
                        Int::BigInt(-BigInt::from(*magnitude))
                    }
                } else if *magnitude <= i64::MAX as u64 {
                    Int::I64(*magnitude as i64)
                } else {
                    Int::BigInt(BigInt::from(*magnitude))
                }
            }
            UInt::BigUInt(magnitude) => {
                let mut big_int = BigInt::from(magnitude.clone());
                if is_negative {
                    if magnitude.bits() == 0 {
                        return decoding_error(
                            "found a negative integer with a zero magnitude",
                        );
                    }
                    big_int = -big_int;
                }
                Int::from(big_int)
            }
        };
        Ok(value)
    }

    fn read_f32(&mut self) -> IonResult<f32> {
        Ok(self.read_f64()? as f32)
    }

    fn read_f64(&mut self) -> IonResult<f64> {
        let encoded_value = self.value_to_read(IonType::Float, "read_f64")?;
        self.value_consumed = true;
        match encoded_value.length_in_bytes {
            0 => Ok(0f64),
            4 => {
                let bytes = self.read_body_bytes(4)?;
                let mut array = [0u8; 4];
                array.copy_from_slice(bytes.as_slice());
                Ok(f32::from_be_bytes(array) as f64)
            }
            8 => {
                let bytes = self.read_body_bytes(8)?;
                let mut array = [0u8; 8];
                array.copy_from_slice(bytes.as_slice());
                Ok(f64::from_be_bytes(array))
            }
            length => decoding_error(format!("floats cannot be {length} bytes long")),
        }
    }

    fn read_decimal(&mut self) -> IonResult<Decimal> {
        let encoded_value = self.value_to_read(IonType::Decimal, "read_decimal")?;
        self.value_consumed = true;
        if encoded_value.length_in_bytes == 0 {
            return Ok(Decimal::new(0, 0));
        }
        let exponent = self.read_var_int()?;
        let coefficient_size = encoded_value
            .value_end()
            .saturating_sub(self.bytes_read);
        let coefficient = self.read_int_bytes(coefficient_size)?;
        if coefficient.is_negative_zero() {
            return Ok(Decimal::negative_zero_with_exponent(exponent.value()));
        }
        Ok(Decimal::new(coefficient.value().clone(), exponent.value()))
    }

    fn read_string(&mut self) -> IonResult<String> {
        let encoded_value = self.value_to_read(IonType::String, "read_string")?;
        self.value_consumed = true;
        let bytes = self.read_body_bytes(encoded_value.length_in_bytes)?;
        String::from_utf8(bytes)
            .map_err(|_| decoding_error_raw("found a string with invalid utf-8 data"))
    }

    fn read_symbol(&mut self) -> IonResult<RawSymbolToken> {
        let encoded_value = self.value_to_read(IonType::Symbol, "read_symbol")?;
        self.value_consumed = true;
        let magnitude = self.read_uint(encoded_value.length_in_bytes)?;
        let sid = magnitude.value().as_u64().ok_or_else(|| {
            decoding_error_raw("found a symbol ID that does not fit in a usize")
        })?;
        Ok(RawSymbolToken::SymbolId(sid as usize))
    }

    fn read_blob_bytes(&mut self) -> IonResult<Vec<u8>> {
        let encoded_value = self.value_to_read(IonType::Blob, "read_blob_bytes")?;
        self.value_consumed = true;
        self.read_body_bytes(encoded_value.length_in_bytes)
    }

    fn read_clob_bytes(&mut self) -> IonResult<Vec<u8>> {
        let encoded_value = self.value_to_read(IonType::Clob, "read_clob_bytes")?;
        self.value_consumed = true;
        self.read_body_bytes(encoded_value.length_in_bytes)
    }

    fn read_timestamp(&mut self) -> IonResult<Timestamp> {
        let encoded_value = self.value_to_read(IonType::Timestamp, "read_timestamp")?;
        self.value_consumed = true;
        match self.read_timestamp_body(encoded_value) {
            Ok(timestamp) => Ok(timestamp),
            Err(error @ IonError::InvalidTimestamp { .. }) => {
                // An in-range encoding of an out-of-range timestamp is malformed data
                Err(decoding_error_raw(error.to_string()))
            }
            Err(error) => Err(error),
        }
    }

    fn step_in(&mut self) -> IonResult<()> {
        self.check_failure()?;
        let encoded_value = match self.encoded_value.take() {
            Some(encoded_value) => encoded_value,
            None => return illegal_operation("step_in called when the reader was not on a value"),
        };
        let ion_type = encoded_value
            .header
            .ion_type
            .expect("encoded values always have an ion type");
        if !ion_type.is_container() || encoded_value.is_null {
            self.encoded_value = Some(encoded_value);
            return illegal_operation(format!("step_in called on a non-container ({ion_type})"));
        }
        self.parents.push(Container {
            ion_type,
            end_position: encoded_value.value_end(),
        });
        self.annotations.clear();
        self.field_name = None;
        self.current_item = RawStreamItem::Nothing;
        Ok(())
    }

    fn step_out(&mut self) -> IonResult<()> {
        self.check_failure()?;
        let parent = match self.parents.pop() {
            Some(parent) => parent,
            None => return illegal_operation("step_out called at the top level"),
        };
        self.encoded_value = None;
        self.annotations.clear();
        self.field_name = None;
        self.current_item = RawStreamItem::Nothing;
        let remaining = parent.end_position.saturating_sub(self.bytes_read);
        if remaining > 0 {
            if let Err(error) = self.skip_bytes(remaining) {
                return self.fail(error);
            }
        }
        Ok(())
    }

    fn parent_type(&self) -> Option<IonType> {
        self.parents.last().map(|parent| parent.ion_type)
    }

    fn depth(&self) -> usize {
        self.parents.len()
    }
}

#[cfg(test)]
mod reader_tests {
    use super::*;
    use crate::ion_eq::IonEq;
    use crate::raw_reader::RawStreamItem::*;
    use std::io::Cursor;

    fn reader_for(bytes: &[u8]) -> RawBinaryReader<Cursor<Vec<u8>>> {
        let mut data = Vec::new();
        data.extend_from_slice(&IVM);
        data.extend_from_slice(bytes);
        let mut reader = RawBinaryReader::new(Cursor::new(data));
        assert_eq!(reader.next().unwrap(), VersionMarker(1, 0));
        reader
    }

    #[test]
    fn read_empty_stream() -> IonResult<()> {
        let mut reader = reader_for(&[]);
        assert_eq!(reader.next()?, Nothing);
        assert_eq!(reader.next()?, Nothing);
        Ok(())
    }

    #[test]
    fn read_nulls() -> IonResult<()> {
        let mut reader = reader_for(&[0x0F, 0x1F, 0x2F, 0x6F, 0xDF]);
        assert_eq!(reader.next()?, Null(IonType::Null));
        assert_eq!(reader.next()?, Null(IonType::Bool));
        assert_eq!(reader.next()?, Null(IonType::Int));
        assert_eq!(reader.read_null()?, IonType::Int);
        assert_eq!(reader.next()?, Null(IonType::Timestamp));
        assert_eq!(reader.next()?, Null(IonType::Struct));
        assert!(reader.is_null());
        Ok(())
    }

    #[test]
    fn read_bools() -> IonResult<()> {
        let mut reader = reader_for(&[0x10, 0x11]);
        assert_eq!(reader.next()?, Value(IonType::Bool));
        assert!(!reader.read_bool()?);
        assert_eq!(reader.next()?, Value(IonType::Bool));
        assert!(reader.read_bool()?);
        Ok(())
    }

    #[test]
    fn read_ints() -> IonResult<()> {
        let mut reader = reader_for(&[
            0x20, // 0
            0x21, 0x2A, // 42
            0x31, 0x2A, // -42
            0x28, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // u64::MAX
        ]);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 0);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 42);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, -42);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert!(reader.read_i64().is_err()); // too large for i64...
        Ok(())
    }

    #[test]
    fn oversized_int_read_via_read_int() -> IonResult<()> {
        let mut reader = reader_for(&[0x28, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_int()?, Int::from(u64::MAX));
        Ok(())
    }

    #[test]
    fn negative_zero_int_is_malformed() -> IonResult<()> {
        let mut reader = reader_for(&[0x31, 0x00]);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert!(reader.read_int().is_err());
        Ok(())
    }

    #[test]
    fn zero_length_negative_int_is_malformed() {
        let mut reader = reader_for(&[0x30]);
        assert!(reader.next().is_err());
        // The failure is sticky
        assert!(reader.next().is_err());
    }

    #[test]
    fn read_floats() -> IonResult<()> {
        let mut reader = reader_for(&[
            0x40, // 0e0
            0x48, 0x40, 0x09, 0x21, 0xFB, 0x54, 0x44, 0x2D, 0x18, // ~pi
            0x44, 0x40, 0x49, 0x0F, 0xDB, // ~pi as f32
        ]);
        assert_eq!(reader.next()?, Value(IonType::Float));
        assert_eq!(reader.read_f64()?, 0f64);
        assert_eq!(reader.next()?, Value(IonType::Float));
        assert_eq!(reader.read_f64()?, std::f64::consts::PI);
        assert_eq!(reader.next()?, Value(IonType::Float));
        assert_eq!(reader.read_f32()?, std::f32::consts::PI);
        Ok(())
    }

    #[test]
    fn read_decimals() -> IonResult<()> {
        let mut reader = reader_for(&[
            0x50, // 0d0
            0x51, 0x80, // 0d0 (explicit empty coefficient)
            0x52, 0xC3, 0x64, // 100 * 10^-3 (0.100)
            0x52, 0xC1, 0x80, // -0 * 10^-1  (-0.0)
        ]);
        assert_eq!(reader.next()?, Value(IonType::Decimal));
        assert!(reader.read_decimal()?.ion_eq(&Decimal::new(0, 0)));
        assert_eq!(reader.next()?, Value(IonType::Decimal));
        assert!(reader.read_decimal()?.ion_eq(&Decimal::new(0, 0)));
        assert_eq!(reader.next()?, Value(IonType::Decimal));
        assert!(reader.read_decimal()?.ion_eq(&Decimal::new(100, -3)));
        assert_eq!(reader.next()?, Value(IonType::Decimal));
        assert!(reader
            .read_decimal()?
            .ion_eq(&Decimal::negative_zero_with_exponent(-1)));
        Ok(())
    }

    #[test]
    fn read_timestamps() -> IonResult<()> {
        let mut reader = reader_for(&[
            0x63, 0xC0, 0x0F, 0xD0, // 2000T
            0x67, 0x80, 0x0F, 0xD0, 0x81, 0x81, 0x80, 0x80, // 2000-01-01T00:00Z
        ]);
        assert_eq!(reader.next()?, Value(IonType::Timestamp));
        let expected = Timestamp::with_year(2000).build()?;
        assert!(reader.read_timestamp()?.ion_eq(&expected));
        assert_eq!(reader.next()?, Value(IonType::Timestamp));
        let expected = Timestamp::with_ymd(2000, 1, 1)
            .with_hour_and_minute(0, 0)
            .build_at_offset(0)?;
        assert!(reader.read_timestamp()?.ion_eq(&expected));
        Ok(())
    }

    #[test]
    fn read_symbols_and_strings() -> IonResult<()> {
        let mut reader = reader_for(&[
            0x70, // $0
            0x71, 0x0A, // $10
            0x83, 0x66, 0x6F, 0x6F, // "foo"
        ]);
        assert_eq!(reader.next()?, Value(IonType::Symbol));
        assert_eq!(reader.read_symbol()?, RawSymbolToken::SymbolId(0));
        assert_eq!(reader.next()?, Value(IonType::Symbol));
        assert_eq!(reader.read_symbol()?, RawSymbolToken::SymbolId(10));
        assert_eq!(reader.next()?, Value(IonType::String));
        assert_eq!(reader.read_string()?, "foo".to_string());
        Ok(())
    }

    #[test]
    fn read_lobs() -> IonResult<()> {
        let mut reader = reader_for(&[
            0x93, 0x61, 0x62, 0x63, // clob "abc"
            0xA3, 0x01, 0x02, 0x03, // blob
        ]);
        assert_eq!(reader.next()?, Value(IonType::Clob));
        assert_eq!(reader.read_clob_bytes()?, b"abc".to_vec());
        assert_eq!(reader.next()?, Value(IonType::Blob));
        assert_eq!(reader.read_blob_bytes()?, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn step_into_list() -> IonResult<()> {
        // [1, 2, 3] followed by 42
        let mut reader = reader_for(&[
            0xB6, 0x21, 0x01, 0x21, 0x02, 0x21, 0x03, //
            0x21, 0x2A,
        ]);
        assert_eq!(reader.next()?, Value(IonType::List));
        reader.step_in()?;
        assert_eq!(reader.depth(), 1);
        assert_eq!(reader.parent_type(), Some(IonType::List));
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 1);
        assert_eq!(reader.next()?, Value(IonType::Int));
        // Skip value 2 without reading it
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 3);
        assert_eq!(reader.next()?, Nothing);
        assert_eq!(reader.next()?, Nothing);
        reader.step_out()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 42);
        Ok(())
    }

    #[test]
    fn step_out_skips_unread_children() -> IonResult<()> {
        let mut reader = reader_for(&[
            0xB6, 0x21, 0x01, 0x21, 0x02, 0x21, 0x03, //
            0x21, 0x2A,
        ]);
        assert_eq!(reader.next()?, Value(IonType::List));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        reader.step_out()?; // 2 and 3 are never visited
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 42);
        Ok(())
    }

    #[test]
    fn read_struct_with_field_names() -> IonResult<()> {
        // {$4: 1, $5: 2}
        let mut reader = reader_for(&[0xD6, 0x84, 0x21, 0x01, 0x85, 0x21, 0x02]);
        assert_eq!(reader.next()?, Value(IonType::Struct));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.field_name(), Some(&RawSymbolToken::SymbolId(4)));
        assert_eq!(reader.read_i64()?, 1);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.field_name(), Some(&RawSymbolToken::SymbolId(5)));
        assert_eq!(reader.next()?, Nothing);
        reader.step_out()?;
        Ok(())
    }

    #[test]
    fn read_sorted_struct_encoding() -> IonResult<()> {
        // Length code 1 with a VarUInt length promises sorted field order
        let mut reader = reader_for(&[0xD1, 0x86, 0x84, 0x21, 0x01, 0x85, 0x21, 0x02]);
        assert_eq!(reader.next()?, Value(IonType::Struct));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.field_name(), Some(&RawSymbolToken::SymbolId(4)));
        reader.step_out()?;
        Ok(())
    }

    #[test]
    fn read_annotations() -> IonResult<()> {
        // $10::$11::"foo"
        let mut reader = reader_for(&[0xE7, 0x82, 0x8A, 0x8B, 0x83, 0x66, 0x6F, 0x6F]);
        assert_eq!(reader.next()?, Value(IonType::String));
        assert_eq!(
            reader.annotations(),
            &[RawSymbolToken::SymbolId(10), RawSymbolToken::SymbolId(11)]
        );
        assert_eq!(reader.read_string()?, "foo".to_string());
        Ok(())
    }

    #[test]
    fn annotation_wrapper_length_mismatch_is_malformed() {
        // The wrapper claims 7 bytes but its annotations + value only span 6
        let mut reader = reader_for(&[0xE7, 0x81, 0x8A, 0x83, 0x66, 0x6F, 0x6F]);
        assert!(reader.next().is_err());
    }

    #[test]
    fn nop_padding_is_skipped() -> IonResult<()> {
        let mut reader = reader_for(&[
            0x00, // 1-byte NOP
            0x03, 0xFF, 0xFF, 0xFF, // 4-byte NOP
            0x21, 0x2A, // 42
        ]);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 42);
        Ok(())
    }

    #[test]
    fn nop_padding_between_struct_fields() -> IonResult<()> {
        // {$4: NOP NOP, $5: 7} -- a NOP field consumes its field name
        let mut reader = reader_for(&[0xD6, 0x84, 0x01, 0xFF, 0x85, 0x21, 0x07]);
        assert_eq!(reader.next()?, Value(IonType::Struct));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.field_name(), Some(&RawSymbolToken::SymbolId(5)));
        assert_eq!(reader.read_i64()?, 7);
        assert_eq!(reader.next()?, Nothing);
        reader.step_out()?;
        Ok(())
    }

    #[test]
    fn ivm_can_appear_between_top_level_values() -> IonResult<()> {
        let mut reader = reader_for(&[0x21, 0x01, 0xE0, 0x01, 0x00, 0xEA, 0x21, 0x02]);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.next()?, VersionMarker(1, 0));
        assert_eq!(reader.next()?, Value(IonType::Int));
        Ok(())
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut reader = RawBinaryReader::new(Cursor::new(vec![0xE0, 0x02, 0x00, 0xEA]));
        assert!(reader.next().is_err());
    }

    #[test]
    fn truncated_value_is_incomplete() {
        let mut reader = reader_for(&[0x86, 0x66, 0x6F]); // 6-byte string, 2 bytes present
        assert_eq!(reader.next().unwrap(), Value(IonType::String));
        let result = reader.read_string();
        assert!(matches!(result, Err(IonError::UnexpectedEof { .. })));
        // Sticky failure
        assert!(reader.next().is_err());
    }

    #[test]
    fn value_overrunning_container_is_malformed() {
        // A list claiming 2 bytes that contains a 3-byte value
        let mut reader = reader_for(&[0xB2, 0x22, 0x01, 0x02]);
        assert_eq!(reader.next().unwrap(), Value(IonType::List));
        reader.step_in().unwrap();
        assert!(reader.next().is_err());
    }

    #[test]
    fn deeply_nested_containers() -> IonResult<()> {
        // 16 nested lists with an int at the center, built from the inside out
        let mut body = vec![0x21, 0x2A];
        for _ in 0..16 {
            let mut list = Vec::with_capacity(body.len() + 2);
            if body.len() <= 13 {
                list.push(0xB0 | body.len() as u8);
            } else {
                list.push(0xBE);
                VarUInt::write_u64(&mut list, body.len() as u64)?;
            }
            list.extend_from_slice(&body);
            body = list;
        }
        let mut reader = reader_for(&body);
        for _ in 0..16 {
            assert_eq!(reader.next()?, Value(IonType::List));
            reader.step_in()?;
        }
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 42);
        for _ in 0..16 {
            reader.step_out()?;
        }
        assert_eq!(reader.next()?, Nothing);
        Ok(())
    }
}
