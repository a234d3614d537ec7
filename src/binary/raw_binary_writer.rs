use std::io::Write;
use std::mem;

use smallvec::SmallVec;

use crate::binary::constants::v1_0::IVM;
use crate::binary::decimal::DecimalBinaryEncoder;
use crate::binary::header::Header;
use crate::binary::ion_type_code::IonTypeCode;
use crate::binary::timestamp::TimestampBinaryEncoder;
use crate::binary::uint::DecodedUInt;
use crate::binary::var_uint::VarUInt;
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{encoding_error, illegal_operation, IonResult};
use crate::types::integer::Int;
use crate::types::{Decimal, IonType, SymbolId, Timestamp};
use crate::writer::IonWriter;

/// The largest length that can be encoded directly in a type descriptor's length nibble.
pub(crate) const MAX_INLINE_LENGTH: usize = 13;

// Most values have fewer than this many annotations
const ANNOTATIONS_INLINE_CAPACITY: usize = 2;

type AnnotationsVec = SmallVec<[SymbolId; ANNOTATIONS_INLINE_CAPACITY]>;

// An open container whose children are accumulated in a scratch buffer. The container's
// header (and any field name or annotations that apply to the container itself) cannot be
// written until the body's final length is known at step_out.
struct EncodingLevel {
    container_type: Option<IonType>,
    field_name: Option<SymbolId>,
    annotations: AnnotationsVec,
    buffer: Vec<u8>,
}

impl EncodingLevel {
    fn top_level() -> EncodingLevel {
        EncodingLevel {
            container_type: None,
            field_name: None,
            annotations: AnnotationsVec::new(),
            buffer: Vec::with_capacity(512),
        }
    }

    fn container(
        container_type: IonType,
        field_name: Option<SymbolId>,
        annotations: AnnotationsVec,
    ) -> EncodingLevel {
        EncodingLevel {
            container_type: Some(container_type),
            field_name,
            annotations,
            buffer: Vec::new(),
        }
    }
}

/// Writes binary Ion to an implementation of [Write].
///
/// The raw writer encodes exactly what it is given: symbols, field names, and annotations
/// must already be symbol IDs. (The [BinaryWriter](crate::binary::binary_writer::BinaryWriter)
/// layers symbol table management on top of this type.) Container lengths are resolved by
/// buffering each open container's children in a per-level scratch buffer and assembling the
/// header when the container is stepped out of, so no back-patching of already-written bytes
/// is ever required.
pub struct RawBinaryWriter<W: Write> {
    out: W,
    levels: Vec<EncodingLevel>,
    annotations: AnnotationsVec,
    field_name: Option<RawSymbolToken>,
    // Reusable per-value encoding buffer
    scratch: Vec<u8>,
}

impl<W: Write> RawBinaryWriter<W> {
    pub fn new(out: W) -> RawBinaryWriter<W> {
        RawBinaryWriter {
            out,
            levels: vec![EncodingLevel::top_level()],
            annotations: AnnotationsVec::new(),
            field_name: None,
            scratch: Vec::with_capacity(64),
        }
    }

    fn expect_sid(token: RawSymbolToken, context: &str) -> IonResult<SymbolId> {
        match token {
            RawSymbolToken::SymbolId(sid) => Ok(sid),
            RawSymbolToken::Text(text) => encoding_error(format!(
                "the raw binary writer can only encode symbol IDs; {context} was the text '{text}'"
            )),
        }
    }

    // Takes the staged field name, verifying that one is present exactly when the writer is
    // inside a struct.
    fn take_field_name(&mut self) -> IonResult<Option<SymbolId>> {
        let field_name = self.field_name.take();
        let in_struct = self.parent_type() == Some(IonType::Struct);
        match (in_struct, field_name) {
            (true, Some(token)) => Ok(Some(Self::expect_sid(token, "a field name")?)),
            (true, None) => {
                illegal_operation("a field name must be set before writing a struct field")
            }
            (false, Some(_)) => {
                illegal_operation("a field name can only be set inside a struct")
            }
            (false, None) => Ok(None),
        }
    }

    fn take_annotations(&mut self) -> AnnotationsVec {
        mem::take(&mut self.annotations)
    }

    // Appends a fully-encoded value (header byte included) to the current container's
    // buffer, prefixing it with any staged field name and wrapping it in any staged
    // annotations.
    fn append_encoded_value(
        target: &mut Vec<u8>,
        field_name: Option<SymbolId>,
        annotations: &[SymbolId],
        value_bytes: &[u8],
    ) -> IonResult<()> {
        if let Some(sid) = field_name {
            VarUInt::write_u64(target, sid as u64)?;
        }
        if !annotations.is_empty() {
            let mut annotations_bytes: Vec<u8> = Vec::with_capacity(annotations.len() * 2);
            for sid in annotations {
                VarUInt::write_u64(&mut annotations_bytes, *sid as u64)?;
            }
            let annotations_length = annotations_bytes.len();
            let wrapper_body_length = VarUInt::encoded_size_of(annotations_length as u64)
                + annotations_length
                + value_bytes.len();
            if wrapper_body_length <= MAX_INLINE_LENGTH {
                target.push(Header::to_byte(
                    IonTypeCode::AnnotationOrIvm,
                    wrapper_body_length as u8,
                ));
            } else {
                target.push(Header::to_byte(IonTypeCode::AnnotationOrIvm, 14));
                VarUInt::write_u64(target, wrapper_body_length as u64)?;
            }
            VarUInt::write_u64(target, annotations_length as u64)?;
            target.extend_from_slice(annotations_bytes.as_slice());
        }
        target.extend_from_slice(value_bytes);
        Ok(())
    }

    // Encodes a scalar value into the scratch buffer via `encode_fn`, then appends it to
    // the current container.
    fn write_scalar<F>(&mut self, encode_fn: F) -> IonResult<()>
    where
        F: FnOnce(&mut Vec<u8>) -> IonResult<()>,
    {
        let field_name = self.take_field_name()?;
        let annotations = self.take_annotations();
        Self::validate_annotations(annotations.as_slice())?;
        let mut scratch = mem::take(&mut self.scratch);
        scratch.clear();
        let result = encode_fn(&mut scratch).and_then(|_| {
            let target = &mut self
                .levels
                .last_mut()
                .expect("the encoding level stack is never empty")
                .buffer;
            Self::append_encoded_value(target, field_name, annotations.as_slice(), &scratch)
        });
        self.scratch = scratch;
        result
    }

    // Writes a scalar whose body is already encoded (no header yet) under the provided type
    // code.
    fn write_scalar_with_body<F>(
        &mut self,
        ion_type_code: IonTypeCode,
        encode_body: F,
    ) -> IonResult<()>
    where
        F: FnOnce(&mut Vec<u8>) -> IonResult<()>,
    {
        self.write_scalar(|scratch| {
            // Reserve a byte for the header, encode the body after it, then fix up the
            // header once the body's length is known.
            scratch.push(0);
            encode_body(scratch)?;
            let body_length = scratch.len() - 1;
            if body_length <= MAX_INLINE_LENGTH {
                scratch[0] = Header::to_byte(ion_type_code, body_length as u8);
            } else {
                let mut header: Vec<u8> = Vec::with_capacity(12);
                header.push(Header::to_byte(ion_type_code, 14));
                VarUInt::write_u64(&mut header, body_length as u64)?;
                // Shift the body over to make room for the VarUInt length
                scratch.splice(0..1, header.into_iter());
            }
            Ok(())
        })
    }
}

impl<W: Write> IonWriter for RawBinaryWriter<W> {
    type Output = W;

    fn ion_version(&self) -> (u8, u8) {
        (1, 0)
    }

    fn write_ion_version_marker(&mut self, major: u8, minor: u8) -> IonResult<()> {
        if self.depth() > 0 {
            return illegal_operation("Ion version markers can only appear at the top level");
        }
        if (major, minor) != (1, 0) {
            return illegal_operation(format!(
                "this writer can only write Ion v1.0; v{major}.{minor} was requested"
            ));
        }
        self.levels[0].buffer.extend_from_slice(&IVM);
        Ok(())
    }

    fn supports_text_symbol_tokens(&self) -> bool {
        false
    }

    fn set_annotations<I, A>(&mut self, annotations: I)
    where
        A: Into<RawSymbolToken>,
        I: IntoIterator<Item = A>,
    {
        self.annotations.clear();
        for annotation in annotations {
            self.add_annotation(annotation);
        }
    }

    fn add_annotation<A: Into<RawSymbolToken>>(&mut self, annotation: A) {
        // Text tokens cannot be encoded without a symbol table; surface the problem at the
        // next write rather than panicking here.
        match annotation.into() {
            RawSymbolToken::SymbolId(sid) => self.annotations.push(sid),
            RawSymbolToken::Text(_) => self.annotations.push(SymbolId::MAX),
        }
    }

    fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        let type_code = ion_type_to_type_code(ion_type);
        self.write_scalar(|scratch| {
            scratch.push(Header::to_byte(type_code, 15));
            Ok(())
        })
    }

    fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.write_scalar(|scratch| {
            scratch.push(Header::to_byte(IonTypeCode::Boolean, value as u8));
            Ok(())
        })
    }

    fn write_i64(&mut self, value: i64) -> IonResult<()> {
        let type_code = if value < 0 {
            IonTypeCode::NegativeInteger
        } else {
            IonTypeCode::PositiveInteger
        };
        let magnitude = value.unsigned_abs();
        self.write_scalar_with_body(type_code, |scratch| {
            if magnitude > 0 {
                DecodedUInt::write_u64(scratch, magnitude)?;
            }
            Ok(())
        })
    }

    fn write_int(&mut self, value: &Int) -> IonResult<()> {
        match value {
            Int::I64(small) => self.write_i64(*small),
            Int::BigInt(big) => {
                let type_code = if value.is_negative() {
                    IonTypeCode::NegativeInteger
                } else {
                    IonTypeCode::PositiveInteger
                };
                let magnitude_bytes = big.magnitude().to_bytes_be();
                self.write_scalar_with_body(type_code, |scratch| {
                    scratch.extend_from_slice(magnitude_bytes.as_slice());
                    Ok(())
                })
            }
        }
    }

    fn write_f32(&mut self, value: f32) -> IonResult<()> {
        if value == 0f32 && !value.is_sign_negative() {
            return self.write_scalar(|scratch| {
                scratch.push(Header::to_byte(IonTypeCode::Float, 0));
                Ok(())
            });
        }
        self.write_scalar(|scratch| {
            scratch.push(Header::to_byte(IonTypeCode::Float, 4));
            scratch.extend_from_slice(&value.to_be_bytes());
            Ok(())
        })
    }

    fn write_f64(&mut self, value: f64) -> IonResult<()> {
        if value == 0f64 && !value.is_sign_negative() {
            return self.write_scalar(|scratch| {
                scratch.push(Header::to_byte(IonTypeCode::Float, 0));
                Ok(())
            });
        }
        self.write_scalar(|scratch| {
            scratch.push(Header::to_byte(IonTypeCode::Float, 8));
            scratch.extend_from_slice(&value.to_be_bytes());
            Ok(())
        })
    }

    fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        self.write_scalar(|scratch| scratch.encode_decimal_value(value).map(|_| ()))
    }

    fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()> {
        self.write_scalar(|scratch| scratch.encode_timestamp_value(value).map(|_| ()))
    }

    fn write_symbol<A: Into<RawSymbolToken>>(&mut self, value: A) -> IonResult<()> {
        let sid = Self::expect_sid(value.into(), "a symbol value")?;
        self.write_scalar_with_body(IonTypeCode::Symbol, |scratch| {
            if sid > 0 {
                DecodedUInt::write_u64(scratch, sid as u64)?;
            }
            Ok(())
        })
    }

    fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()> {
        let text = value.as_ref();
        self.write_scalar_with_body(IonTypeCode::String, |scratch| {
            scratch.extend_from_slice(text.as_bytes());
            Ok(())
        })
    }

    fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        let bytes = value.as_ref();
        self.write_scalar_with_body(IonTypeCode::Clob, |scratch| {
            scratch.extend_from_slice(bytes);
            Ok(())
        })
    }

    fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        let bytes = value.as_ref();
        self.write_scalar_with_body(IonTypeCode::Blob, |scratch| {
            scratch.extend_from_slice(bytes);
            Ok(())
        })
    }

    fn step_in(&mut self, container_type: IonType) -> IonResult<()> {
        if !container_type.is_container() {
            return illegal_operation(format!("cannot step into a {container_type}"));
        }
        let field_name = self.take_field_name()?;
        let annotations = self.take_annotations();
        Self::validate_annotations(annotations.as_slice())?;
        self.levels.push(EncodingLevel::container(
            container_type,
            field_name,
            annotations,
        ));
        Ok(())
    }

    fn set_field_name<A: Into<RawSymbolToken>>(&mut self, name: A) {
        self.field_name = Some(name.into());
    }

    fn parent_type(&self) -> Option<IonType> {
        self.levels
            .last()
            .and_then(|level| level.container_type)
    }

    fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    fn step_out(&mut self) -> IonResult<()> {
        if self.depth() == 0 {
            return illegal_operation("step_out called at the top level");
        }
        if self.field_name.is_some() || !self.annotations.is_empty() {
            return illegal_operation(
                "cannot step_out with a staged field name or annotations that were never used",
            );
        }
        let level = self.levels.pop().expect("depth was checked above");
        let container_type = level
            .container_type
            .expect("only the top level has no container type");
        let body = level.buffer;

        let type_code = ion_type_to_type_code(container_type);
        let mut encoded: Vec<u8> = Vec::with_capacity(body.len() + 12);
        // A struct body of length 1 must use the VarUInt form: a literal length nibble of 1
        // signals sorted field order.
        let needs_var_uint_length = body.len() > MAX_INLINE_LENGTH
            || (container_type == IonType::Struct && body.len() == 1);
        if needs_var_uint_length {
            encoded.push(Header::to_byte(type_code, 14));
            VarUInt::write_u64(&mut encoded, body.len() as u64)?;
        } else {
            encoded.push(Header::to_byte(type_code, body.len() as u8));
        }
        encoded.extend_from_slice(body.as_slice());

        let target = &mut self
            .levels
            .last_mut()
            .expect("the encoding level stack is never empty")
            .buffer;
        Self::append_encoded_value(
            target,
            level.field_name,
            level.annotations.as_slice(),
            &encoded,
        )
    }

    fn flush(&mut self) -> IonResult<()> {
        if self.depth() > 0 {
            return illegal_operation("flush called with unclosed containers");
        }
        let buffer = &mut self.levels[0].buffer;
        self.out.write_all(buffer.as_slice())?;
        buffer.clear();
        self.out.flush()?;
        Ok(())
    }

    fn output(&self) -> &W {
        &self.out
    }

    fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }
}

fn ion_type_to_type_code(ion_type: IonType) -> IonTypeCode {
    use IonType::*;
    match ion_type {
        Null => IonTypeCode::NullOrNop,
        Bool => IonTypeCode::Boolean,
        Int => IonTypeCode::PositiveInteger,
        Float => IonTypeCode::Float,
        Decimal => IonTypeCode::Decimal,
        Timestamp => IonTypeCode::Timestamp,
        Symbol => IonTypeCode::Symbol,
        String => IonTypeCode::String,
        Clob => IonTypeCode::Clob,
        Blob => IonTypeCode::Blob,
        List => IonTypeCode::List,
        SExp => IonTypeCode::SExpression,
        Struct => IonTypeCode::Struct,
    }
}

// Text annotations are stored as SymbolId::MAX so that the error can be reported at write
// time; this helper rejects them.
impl<W: Write> RawBinaryWriter<W> {
    fn validate_annotations(annotations: &[SymbolId]) -> IonResult<()> {
        if annotations.contains(&SymbolId::MAX) {
            return encoding_error("the raw binary writer can only encode symbol ID annotations");
        }
        Ok(())
    }
}

#[cfg(test)]
mod writer_tests {
    use super::*;
    use crate::binary::raw_binary_reader::RawBinaryReader;
    use crate::raw_reader::{RawReader, RawStreamItem};
    use std::io::Cursor;

    fn written_bytes<F>(write_fn: F) -> IonResult<Vec<u8>>
    where
        F: FnOnce(&mut RawBinaryWriter<&mut Vec<u8>>) -> IonResult<()>,
    {
        let mut output = Vec::new();
        let mut writer = RawBinaryWriter::new(&mut output);
        write_fn(&mut writer)?;
        writer.flush()?;
        Ok(output)
    }

    #[test]
    fn write_scalars() -> IonResult<()> {
        let bytes = written_bytes(|writer| {
            writer.write_null(IonType::Int)?;
            writer.write_bool(true)?;
            writer.write_i64(42)?;
            writer.write_i64(-42)?;
            writer.write_f64(0.0)?;
            writer.write_string("foo")?;
            writer.write_symbol(10usize)
        })?;
        assert_eq!(
            bytes,
            vec![0x2F, 0x11, 0x21, 0x2A, 0x31, 0x2A, 0x40, 0x83, 0x66, 0x6F, 0x6F, 0x71, 0x0A]
        );
        Ok(())
    }

    #[test]
    fn write_symbol_zero() -> IonResult<()> {
        let bytes = written_bytes(|writer| writer.write_symbol(0usize))?;
        assert_eq!(bytes, vec![0x70]);
        Ok(())
    }

    #[test]
    fn negative_zero_float_is_not_compressed() -> IonResult<()> {
        let bytes = written_bytes(|writer| writer.write_f64(-0.0))?;
        assert_eq!(bytes[0], 0x48);
        assert_eq!(bytes.len(), 9);
        Ok(())
    }

    #[test]
    fn write_empty_containers() -> IonResult<()> {
        let bytes = written_bytes(|writer| {
            writer.step_in(IonType::List)?;
            writer.step_out()?;
            writer.step_in(IonType::SExp)?;
            writer.step_out()?;
            writer.step_in(IonType::Struct)?;
            writer.step_out()
        })?;
        assert_eq!(bytes, vec![0xB0, 0xC0, 0xD0]);
        Ok(())
    }

    #[test]
    fn write_list_of_ints() -> IonResult<()> {
        let bytes = written_bytes(|writer| {
            writer.step_in(IonType::List)?;
            writer.write_i64(1)?;
            writer.write_i64(2)?;
            writer.write_i64(3)?;
            writer.step_out()
        })?;
        assert_eq!(bytes, vec![0xB6, 0x21, 0x01, 0x21, 0x02, 0x21, 0x03]);
        Ok(())
    }

    #[test]
    fn write_struct_with_field_ids() -> IonResult<()> {
        let bytes = written_bytes(|writer| {
            writer.step_in(IonType::Struct)?;
            writer.set_field_name(4usize);
            writer.write_i64(1)?;
            writer.set_field_name(5usize);
            writer.write_i64(2)?;
            writer.step_out()
        })?;
        assert_eq!(bytes, vec![0xD6, 0x84, 0x21, 0x01, 0x85, 0x21, 0x02]);
        Ok(())
    }

    #[test]
    fn missing_field_name_is_rejected() {
        let result = written_bytes(|writer| {
            writer.step_in(IonType::Struct)?;
            writer.write_i64(1)?;
            writer.step_out()
        });
        assert!(result.is_err());
    }

    #[test]
    fn write_annotated_value() -> IonResult<()> {
        let bytes = written_bytes(|writer| {
            writer.set_annotations([10usize, 11usize]);
            writer.write_string("foo")
        })?;
        assert_eq!(bytes, vec![0xE7, 0x82, 0x8A, 0x8B, 0x83, 0x66, 0x6F, 0x6F]);
        Ok(())
    }

    #[test]
    fn write_annotated_container() -> IonResult<()> {
        let bytes = written_bytes(|writer| {
            writer.set_annotations([10usize]);
            writer.step_in(IonType::List)?;
            writer.write_i64(1)?;
            writer.step_out()
        })?;
        assert_eq!(bytes, vec![0xE5, 0x81, 0x8A, 0xB2, 0x21, 0x01]);
        Ok(())
    }

    #[test]
    fn large_values_use_var_uint_lengths() -> IonResult<()> {
        let text = "a".repeat(20);
        let bytes = written_bytes(|writer| writer.write_string(&text))?;
        assert_eq!(bytes[0], 0x8E);
        assert_eq!(bytes[1], 0x80 | 20);
        assert_eq!(bytes.len(), 22);
        Ok(())
    }

    #[test]
    fn ivm_then_roundtrip_through_reader() -> IonResult<()> {
        let bytes = written_bytes(|writer| {
            writer.write_ion_version_marker(1, 0)?;
            writer.set_annotations([10usize]);
            writer.step_in(IonType::Struct)?;
            writer.set_field_name(4usize);
            writer.write_i64(7)?;
            writer.step_out()
        })?;
        let mut reader = RawBinaryReader::new(Cursor::new(bytes));
        assert_eq!(reader.next()?, RawStreamItem::VersionMarker(1, 0));
        assert_eq!(reader.next()?, RawStreamItem::Value(IonType::Struct));
        assert_eq!(reader.annotations(), &[RawSymbolToken::SymbolId(10)]);
        reader.step_in()?;
        assert_eq!(reader.next()?, RawStreamItem::Value(IonType::Int));
        assert_eq!(reader.field_name(), Some(&RawSymbolToken::SymbolId(4)));
        assert_eq!(reader.read_i64()?, 7);
        reader.step_out()?;
        assert_eq!(reader.next()?, RawStreamItem::Nothing);
        Ok(())
    }

    #[test]
    fn flush_with_open_container_is_rejected() {
        let mut output = Vec::new();
        let mut writer = RawBinaryWriter::new(&mut output);
        writer.step_in(IonType::List).unwrap();
        assert!(writer.flush().is_err());
    }
}
