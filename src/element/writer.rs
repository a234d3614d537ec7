//! Provides APIs to serialize an [Element] tree through any [IonWriter].

use crate::element::{Element, Value};
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::IonResult;
use crate::writer::IonWriter;

impl Element {
    /// Serializes this element (annotations included) at the writer's current position.
    /// The caller is responsible for calling [flush](IonWriter::flush) when the stream is
    /// complete.
    pub fn write_to<W: IonWriter>(&self, writer: &mut W) -> IonResult<()> {
        write_element(writer, self)
    }
}

/// Serializes `element` at the writer's current position, recursing through containers.
pub fn write_element<W: IonWriter>(writer: &mut W, element: &Element) -> IonResult<()> {
    if !element.annotations().is_empty() {
        writer.set_annotations(
            element
                .annotations()
                .iter()
                .map(RawSymbolToken::from)
                .collect::<Vec<_>>(),
        );
    }
    match element.value() {
        Value::Null(ion_type) => writer.write_null(*ion_type),
        Value::Bool(value) => writer.write_bool(*value),
        Value::Int(value) => writer.write_int(value),
        Value::Float(value) => writer.write_f64(*value),
        Value::Decimal(value) => writer.write_decimal(value),
        Value::Timestamp(value) => writer.write_timestamp(value),
        Value::Symbol(value) => writer.write_symbol(RawSymbolToken::from(value)),
        Value::String(value) => writer.write_string(value),
        Value::Clob(bytes) => writer.write_clob(bytes),
        Value::Blob(bytes) => writer.write_blob(bytes),
        Value::List(sequence) => {
            writer.step_in(crate::types::IonType::List)?;
            for child in sequence.elements() {
                write_element(writer, child)?;
            }
            writer.step_out()
        }
        Value::SExp(sequence) => {
            writer.step_in(crate::types::IonType::SExp)?;
            for child in sequence.elements() {
                write_element(writer, child)?;
            }
            writer.step_out()
        }
        Value::Struct(fields) => {
            writer.step_in(crate::types::IonType::Struct)?;
            for (field_name, child) in fields.fields() {
                writer.set_field_name(RawSymbolToken::from(field_name));
                write_element(writer, child)?;
            }
            writer.step_out()
        }
    }
}

#[cfg(test)]
mod element_writer_tests {
    use super::*;
    use crate::ion_eq::IonEq;
    use crate::text::text_writer::TextWriterBuilder;

    #[test]
    fn element_survives_a_text_round_trip() -> IonResult<()> {
        let original = Element::read_one(
            r#"report::{counts: [1, 2, 3], 'needs quoting': null.blob, nested: {a: (x + y)}}"#,
        )?;
        let mut buffer = Vec::new();
        let mut writer = TextWriterBuilder::new().build(&mut buffer)?;
        original.write_to(&mut writer)?;
        writer.flush()?;
        drop(writer);
        let round_tripped = Element::read_one(buffer.as_slice())?;
        assert!(original.ion_eq(&round_tripped));
        Ok(())
    }
}
