//! Provides APIs to read Ion data into an [Element] tree from any source that can back a
//! [Reader](crate::reader::Reader).

use crate::data_source::ToIonDataSource;
use crate::element::{Element, Sequence, Struct, Value};
use crate::raw_reader::RawReader;
use crate::reader::{ReaderBuilder, StreamItem, UserReader};
use crate::result::{decoding_error, IonResult};
use crate::types::{IonType, Symbol};

impl Element {
    /// Reads a single Ion [Element] from the provided data source. If the source has no
    /// values, or has more than one, returns an error.
    pub fn read_one<I: ToIonDataSource>(input: I) -> IonResult<Element> {
        let mut reader = ReaderBuilder::new().build(input)?;
        let element = match read_next_element(&mut reader)? {
            Some(element) => element,
            None => return decoding_error("expected 1 value, found 0"),
        };
        if read_next_element(&mut reader)?.is_some() {
            return decoding_error("expected 1 value, found more");
        }
        Ok(element)
    }

    /// Reads every Ion [Element] in the provided data source, materializing the entire
    /// stream.
    pub fn read_all<I: ToIonDataSource>(input: I) -> IonResult<Vec<Element>> {
        let mut reader = ReaderBuilder::new().build(input)?;
        read_all_elements(&mut reader)
    }
}

/// Drives `reader` to the end of the stream, materializing each top-level value.
pub fn read_all_elements<R: RawReader>(reader: &mut UserReader<R>) -> IonResult<Vec<Element>> {
    let mut elements = Vec::new();
    while let Some(element) = read_next_element(reader)? {
        elements.push(element);
    }
    Ok(elements)
}

/// Advances `reader` to the next value at the current depth and materializes it, returning
/// `None` at the end of the current sequence.
pub fn read_next_element<R: RawReader>(
    reader: &mut UserReader<R>,
) -> IonResult<Option<Element>> {
    match reader.next()? {
        StreamItem::Nothing => Ok(None),
        item => materialize_current_element(reader, item).map(Some),
    }
}

// Materializes the value the reader is currently positioned on. The annotations (and, in a
// struct, the field name) must be captured by the caller before any container value is
// entered, because stepping in discards them.
fn materialize_current_element<R: RawReader>(
    reader: &mut UserReader<R>,
    item: StreamItem,
) -> IonResult<Element> {
    let annotations = reader.annotations()?;
    let value = match item {
        StreamItem::Nothing => unreachable!("the caller checked for end-of-sequence"),
        StreamItem::Null(ion_type) => Value::Null(ion_type),
        StreamItem::Value(ion_type) => materialize_value(reader, ion_type)?,
    };
    Ok(Element::new(annotations, value))
}

fn materialize_value<R: RawReader>(
    reader: &mut UserReader<R>,
    ion_type: IonType,
) -> IonResult<Value> {
    let value = match ion_type {
        IonType::Null => unreachable!("non-null values cannot have type null"),
        IonType::Bool => Value::Bool(reader.read_bool()?),
        IonType::Int => Value::Int(reader.read_int()?),
        IonType::Float => Value::Float(reader.read_f64()?),
        IonType::Decimal => Value::Decimal(reader.read_decimal()?),
        IonType::Timestamp => Value::Timestamp(reader.read_timestamp()?),
        IonType::Symbol => Value::Symbol(reader.read_symbol()?),
        IonType::String => Value::String(reader.read_string()?),
        IonType::Clob => Value::Clob(reader.read_clob_bytes()?),
        IonType::Blob => Value::Blob(reader.read_blob_bytes()?),
        IonType::List => Value::List(materialize_sequence(reader)?),
        IonType::SExp => Value::SExp(materialize_sequence(reader)?),
        IonType::Struct => Value::Struct(materialize_struct(reader)?),
    };
    Ok(value)
}

fn materialize_sequence<R: RawReader>(reader: &mut UserReader<R>) -> IonResult<Sequence> {
    let mut elements = Vec::new();
    reader.step_in()?;
    while let Some(element) = read_next_element(reader)? {
        elements.push(element);
    }
    reader.step_out()?;
    Ok(Sequence::new(elements))
}

fn materialize_struct<R: RawReader>(reader: &mut UserReader<R>) -> IonResult<Struct> {
    let mut fields: Vec<(Symbol, Element)> = Vec::new();
    reader.step_in()?;
    loop {
        let item = match reader.next()? {
            StreamItem::Nothing => break,
            item => item,
        };
        // The field name has to be read before the value: materializing a container value
        // steps into it, which discards the field metadata.
        let field_name = reader.field_name()?;
        let element = materialize_current_element(reader, item)?;
        fields.push((field_name, element));
    }
    reader.step_out()?;
    Ok(fields.into_iter().collect())
}
