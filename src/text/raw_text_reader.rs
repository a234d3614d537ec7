use nom::IResult;

use crate::data_source::ToIonDataSource;
use crate::raw_reader::{RawReader, RawStreamItem};
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{decoding_error, illegal_operation, IonError, IonResult};
use crate::text::parent_container::ParentContainer;
use crate::text::parsers::comments::whitespace_or_comments;
use crate::text::parsers::containers::{
    list_delimiter, list_value_or_end, s_expression_value_or_end, struct_delimiter,
    struct_field_name_or_end, struct_field_value,
};
use crate::text::parsers::top_level::{ion_version_marker, top_level_value};
use crate::text::text_buffer::TextBuffer;
use crate::text::text_value::{AnnotatedTextValue, TextValue};
use crate::types::timestamp::Timestamp;
use crate::types::{Decimal, Int, IonType};

const INITIAL_PARENTS_CAPACITY: usize = 16;

/// A raw reader that parses Ion text from any [ToIonDataSource].
///
/// The input is buffered in full before parsing begins. Values are parsed on demand as the
/// application's cursor reaches them; container contents are not touched until the
/// application steps in. A grammar violation permanently fails the reader.
pub struct RawTextReader {
    buffer: TextBuffer,
    current_value: Option<AnnotatedTextValue>,
    current_field_name: Option<RawSymbolToken>,
    current_item: RawStreamItem,
    ion_version: (u8, u8),
    is_eof: bool,
    parents: Vec<ParentContainer>,
    failure: Option<IonError>,
}

impl RawTextReader {
    pub fn new<I: ToIonDataSource>(input: I) -> IonResult<RawTextReader> {
        let buffer = TextBuffer::from_source(input.to_ion_data_source())?;
        Ok(RawTextReader {
            buffer,
            current_value: None,
            current_field_name: None,
            current_item: RawStreamItem::Nothing,
            ion_version: (1, 0),
            is_eof: false,
            parents: Vec::with_capacity(INITIAL_PARENTS_CAPACITY),
            failure: None,
        })
    }

    fn check_failure(&self) -> IonResult<()> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

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

    // Runs `parser` against the unparsed input, consuming the matched text on success.
    fn parse_next<T>(&mut self, parser: impl Fn(&str) -> IResult<&str, T>) -> IonResult<T> {
        let remaining = self.buffer.remaining_text();
        match parser(remaining) {
            Ok((rest, value)) => {
                let bytes_consumed = remaining.len() - rest.len();
                self.buffer.consume(bytes_consumed);
                Ok(value)
            }
            Err(nom::Err::Incomplete(_)) => decoding_error(format!(
                "unexpected end of input on line {}",
                self.buffer.line_number()
            )),
            Err(_) => decoding_error(format!(
                "invalid Ion text on line {}: {}",
                self.buffer.line_number(),
                self.buffer
                    .remaining_text()
                    .trim_end()
                    .chars()
                    .take(32)
                    .collect::<String>()
            )),
        }
    }

    // True if the remaining input is nothing but whitespace and comments.
    fn at_end_of_input(&mut self) -> IonResult<bool> {
        let remaining = self.buffer.remaining_text();
        match whitespace_or_comments(remaining) {
            Ok((rest, _)) => {
                let bytes_consumed = remaining.len() - rest.len();
                let is_empty = rest.is_empty();
                self.buffer.consume(bytes_consumed);
                Ok(is_empty)
            }
            Err(_) => Ok(false),
        }
    }

    fn load_next_value(&mut self) -> IonResult<RawStreamItem> {
        // If the reader is parked on the start of a container that was never stepped into,
        // its contents need to be skipped over.
        let need_to_skip_container = self
            .current_value
            .as_ref()
            .map(|value| value.ion_type().is_container())
            .unwrap_or(false);
        if need_to_skip_container {
            self.step_in()?;
            self.step_out()?;
        }

        self.current_field_name = None;
        self.current_value = None;

        if self.parents.is_empty() {
            if self.is_eof || self.at_end_of_input()? {
                self.is_eof = true;
                return Ok(RawStreamItem::Nothing);
            }
            // Check for an IVM before attempting to parse a value.
            if let Ok((major, minor)) = self.try_parse_version_marker() {
                if (major, minor) != (1, 0) {
                    return decoding_error(format!(
                        "this implementation only supports Ion v1.0, found v{major}.{minor}"
                    ));
                }
                self.ion_version = (major, minor);
                return Ok(RawStreamItem::VersionMarker(major, minor));
            }
            let value = self.parse_next(top_level_value)?;
            return Ok(self.set_current_value(value));
        }

        // The reader is inside a container. If its end was already found, stay parked.
        let parent = *self.parents.last().unwrap();
        if parent.is_exhausted() {
            return Ok(RawStreamItem::Nothing);
        }

        let value = match parent.ion_type() {
            IonType::List => self.parse_next(list_value_or_end)?,
            IonType::SExp => self.parse_next(s_expression_value_or_end)?,
            IonType::Struct => {
                match self.parse_next(struct_field_name_or_end)? {
                    Some(field_name) => {
                        self.current_field_name = Some(field_name);
                        Some(self.parse_next(struct_field_value)?)
                    }
                    None => None,
                }
            }
            other => unreachable!("the parents stack contained a scalar type: {other:?}"),
        };

        match value {
            Some(value) => Ok(self.set_current_value(value)),
            None => {
                self.parents
                    .last_mut()
                    .expect("parent was just read")
                    .set_exhausted(true);
                Ok(RawStreamItem::Nothing)
            }
        }
    }

    // The IVM parser must not consume input when it fails; run it against the remaining
    // text without committing unless it matches.
    fn try_parse_version_marker(&mut self) -> Result<(u8, u8), ()> {
        let remaining = self.buffer.remaining_text();
        match ion_version_marker(remaining) {
            Ok((rest, version)) => {
                let bytes_consumed = remaining.len() - rest.len();
                self.buffer.consume(bytes_consumed);
                Ok(version)
            }
            Err(_) => Err(()),
        }
    }

    fn set_current_value(&mut self, value: AnnotatedTextValue) -> RawStreamItem {
        let item = RawStreamItem::nullable_value(value.ion_type(), value.value().is_null());
        self.current_value = Some(value);
        item
    }

    fn current_scalar(&self, expected: IonType, operation: &str) -> IonResult<&TextValue> {
        self.check_failure()?;
        let value = match self.current_value.as_ref() {
            Some(value) => value.value(),
            None => {
                return illegal_operation(format!(
                    "{operation} called when the reader was not positioned on a value"
                ))
            }
        };
        if value.is_null() {
            return illegal_operation(format!(
                "{operation} called on a null.{}",
                value.ion_type()
            ));
        }
        if value.ion_type() != expected {
            return illegal_operation(format!(
                "{operation} called on a {} value",
                value.ion_type()
            ));
        }
        Ok(value)
    }
}

impl RawReader for RawTextReader {
    fn ion_version(&self) -> (u8, u8) {
        self.ion_version
    }

    fn next(&mut self) -> IonResult<RawStreamItem> {
        self.check_failure()?;
        match self.load_next_value() {
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
        self.current_value.as_ref().map(|value| value.ion_type())
    }

    fn is_null(&self) -> bool {
        self.current_value
            .as_ref()
            .map(|value| value.value().is_null())
            .unwrap_or(false)
    }

    fn annotations(&self) -> &[RawSymbolToken] {
        self.current_value
            .as_ref()
            .map(|value| value.annotations())
            .unwrap_or(&[])
    }

    fn field_name(&self) -> Option<&RawSymbolToken> {
        self.current_field_name.as_ref()
    }

    fn read_null(&mut self) -> IonResult<IonType> {
        self.check_failure()?;
        match self.current_value.as_ref().map(|value| value.value()) {
            Some(TextValue::Null(ion_type)) => Ok(*ion_type),
            Some(_) => illegal_operation("read_null called on a non-null value"),
            None => illegal_operation("read_null called when the reader was not on a value"),
        }
    }

    fn read_bool(&mut self) -> IonResult<bool> {
        match self.current_scalar(IonType::Bool, "read_bool")? {
            TextValue::Bool(value) => Ok(*value),
            _ => unreachable!("current_scalar verified the type"),
        }
    }

    fn read_i64(&mut self) -> IonResult<i64> {
        self.read_int()?.as_i64()
    }

    fn read_int(&mut self) -> IonResult<Int> {
        match self.current_scalar(IonType::Int, "read_int")? {
            TextValue::Int(value) => Ok(value.clone()),
            _ => unreachable!("current_scalar verified the type"),
        }
    }

    fn read_f32(&mut self) -> IonResult<f32> {
        Ok(self.read_f64()? as f32)
    }

    fn read_f64(&mut self) -> IonResult<f64> {
        match self.current_scalar(IonType::Float, "read_f64")? {
            TextValue::Float(value) => Ok(*value),
            _ => unreachable!("current_scalar verified the type"),
        }
    }

    fn read_decimal(&mut self) -> IonResult<Decimal> {
        match self.current_scalar(IonType::Decimal, "read_decimal")? {
            TextValue::Decimal(value) => Ok(value.clone()),
            _ => unreachable!("current_scalar verified the type"),
        }
    }

    fn read_string(&mut self) -> IonResult<String> {
        match self.current_scalar(IonType::String, "read_string")? {
            TextValue::String(value) => Ok(value.clone()),
            _ => unreachable!("current_scalar verified the type"),
        }
    }

    fn read_symbol(&mut self) -> IonResult<RawSymbolToken> {
        match self.current_scalar(IonType::Symbol, "read_symbol")? {
            TextValue::Symbol(value) => Ok(value.clone()),
            _ => unreachable!("current_scalar verified the type"),
        }
    }

    fn read_blob_bytes(&mut self) -> IonResult<Vec<u8>> {
        match self.current_scalar(IonType::Blob, "read_blob_bytes")? {
            TextValue::Blob(value) => Ok(value.clone()),
            _ => unreachable!("current_scalar verified the type"),
        }
    }

    fn read_clob_bytes(&mut self) -> IonResult<Vec<u8>> {
        match self.current_scalar(IonType::Clob, "read_clob_bytes")? {
            TextValue::Clob(value) => Ok(value.clone()),
            _ => unreachable!("current_scalar verified the type"),
        }
    }

    fn read_timestamp(&mut self) -> IonResult<Timestamp> {
        match self.current_scalar(IonType::Timestamp, "read_timestamp")? {
            TextValue::Timestamp(value) => Ok(value.clone()),
            _ => unreachable!("current_scalar verified the type"),
        }
    }

    fn step_in(&mut self) -> IonResult<()> {
        self.check_failure()?;
        match self.current_value.as_ref().map(|value| value.value()) {
            Some(TextValue::ListStart) => self.parents.push(ParentContainer::new(IonType::List)),
            Some(TextValue::SExpStart) => self.parents.push(ParentContainer::new(IonType::SExp)),
            Some(TextValue::StructStart) => {
                self.parents.push(ParentContainer::new(IonType::Struct))
            }
            Some(other) => {
                return illegal_operation(format!(
                    "step_in called on a non-container ({})",
                    other.ion_type()
                ))
            }
            None => return illegal_operation("step_in called when the reader was not on a value"),
        };
        self.current_value = None;
        self.current_field_name = None;
        self.current_item = RawStreamItem::Nothing;
        Ok(())
    }

    fn step_out(&mut self) -> IonResult<()> {
        self.check_failure()?;
        if self.parents.is_empty() {
            return illegal_operation("step_out called at the top level");
        }
        // Visit (and discard) the container's remaining children so that the cursor lands
        // just past its closing delimiter.
        while !self
            .parents
            .last()
            .expect("parents is non-empty")
            .is_exhausted()
        {
            self.next()?;
        }
        self.parents.pop();
        self.current_value = None;
        self.current_field_name = None;
        self.current_item = RawStreamItem::Nothing;
        // The container that just closed is itself a value in its parent; the delimiter
        // that separates it from the next sibling follows the closing delimiter and is
        // consumed here rather than at parse time.
        match self.parents.last().map(|parent| parent.ion_type()) {
            Some(IonType::List) => {
                if let Err(error) = self.parse_next(list_delimiter) {
                    return self.fail(error);
                }
            }
            Some(IonType::Struct) => {
                if let Err(error) = self.parse_next(struct_delimiter) {
                    return self.fail(error);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn parent_type(&self) -> Option<IonType> {
        self.parents.last().map(|parent| parent.ion_type())
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

    fn reader_for(text: &str) -> RawTextReader {
        RawTextReader::new(text).expect("failed to create reader")
    }

    #[test]
    fn empty_input() -> IonResult<()> {
        let mut reader = reader_for("  // nothing here\n/* just trivia */  ");
        assert_eq!(reader.next()?, Nothing);
        assert_eq!(reader.next()?, Nothing);
        Ok(())
    }

    #[test]
    fn top_level_scalars() -> IonResult<()> {
        let mut reader = reader_for("null true 5 5e0 5.0 2007T \"five\" five {{aGk=}}");
        assert_eq!(reader.next()?, Null(IonType::Null));
        assert_eq!(reader.next()?, Value(IonType::Bool));
        assert!(reader.read_bool()?);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 5);
        assert_eq!(reader.next()?, Value(IonType::Float));
        assert_eq!(reader.read_f64()?, 5.0);
        assert_eq!(reader.next()?, Value(IonType::Decimal));
        assert!(reader.read_decimal()?.ion_eq(&Decimal::new(50, -1)));
        assert_eq!(reader.next()?, Value(IonType::Timestamp));
        assert_eq!(reader.next()?, Value(IonType::String));
        assert_eq!(reader.read_string()?, "five");
        assert_eq!(reader.next()?, Value(IonType::Symbol));
        assert_eq!(
            reader.read_symbol()?,
            RawSymbolToken::Text("five".to_string())
        );
        assert_eq!(reader.next()?, Value(IonType::Blob));
        assert_eq!(reader.read_blob_bytes()?, b"hi".to_vec());
        assert_eq!(reader.next()?, Nothing);
        Ok(())
    }

    #[test]
    fn version_marker_is_reported() -> IonResult<()> {
        let mut reader = reader_for("$ion_1_0 5");
        assert_eq!(reader.next()?, VersionMarker(1, 0));
        assert_eq!(reader.next()?, Value(IonType::Int));
        Ok(())
    }

    #[test]
    fn quoted_version_marker_is_a_symbol() -> IonResult<()> {
        let mut reader = reader_for("'$ion_1_0'");
        assert_eq!(reader.next()?, Value(IonType::Symbol));
        Ok(())
    }

    #[test]
    fn annotated_version_marker_is_a_symbol() -> IonResult<()> {
        let mut reader = reader_for("note::$ion_1_0");
        assert_eq!(reader.next()?, Value(IonType::Symbol));
        assert_eq!(
            reader.annotations(),
            &[RawSymbolToken::Text("note".to_string())]
        );
        Ok(())
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut reader = reader_for("$ion_1_1 5");
        assert!(reader.next().is_err());
        // the failure is sticky
        assert!(reader.next().is_err());
    }

    #[test]
    fn lists() -> IonResult<()> {
        let mut reader = reader_for("[1, 2, [3]] 42");
        assert_eq!(reader.next()?, Value(IonType::List));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 1);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.next()?, Value(IonType::List));
        // skip the nested list without stepping in
        assert_eq!(reader.next()?, Nothing);
        reader.step_out()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 42);
        Ok(())
    }

    #[test]
    fn step_out_skips_remaining_children() -> IonResult<()> {
        let mut reader = reader_for("[1, {a: 2}, 3] 42");
        assert_eq!(reader.next()?, Value(IonType::List));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        reader.step_out()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 42);
        Ok(())
    }

    #[test]
    fn structs_report_field_names() -> IonResult<()> {
        let mut reader = reader_for("{a: 1, a: 2, 'b c': 3}");
        assert_eq!(reader.next()?, Value(IonType::Struct));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(
            reader.field_name(),
            Some(&RawSymbolToken::Text("a".to_string()))
        );
        assert_eq!(reader.read_i64()?, 1);
        // duplicate field names are reported in encounter order
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(
            reader.field_name(),
            Some(&RawSymbolToken::Text("a".to_string()))
        );
        assert_eq!(reader.read_i64()?, 2);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(
            reader.field_name(),
            Some(&RawSymbolToken::Text("b c".to_string()))
        );
        assert_eq!(reader.next()?, Nothing);
        reader.step_out()?;
        assert_eq!(reader.next()?, Nothing);
        Ok(())
    }

    #[test]
    fn sexp_with_operators() -> IonResult<()> {
        let mut reader = reader_for("(+ 1 2)");
        assert_eq!(reader.next()?, Value(IonType::SExp));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::Symbol));
        assert_eq!(reader.read_symbol()?, RawSymbolToken::Text("+".to_string()));
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.next()?, Nothing);
        reader.step_out()?;
        Ok(())
    }

    #[test]
    fn annotations_on_values() -> IonResult<()> {
        let mut reader = reader_for("a::b::5");
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(
            reader.annotations(),
            &[
                RawSymbolToken::Text("a".to_string()),
                RawSymbolToken::Text("b".to_string())
            ]
        );
        Ok(())
    }

    #[test]
    fn malformed_text_fails_permanently() {
        let mut reader = reader_for("{a: }");
        assert_eq!(reader.next().unwrap(), Value(IonType::Struct));
        reader.step_in().unwrap();
        assert!(reader.next().is_err());
        assert!(reader.next().is_err());
    }

    #[test]
    fn typed_nulls() -> IonResult<()> {
        let mut reader = reader_for("null.string null.struct");
        assert_eq!(reader.next()?, Null(IonType::String));
        assert_eq!(reader.read_null()?, IonType::String);
        assert_eq!(reader.next()?, Null(IonType::Struct));
        Ok(())
    }
}
