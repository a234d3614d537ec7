use std::io::Write;
use std::mem;

use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{illegal_operation, unknown_symbol_error, IonResult};
use crate::symbol_table::SymbolTable;
use crate::text::raw_text_writer::{RawTextWriter, RawTextWriterBuilder};
use crate::types::{Decimal, Int, IonType, Timestamp};
use crate::writer::IonWriter;

/// Configures and constructs new instances of [TextWriter].
pub struct TextWriterBuilder {
    raw_builder: fn() -> RawTextWriterBuilder,
}

impl TextWriterBuilder {
    pub fn new() -> TextWriterBuilder {
        TextWriterBuilder {
            raw_builder: RawTextWriterBuilder::new,
        }
    }

    /// Configures the writer to produce generously-spaced, human-friendly text.
    pub fn pretty() -> TextWriterBuilder {
        TextWriterBuilder {
            raw_builder: RawTextWriterBuilder::pretty,
        }
    }

    pub fn build<W: Write>(self, sink: W) -> IonResult<TextWriter<W>> {
        Ok(TextWriter {
            raw_writer: (self.raw_builder)().build(sink)?,
            symbol_table: SymbolTable::new(),
            field_name: None,
            annotations: Vec::new(),
        })
    }
}

impl Default for TextWriterBuilder {
    fn default() -> Self {
        TextWriterBuilder::new()
    }
}

/// A text writer that resolves symbol IDs against the stream's symbol table before emitting
/// them. A token that already carries text is written as-is; a symbol ID with known text is
/// written as that text; a defined symbol ID without text is written in its `$n` form; a
/// symbol ID past the end of the table fails with
/// [UnknownSymbol](crate::IonError::UnknownSymbol).
pub struct TextWriter<W: Write> {
    raw_writer: RawTextWriter<W>,
    symbol_table: SymbolTable,
    field_name: Option<RawSymbolToken>,
    annotations: Vec<RawSymbolToken>,
}

impl<W: Write> TextWriter<W> {
    fn resolve(&self, token: RawSymbolToken) -> IonResult<RawSymbolToken> {
        match token {
            text @ RawSymbolToken::Text(_) => Ok(text),
            RawSymbolToken::SymbolId(0) => Ok(RawSymbolToken::SymbolId(0)),
            RawSymbolToken::SymbolId(sid) => {
                if !self.symbol_table.sid_is_valid(sid) {
                    return unknown_symbol_error(sid);
                }
                match self.symbol_table.text_for(sid) {
                    Some(text) => Ok(RawSymbolToken::Text(text.to_string())),
                    None => Ok(RawSymbolToken::SymbolId(sid)),
                }
            }
        }
    }

    fn apply_staged_tokens(&mut self) -> IonResult<()> {
        if let Some(token) = self.field_name.take() {
            let resolved = self.resolve(token)?;
            self.raw_writer.set_field_name(resolved);
        }
        if !self.annotations.is_empty() {
            let annotations = mem::take(&mut self.annotations);
            let mut resolved = Vec::with_capacity(annotations.len());
            for token in annotations {
                resolved.push(self.resolve(token)?);
            }
            self.raw_writer.set_annotations(resolved);
        }
        Ok(())
    }
}

impl<W: Write> IonWriter for TextWriter<W> {
    type Output = W;

    fn ion_version(&self) -> (u8, u8) {
        (1, 0)
    }

    fn write_ion_version_marker(&mut self, major: u8, minor: u8) -> IonResult<()> {
        self.raw_writer.write_ion_version_marker(major, minor)?;
        self.symbol_table.reset();
        Ok(())
    }

    fn supports_text_symbol_tokens(&self) -> bool {
        true
    }

    fn set_annotations<I, A>(&mut self, annotations: I)
    where
        A: Into<RawSymbolToken>,
        I: IntoIterator<Item = A>,
    {
        self.annotations.clear();
        self.annotations
            .extend(annotations.into_iter().map(|a| a.into()));
    }

    fn add_annotation<A: Into<RawSymbolToken>>(&mut self, annotation: A) {
        self.annotations.push(annotation.into());
    }

    fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_null(ion_type)
    }

    fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_bool(value)
    }

    fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_i64(value)
    }

    fn write_int(&mut self, value: &Int) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_int(value)
    }

    fn write_f32(&mut self, value: f32) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_f32(value)
    }

    fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_f64(value)
    }

    fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_decimal(value)
    }

    fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_timestamp(value)
    }

    fn write_symbol<A: Into<RawSymbolToken>>(&mut self, value: A) -> IonResult<()> {
        self.apply_staged_tokens()?;
        let resolved = self.resolve(value.into())?;
        self.raw_writer.write_symbol(resolved)
    }

    fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_string(value)
    }

    fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_clob(value)
    }

    fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.write_blob(value)
    }

    fn step_in(&mut self, container_type: IonType) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.raw_writer.step_in(container_type)
    }

    fn set_field_name<A: Into<RawSymbolToken>>(&mut self, name: A) {
        self.field_name = Some(name.into());
    }

    fn parent_type(&self) -> Option<IonType> {
        self.raw_writer.parent_type()
    }

    fn depth(&self) -> usize {
        self.raw_writer.depth()
    }

    fn step_out(&mut self) -> IonResult<()> {
        if self.field_name.is_some() || !self.annotations.is_empty() {
            return illegal_operation(
                "cannot step_out with a staged field name or annotations that were never used",
            );
        }
        self.raw_writer.step_out()
    }

    fn flush(&mut self) -> IonResult<()> {
        self.raw_writer.flush()
    }

    fn output(&self) -> &W {
        self.raw_writer.output()
    }

    fn output_mut(&mut self) -> &mut W {
        self.raw_writer.output_mut()
    }
}

#[cfg(test)]
mod text_writer_tests {
    use super::*;
    use crate::constants::v1_0::system_symbol_ids;
    use crate::IonError;

    #[test]
    fn system_symbol_ids_resolve_to_text() -> IonResult<()> {
        let mut output = Vec::new();
        let mut writer = TextWriterBuilder::new().build(&mut output)?;
        writer.write_symbol(system_symbol_ids::NAME)?;
        writer.write_symbol(0usize)?;
        writer.flush()?;
        assert_eq!(String::from_utf8(output).unwrap(), "name $0");
        Ok(())
    }

    #[test]
    fn out_of_range_sid_is_rejected() -> IonResult<()> {
        let mut output = Vec::new();
        let mut writer = TextWriterBuilder::new().build(&mut output)?;
        let result = writer.write_symbol(500usize);
        assert!(matches!(result, Err(IonError::UnknownSymbol { sid: 500 })));
        Ok(())
    }
}
