use std::io::Write;
use std::mem;

use crate::binary::constants::v1_0::IVM;
use crate::binary::raw_binary_writer::RawBinaryWriter;
use crate::constants::v1_0::system_symbol_ids;
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{illegal_operation, unknown_symbol_error, IonResult};
use crate::symbol_table::SymbolTable;
use crate::types::{Decimal, Int, IonType, SymbolId, Timestamp};
use crate::writer::IonWriter;

/// Configures and constructs new instances of [BinaryWriter].
pub struct BinaryWriterBuilder {
    omit_version_marker: bool,
}

impl BinaryWriterBuilder {
    pub fn new() -> BinaryWriterBuilder {
        BinaryWriterBuilder {
            omit_version_marker: false,
        }
    }

    /// Configures the writer to skip the Ion version marker that would otherwise begin the
    /// stream. Used when the output will be appended to an existing Ion stream.
    pub fn omit_version_marker(mut self) -> BinaryWriterBuilder {
        self.omit_version_marker = true;
        self
    }

    pub fn build<W: Write>(self, sink: W) -> IonResult<BinaryWriter<W>> {
        let symbol_table = SymbolTable::new();
        let symbols_flushed = symbol_table.len();
        Ok(BinaryWriter {
            data_writer: RawBinaryWriter::new(Vec::new()),
            symbol_table_writer: RawBinaryWriter::new(Vec::new()),
            output: sink,
            symbol_table,
            symbols_flushed,
            ivm_written: false,
            omit_version_marker: self.omit_version_marker,
            field_name: None,
            annotations: Vec::new(),
        })
    }
}

impl Default for BinaryWriterBuilder {
    fn default() -> Self {
        BinaryWriterBuilder::new()
    }
}

/// A binary writer that manages the stream's symbol table.
///
/// Symbol tokens with text are interned into the local symbol table; tokens that are already
/// symbol IDs are validated against it. User values accumulate in a buffered
/// [RawBinaryWriter]; at [flush](IonWriter::flush) time, the writer emits (in order) the Ion
/// version marker if it has not yet been written, a `$ion_symbol_table` struct describing any
/// newly interned symbols, and finally the buffered values. The first such struct declares
/// the complete local table; later ones use `imports: $ion_symbol_table` to append.
pub struct BinaryWriter<W: Write> {
    data_writer: RawBinaryWriter<Vec<u8>>,
    symbol_table_writer: RawBinaryWriter<Vec<u8>>,
    output: W,
    symbol_table: SymbolTable,
    // The number of symbol table slots that previous flushes have already described
    symbols_flushed: usize,
    ivm_written: bool,
    omit_version_marker: bool,
    field_name: Option<RawSymbolToken>,
    annotations: Vec<RawSymbolToken>,
}

impl<W: Write> BinaryWriter<W> {
    /// Returns a reference to the writer's symbol table.
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    fn resolve(&mut self, token: RawSymbolToken) -> IonResult<SymbolId> {
        match token {
            RawSymbolToken::SymbolId(sid) => {
                if self.symbol_table.sid_is_valid(sid) {
                    Ok(sid)
                } else {
                    unknown_symbol_error(sid)
                }
            }
            RawSymbolToken::Text(text) => Ok(self.symbol_table.intern(text)),
        }
    }

    // Resolves the staged field name and annotations to symbol IDs and hands them to the
    // raw writer ahead of the next value.
    fn apply_staged_tokens(&mut self) -> IonResult<()> {
        if let Some(token) = self.field_name.take() {
            let sid = self.resolve(token)?;
            self.data_writer.set_field_name(sid);
        }
        if !self.annotations.is_empty() {
            let annotations = mem::take(&mut self.annotations);
            let mut sids: Vec<SymbolId> = Vec::with_capacity(annotations.len());
            for token in annotations {
                sids.push(self.resolve(token)?);
            }
            self.data_writer.set_annotations(sids);
        }
        Ok(())
    }

    fn write_symbol_table_delta(&mut self) -> IonResult<()> {
        let is_append = self.symbols_flushed > crate::constants::v1_0::SYSTEM_SYMBOLS.len();
        let symbol_table_writer = &mut self.symbol_table_writer;
        symbol_table_writer.set_annotations([system_symbol_ids::ION_SYMBOL_TABLE]);
        symbol_table_writer.step_in(IonType::Struct)?;
        if is_append {
            // `imports: $ion_symbol_table` means "extend the local table currently in
            // effect" rather than starting over.
            symbol_table_writer.set_field_name(system_symbol_ids::IMPORTS);
            symbol_table_writer.write_symbol(system_symbol_ids::ION_SYMBOL_TABLE)?;
        }
        symbol_table_writer.set_field_name(system_symbol_ids::SYMBOLS);
        symbol_table_writer.step_in(IonType::List)?;
        for slot in self.symbol_table.symbols_tail(self.symbols_flushed) {
            match slot {
                Some(text) => symbol_table_writer.write_string(text)?,
                None => symbol_table_writer.write_null(IonType::Null)?,
            }
        }
        symbol_table_writer.step_out()?;
        symbol_table_writer.step_out()?;
        symbol_table_writer.flush()?;
        self.output
            .write_all(symbol_table_writer.output().as_slice())?;
        symbol_table_writer.output_mut().clear();
        Ok(())
    }
}

impl<W: Write> IonWriter for BinaryWriter<W> {
    type Output = W;

    fn ion_version(&self) -> (u8, u8) {
        (1, 0)
    }

    fn write_ion_version_marker(&mut self, major: u8, minor: u8) -> IonResult<()> {
        if (major, minor) != (1, 0) {
            return illegal_operation(format!(
                "this writer can only write Ion v1.0; v{major}.{minor} was requested"
            ));
        }
        // Everything written so far belongs to the stream segment that precedes the marker.
        self.flush()?;
        self.output.write_all(&IVM)?;
        self.ivm_written = true;
        // An IVM resets the symbol table to the system table.
        self.symbol_table.reset();
        self.symbols_flushed = self.symbol_table.len();
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
        self.data_writer.write_null(ion_type)
    }

    fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.write_bool(value)
    }

    fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.write_i64(value)
    }

    fn write_int(&mut self, value: &Int) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.write_int(value)
    }

    fn write_f32(&mut self, value: f32) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.write_f32(value)
    }

    fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.write_f64(value)
    }

    fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.write_decimal(value)
    }

    fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.write_timestamp(value)
    }

    fn write_symbol<A: Into<RawSymbolToken>>(&mut self, value: A) -> IonResult<()> {
        self.apply_staged_tokens()?;
        let sid = self.resolve(value.into())?;
        self.data_writer.write_symbol(sid)
    }

    fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.write_string(value)
    }

    fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.write_clob(value)
    }

    fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.write_blob(value)
    }

    fn step_in(&mut self, container_type: IonType) -> IonResult<()> {
        self.apply_staged_tokens()?;
        self.data_writer.step_in(container_type)
    }

    fn set_field_name<A: Into<RawSymbolToken>>(&mut self, name: A) {
        self.field_name = Some(name.into());
    }

    fn parent_type(&self) -> Option<IonType> {
        self.data_writer.parent_type()
    }

    fn depth(&self) -> usize {
        self.data_writer.depth()
    }

    fn step_out(&mut self) -> IonResult<()> {
        if self.field_name.is_some() || !self.annotations.is_empty() {
            return illegal_operation(
                "cannot step_out with a staged field name or annotations that were never used",
            );
        }
        self.data_writer.step_out()
    }

    fn flush(&mut self) -> IonResult<()> {
        if self.depth() > 0 {
            return illegal_operation("flush called with unclosed containers");
        }
        if !self.ivm_written && !self.omit_version_marker {
            self.output.write_all(&IVM)?;
            self.ivm_written = true;
        }
        if self.symbol_table.len() > self.symbols_flushed {
            self.write_symbol_table_delta()?;
            self.symbols_flushed = self.symbol_table.len();
        }
        self.data_writer.flush()?;
        self.output
            .write_all(self.data_writer.output().as_slice())?;
        self.data_writer.output_mut().clear();
        self.output.flush()?;
        Ok(())
    }

    fn output(&self) -> &W {
        &self.output
    }

    fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }
}
