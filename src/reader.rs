use std::fmt::{Display, Formatter};
use std::io;
use std::io::Read;

use crate::binary::constants::v1_0::IVM;
use crate::binary::raw_binary_reader::RawBinaryReader;
use crate::data_source::ToIonDataSource;
use crate::raw_reader::RawReader;
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{decoding_error, illegal_operation, unknown_symbol_error_raw, IonResult};
use crate::symbol_table::SymbolTable;
use crate::system_reader::{SystemReader, SystemStreamItem};
use crate::text::raw_text_reader::RawTextReader;
use crate::types::timestamp::Timestamp;
use crate::types::{Decimal, Int, IonType, Symbol};

/// Constructs [Reader] instances without requiring the caller to know which encoding their
/// data uses.
pub struct ReaderBuilder {}

impl ReaderBuilder {
    /// Returns a builder with the default configuration. There is nothing to configure
    /// yet; a shared-table catalog setting would be supplied here.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder {}
    }

    /// Consumes `input` and produces a [Reader] over it. The encoding is chosen by
    /// inspecting the stream's first bytes: an exact Ion version marker selects binary,
    /// and anything else — including a stream too short to hold a marker — is treated as
    /// text. The inspected bytes are replayed ahead of the remaining input, so the reader
    /// sees the stream from its true beginning.
    pub fn build<'a, I>(self, input: I) -> IonResult<Reader<'a>>
    where
        I: 'a + ToIonDataSource,
        I::DataSource: 'a,
    {
        let mut source = input.to_ion_data_source();
        let mut sniff_buffer = [0u8; IVM.len()];
        let bytes_sniffed = Self::fill_sniff_buffer(&mut source, &mut sniff_buffer)?;

        // A binary stream always opens with a four-byte version marker. Shorter inputs
        // can only be text; `1 ` alone is a complete, legal text stream.
        if bytes_sniffed < sniff_buffer.len() {
            return Self::text_reader(sniff_buffer[..bytes_sniffed].to_vec());
        }

        match sniff_buffer {
            IVM => Self::binary_reader(io::Cursor::new(sniff_buffer).chain(source)),
            [0xE0, major, minor, 0xEA] => decoding_error(format!(
                "found binary Ion v{major}.{minor}, but only v1.0 is supported"
            )),
            _ => Self::text_reader(io::Cursor::new(sniff_buffer).chain(source)),
        }
    }

    // Pulls bytes from `source` until `buffer` is full or the input ends, returning how
    // many were read. `read_exact` would treat a short input as an error.
    fn fill_sniff_buffer<R: Read>(source: &mut R, buffer: &mut [u8]) -> IonResult<usize> {
        let mut filled = 0usize;
        while filled < buffer.len() {
            let bytes_read = source.read(&mut buffer[filled..])?;
            if bytes_read == 0 {
                break;
            }
            filled += bytes_read;
        }
        Ok(filled)
    }

    fn text_reader<'a, I: ToIonDataSource>(data: I) -> IonResult<Reader<'a>> {
        // The text reader buffers its input up front, so it owns no borrowed state.
        let raw_reader = Box::new(RawTextReader::new(data)?);
        Ok(Reader::new(raw_reader))
    }

    fn binary_reader<'a, I>(data: I) -> IonResult<Reader<'a>>
    where
        I: ToIonDataSource,
        I::DataSource: 'a,
    {
        let raw_reader = Box::new(RawBinaryReader::new(data.to_ion_data_source()));
        Ok(Reader::new(raw_reader))
    }
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        ReaderBuilder::new()
    }
}

/// The reader type that [ReaderBuilder] produces: a [UserReader] whose underlying format
/// is selected at runtime and hidden behind dynamic dispatch.
pub type Reader<'a> = UserReader<Box<dyn RawReader + 'a>>;

/// Stream components that a [UserReader] reports. System-level constructs (version markers,
/// symbol tables) are handled internally and never surface here.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum StreamItem {
    /// A non-null Ion value and its corresponding Ion data type.
    Value(IonType),
    /// A null Ion value and its corresponding Ion data type.
    Null(IonType),
    /// The cursor is not parked on anything: the stream (or the container being
    /// traversed) has no further values, or the reader has just stepped in or out and
    /// `next()` has not yet been called.
    Nothing,
}

impl StreamItem {
    /// Wraps `ion_type` in [StreamItem::Null] or [StreamItem::Value] according to
    /// `is_null`.
    pub fn nullable_value(ion_type: IonType, is_null: bool) -> StreamItem {
        if is_null {
            StreamItem::Null(ion_type)
        } else {
            StreamItem::Value(ion_type)
        }
    }
}

impl Display for StreamItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use StreamItem::*;
        match self {
            Value(ion_type) => ion_type.fmt(f),
            Null(ion_type) => write!(f, "null.{ion_type}"),
            Nothing => Ok(()),
        }
    }
}

/// An application-level streaming reader: wraps a [SystemReader], hides encoding artifacts
/// from the stream of values it reports, and resolves every symbol ID it hands out against
/// the current symbol table. Which format is being read is entirely the wrapped
/// [RawReader]'s concern.
pub struct UserReader<R: RawReader> {
    system_reader: SystemReader<R>,
}

impl<R: RawReader> UserReader<R> {
    pub(crate) fn new(raw_reader: R) -> UserReader<R> {
        UserReader {
            system_reader: SystemReader::new(raw_reader),
        }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        self.system_reader.symbol_table()
    }

    pub fn ion_version(&self) -> (u8, u8) {
        self.system_reader.ion_version()
    }

    /// Advances to the next user-level value at the current depth. Version markers and
    /// local symbol tables encountered on the way are applied to the reader's state and
    /// skipped.
    // Clippy suggests the Iterator trait for any method named `next`; this is a cursor,
    // not an iterator.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> IonResult<StreamItem> {
        use SystemStreamItem::*;
        loop {
            match self.system_reader.next()? {
                VersionMarker(_, _) | SymbolTableValue(_) => {
                    // Encoding bookkeeping; nothing to show the application.
                }
                Value(ion_type) => return Ok(StreamItem::Value(ion_type)),
                Null(ion_type) => return Ok(StreamItem::Null(ion_type)),
                Nothing => return Ok(StreamItem::Nothing),
            }
        }
    }

    /// If the current item is a value, returns that value's Ion type. Otherwise, returns
    /// None.
    pub fn ion_type(&self) -> Option<IonType> {
        self.raw_reader().ion_type()
    }

    /// Returns `true` if the reader is currently positioned over an Ion null of any type.
    pub fn is_null(&self) -> bool {
        self.raw_reader().is_null()
    }

    /// Returns the current value's annotations, resolved against the symbol table.
    pub fn annotations(&self) -> IonResult<Vec<Symbol>> {
        self.raw_reader()
            .annotations()
            .iter()
            .map(|token| self.resolve_token(token))
            .collect()
    }

    /// If the current item is a field within a struct, returns its resolved field name.
    pub fn field_name(&self) -> IonResult<Symbol> {
        match self.raw_reader().field_name() {
            Some(token) => self.resolve_token(token),
            None => illegal_operation("field_name called when the reader was not on a field"),
        }
    }

    pub fn read_null(&mut self) -> IonResult<IonType> {
        self.raw_reader_mut().read_null()
    }

    pub fn read_bool(&mut self) -> IonResult<bool> {
        self.raw_reader_mut().read_bool()
    }

    pub fn read_i64(&mut self) -> IonResult<i64> {
        self.raw_reader_mut().read_i64()
    }

    pub fn read_int(&mut self) -> IonResult<Int> {
        self.raw_reader_mut().read_int()
    }

    pub fn read_f32(&mut self) -> IonResult<f32> {
        self.raw_reader_mut().read_f32()
    }

    pub fn read_f64(&mut self) -> IonResult<f64> {
        self.raw_reader_mut().read_f64()
    }

    pub fn read_decimal(&mut self) -> IonResult<Decimal> {
        self.raw_reader_mut().read_decimal()
    }

    pub fn read_string(&mut self) -> IonResult<String> {
        self.raw_reader_mut().read_string()
    }

    /// Reads the current symbol value, resolving it against the symbol table.
    pub fn read_symbol(&mut self) -> IonResult<Symbol> {
        let token = self.raw_reader_mut().read_symbol()?;
        self.resolve_token(&token)
    }

    pub fn read_blob_bytes(&mut self) -> IonResult<Vec<u8>> {
        self.raw_reader_mut().read_blob_bytes()
    }

    pub fn read_clob_bytes(&mut self) -> IonResult<Vec<u8>> {
        self.raw_reader_mut().read_clob_bytes()
    }

    pub fn read_timestamp(&mut self) -> IonResult<Timestamp> {
        self.raw_reader_mut().read_timestamp()
    }

    pub fn step_in(&mut self) -> IonResult<()> {
        self.raw_reader_mut().step_in()
    }

    pub fn step_out(&mut self) -> IonResult<()> {
        self.raw_reader_mut().step_out()
    }

    pub fn parent_type(&self) -> Option<IonType> {
        self.raw_reader().parent_type()
    }

    pub fn depth(&self) -> usize {
        self.raw_reader().depth()
    }

    fn raw_reader(&self) -> &R {
        self.system_reader.raw_reader()
    }

    fn raw_reader_mut(&mut self) -> &mut R {
        self.system_reader.raw_reader_mut()
    }

    // Resolves a raw token against the current symbol table. Symbol ID zero is the
    // unknown-text symbol `$0`; other symbol IDs must name a slot in the table, though the
    // slot's own text may be unknown.
    fn resolve_token(&self, token: &RawSymbolToken) -> IonResult<Symbol> {
        match token {
            RawSymbolToken::Text(text) => Ok(Symbol::owned(text.as_str())),
            RawSymbolToken::SymbolId(0) => Ok(Symbol::unknown_text()),
            RawSymbolToken::SymbolId(sid) => self
                .symbol_table()
                .symbol_for(*sid)
                .ok_or_else(|| unknown_symbol_error_raw(*sid)),
        }
    }
}
