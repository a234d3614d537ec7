use crate::raw_symbol_token::RawSymbolToken;
use crate::result::IonResult;
use crate::types::{Decimal, Int, IonType, Timestamp};

/// Defines the functionality needed to serialize a stream of Ion values in either text or
/// binary.
///
/// Writers are cursor-oriented: a value is written at the cursor's current position, and
/// containers are entered and exited explicitly with [IonWriter::step_in] and
/// [IonWriter::step_out]. Annotations and (within a struct) a field name are staged with
/// [IonWriter::set_annotations] and [IonWriter::set_field_name]; they are applied to the next
/// value written and then cleared.
pub trait IonWriter {
    /// The type to which this writer serializes its output.
    type Output;

    /// Returns the (major, minor) version of the Ion stream being written.
    fn ion_version(&self) -> (u8, u8);

    /// Writes an Ion version marker at the current position. Only legal at the top level.
    fn write_ion_version_marker(&mut self, major: u8, minor: u8) -> IonResult<()>;

    /// Returns `true` if this writer can accept symbol tokens that carry text without
    /// consulting a symbol table. Text writers return `true`; raw binary writers return
    /// `false` because they can only encode symbol IDs.
    fn supports_text_symbol_tokens(&self) -> bool;

    /// Replaces the annotations that will be attached to the next value written.
    fn set_annotations<I, A>(&mut self, annotations: I)
    where
        A: Into<RawSymbolToken>,
        I: IntoIterator<Item = A>;

    /// Appends a single annotation for the next value written.
    fn add_annotation<A: Into<RawSymbolToken>>(&mut self, annotation: A);

    /// Writes an Ion null of the specified type.
    fn write_null(&mut self, ion_type: IonType) -> IonResult<()>;

    /// Writes an Ion boolean with the specified value.
    fn write_bool(&mut self, value: bool) -> IonResult<()>;

    /// Writes an Ion integer with the specified i64 value.
    fn write_i64(&mut self, value: i64) -> IonResult<()>;

    /// Writes an Ion integer of any magnitude.
    fn write_int(&mut self, value: &Int) -> IonResult<()>;

    /// Writes an Ion float with the specified f32 value.
    fn write_f32(&mut self, value: f32) -> IonResult<()>;

    /// Writes an Ion float with the specified f64 value.
    fn write_f64(&mut self, value: f64) -> IonResult<()>;

    /// Writes an Ion decimal with the specified value.
    fn write_decimal(&mut self, value: &Decimal) -> IonResult<()>;

    /// Writes an Ion timestamp with the specified value.
    fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()>;

    /// Writes an Ion symbol with the specified value.
    fn write_symbol<A: Into<RawSymbolToken>>(&mut self, value: A) -> IonResult<()>;

    /// Writes an Ion string with the specified value.
    fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()>;

    /// Writes an Ion clob with the specified value.
    fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()>;

    /// Writes an Ion blob with the specified value.
    fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()>;

    /// Starts a new container of the specified type at the current cursor position. Only
    /// list, s-expression, and struct are containers; any other [IonType] is rejected with
    /// an error.
    fn step_in(&mut self, container_type: IonType) -> IonResult<()>;

    /// Sets the field name that will be attached to the next value written. Calling this
    /// method when the writer is not positioned inside a struct will cause the next write to
    /// fail.
    fn set_field_name<A: Into<RawSymbolToken>>(&mut self, name: A);

    /// If the writer is positioned inside a container, returns that container's [IonType].
    fn parent_type(&self) -> Option<IonType>;

    /// Returns the number of containers the writer has stepped into without later stepping
    /// out.
    fn depth(&self) -> usize;

    /// Ends the current container and restores the cursor to its parent.
    fn step_out(&mut self) -> IonResult<()>;

    /// Writes any buffered data to the underlying sink. For writers that manage a symbol
    /// table, this is also the point at which any pending symbol table is serialized ahead
    /// of the buffered values. Only legal at the top level.
    fn flush(&mut self) -> IonResult<()>;

    /// Returns a reference to the sink to which the writer serializes its output.
    fn output(&self) -> &Self::Output;

    /// Returns a mutable reference to the sink to which the writer serializes its output.
    fn output_mut(&mut self) -> &mut Self::Output;
}
