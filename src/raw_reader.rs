use std::fmt::{Display, Formatter};

use crate::raw_symbol_token::RawSymbolToken;
use crate::result::IonResult;
use crate::types::{Decimal, Int, IonType, Timestamp};

/// A cursor over a single Ion encoding.
///
/// Implementations parse one format (text or binary) and surface what they find without
/// interpretation: symbol IDs are not resolved to text, and system constructs like local
/// symbol table structs are reported as ordinary values. The layers above
/// ([SystemReader](crate::SystemReader) and [UserReader](crate::UserReader)) add those
/// behaviors.
///
/// The cursor sits between values. Each call to [next](RawReader::next) moves it past the
/// item it was parked on; the typed `read_*` methods are only meaningful while the cursor
/// is parked on a value of the matching type, and a value that has already been consumed
/// may refuse a second read.
pub trait RawReader {
    /// The Ion version of the stream segment being read, as declared by the most recent
    /// version marker. Before any marker has been seen, this is (1, 0).
    fn ion_version(&self) -> (u8, u8);

    /// Moves the cursor past the current item to the next one at the same depth and
    /// reports what it landed on. Container contents are not entered implicitly; a
    /// container encountered here is skipped whole unless [RawReader::step_in] is called
    /// first.
    fn next(&mut self) -> IonResult<RawStreamItem>;

    /// Reports the item the cursor most recently landed on, without moving it.
    fn current(&self) -> RawStreamItem;

    /// The Ion type of the value under the cursor, or `None` if the cursor is between
    /// values.
    fn ion_type(&self) -> Option<IonType>;

    /// True if the cursor is parked on a null of any type.
    fn is_null(&self) -> bool;

    /// The annotations attached to the value under the cursor, in order. Empty when there
    /// is no current value or the value is unannotated.
    fn annotations(&self) -> &[RawSymbolToken];

    /// Inside a struct, the name of the field whose value the cursor is parked on;
    /// `None` anywhere else.
    fn field_name(&self) -> Option<&RawSymbolToken>;

    /// Reads the current value as a null, returning which of the types it is a null of.
    fn read_null(&mut self) -> IonResult<IonType>;

    /// Reads the current value as a boolean.
    fn read_bool(&mut self) -> IonResult<bool>;

    /// Reads the current value as an integer, provided it fits in an `i64`. A larger
    /// magnitude produces an [Overflow](crate::IonError::Overflow) error; [RawReader::read_int]
    /// has no such limit.
    fn read_i64(&mut self) -> IonResult<i64>;

    /// Reads the current value as an integer of any magnitude.
    fn read_int(&mut self) -> IonResult<Int>;

    /// Reads the current value as a 32-bit float.
    fn read_f32(&mut self) -> IonResult<f32>;

    /// Reads the current value as a 64-bit float.
    fn read_f64(&mut self) -> IonResult<f64>;

    /// Reads the current value as a [Decimal].
    fn read_decimal(&mut self) -> IonResult<Decimal>;

    /// Reads the current value as a string.
    fn read_string(&mut self) -> IonResult<String>;

    /// Reads the current value as a symbol token. The token is unresolved: binary streams
    /// yield symbol IDs here, text streams usually yield text.
    fn read_symbol(&mut self) -> IonResult<RawSymbolToken>;

    /// Reads the current blob value's bytes.
    fn read_blob_bytes(&mut self) -> IonResult<Vec<u8>>;

    /// Reads the current clob value's bytes.
    fn read_clob_bytes(&mut self) -> IonResult<Vec<u8>>;

    /// Reads the current value as a [Timestamp].
    fn read_timestamp(&mut self) -> IonResult<Timestamp>;

    /// Enters the container under the cursor. Afterwards the cursor sits before the
    /// container's first child; [RawReader::next] advances to it. Fails if the current
    /// value is not a (non-null) list, s-expression, or struct.
    fn step_in(&mut self) -> IonResult<()>;

    /// Leaves the container the cursor is currently inside of, discarding any of its
    /// children that were never visited. The next [RawReader::next] call lands on whatever
    /// follows the container. Fails at the top level, where there is nothing to leave.
    fn step_out(&mut self) -> IonResult<()>;

    /// The type of the container the cursor is inside of, or `None` at the top level.
    fn parent_type(&self) -> Option<IonType>;

    /// How many containers the cursor is currently inside of. Zero at the top level.
    fn depth(&self) -> usize;
}

/// The kinds of items a [RawReader] can encounter as it moves through a stream.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum RawStreamItem {
    /// A version marker (the binary `E0 01 00 EA` sequence or the text symbol
    /// `$ion_1_0`), introducing a new stream segment encoded with the reported Ion
    /// version.
    VersionMarker(u8, u8),
    /// A value of the reported type. Encoding artifacts such as symbol table structs are
    /// not distinguished from user data at this level; both appear as plain values.
    Value(IonType),
    /// A typed null.
    Null(IonType),
    /// The cursor is not parked on anything. This is what `next()` returns at the end of
    /// the stream or of the current container, and what `current()` reports after a
    /// step_in/step_out (until `next()` is called) or before reading has begun.
    Nothing,
}

impl RawStreamItem {
    /// Wraps `ion_type` in [RawStreamItem::Null] or [RawStreamItem::Value] according to
    /// `is_null`.
    pub fn nullable_value(ion_type: IonType, is_null: bool) -> RawStreamItem {
        if is_null {
            RawStreamItem::Null(ion_type)
        } else {
            RawStreamItem::Value(ion_type)
        }
    }
}

impl Display for RawStreamItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RawStreamItem::VersionMarker(major, minor) => write!(f, "<IVM v{major}.{minor}>"),
            RawStreamItem::Value(ion_type) => ion_type.fmt(f),
            RawStreamItem::Null(ion_type) => write!(f, "null.{ion_type}"),
            RawStreamItem::Nothing => write!(f, "<nothing>"),
        }
    }
}

// Generates forwarding methods for the typed accessors, which all share the
// `(&mut self) -> IonResult<_>` shape. The UFCS calls coerce the box into a plain
// reference to the wrapped reader.
macro_rules! forward_typed_reads {
    ($($method:ident => $ret:ty),* $(,)?) => {
        $(
            fn $method(&mut self) -> IonResult<$ret> {
                R::$method(self)
            }
        )*
    };
}

// `ReaderBuilder` hands out readers as `Box<dyn RawReader>`; this impl lets the boxed form
// stand in for the reader it wraps.
impl<R: RawReader + ?Sized> RawReader for Box<R> {
    fn ion_version(&self) -> (u8, u8) {
        R::ion_version(self)
    }

    fn next(&mut self) -> IonResult<RawStreamItem> {
        R::next(self)
    }

    fn current(&self) -> RawStreamItem {
        R::current(self)
    }

    fn ion_type(&self) -> Option<IonType> {
        R::ion_type(self)
    }

    fn is_null(&self) -> bool {
        R::is_null(self)
    }

    fn annotations(&self) -> &[RawSymbolToken] {
        R::annotations(self)
    }

    fn field_name(&self) -> Option<&RawSymbolToken> {
        R::field_name(self)
    }

    forward_typed_reads!(
        read_null => IonType,
        read_bool => bool,
        read_i64 => i64,
        read_int => Int,
        read_f32 => f32,
        read_f64 => f64,
        read_decimal => Decimal,
        read_string => String,
        read_symbol => RawSymbolToken,
        read_blob_bytes => Vec<u8>,
        read_clob_bytes => Vec<u8>,
        read_timestamp => Timestamp,
    );

    fn step_in(&mut self) -> IonResult<()> {
        R::step_in(self)
    }

    fn step_out(&mut self) -> IonResult<()> {
        R::step_out(self)
    }

    fn parent_type(&self) -> Option<IonType> {
        R::parent_type(self)
    }

    fn depth(&self) -> usize {
        R::depth(self)
    }
}
