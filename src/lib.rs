//! # ion-core
//!
//! A streaming implementation of the [Amazon Ion](https://amazon-ion.github.io/ion-docs/)
//! 1.0 data format, covering both of its isomorphic encodings: a compact binary form and a
//! human-readable text form.
//!
//! The crate is organized in layers:
//!
//! * **Raw readers and writers** ([RawBinaryReader], [RawTextReader], [RawBinaryWriter],
//!   [RawTextWriter]) encode and decode a single format and traffic in unresolved
//!   [RawSymbolToken]s.
//! * **System and user readers/writers** ([SystemReader], [Reader], [BinaryWriter],
//!   [TextWriter]) manage the stream's symbol table, resolving symbol IDs to text and
//!   emitting local symbol tables as needed.
//! * **The element API** ([element::Element]) materializes whole values as trees, with
//!   exact-precision numerics ([Decimal], [Int], [Timestamp]) preserved through every
//!   round trip.
//!
//! ```
//! use ion_core::element::Element;
//! use ion_core::{BinaryWriterBuilder, IonResult, IonWriter};
//!
//! # fn main() -> IonResult<()> {
//! let value = Element::read_one("{temperature: 22.5, unit: celsius}")?;
//!
//! let mut buffer = Vec::new();
//! let mut writer = BinaryWriterBuilder::new().build(&mut buffer)?;
//! value.write_to(&mut writer)?;
//! writer.flush()?;
//! drop(writer);
//!
//! assert_eq!(Element::read_one(buffer.as_slice())?, value);
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod element;
pub mod text;

pub(crate) mod constants;
mod data_source;
mod ion_eq;
mod raw_reader;
mod raw_symbol_token;
mod reader;
pub mod result;
mod symbol_table;
mod system_reader;
pub mod types;
mod writer;

pub use binary::{BinaryWriter, BinaryWriterBuilder, RawBinaryReader, RawBinaryWriter};
pub use data_source::{IonDataSource, ToIonDataSource};
pub use ion_eq::IonEq;
pub use raw_reader::{RawReader, RawStreamItem};
pub use raw_symbol_token::RawSymbolToken;
pub use reader::{Reader, ReaderBuilder, StreamItem, UserReader};
pub use result::{IonError, IonResult};
pub use symbol_table::SymbolTable;
pub use system_reader::{SystemReader, SystemStreamItem};
pub use text::{RawTextReader, RawTextWriter, RawTextWriterBuilder, TextWriter, TextWriterBuilder};
pub use types::{Decimal, Int, IonType, Symbol, SymbolId, Timestamp};
pub use writer::IonWriter;
