//! This module provides the necessary structures and logic to read from and write to
//! binary Ion 1.0 data streams.

pub(crate) mod binary_writer;
pub(crate) mod constants;
pub(crate) mod decimal;
pub(crate) mod header;
pub(crate) mod int;
pub(crate) mod ion_type_code;
pub(crate) mod raw_binary_reader;
pub(crate) mod raw_binary_writer;
pub(crate) mod timestamp;
pub(crate) mod uint;
pub(crate) mod var_int;
pub(crate) mod var_uint;

pub use binary_writer::{BinaryWriter, BinaryWriterBuilder};
pub use raw_binary_reader::RawBinaryReader;
pub use raw_binary_writer::RawBinaryWriter;
