//! This module provides the necessary structures and logic to read from and write to
//! Ion 1.0 text data streams.

pub(crate) mod parent_container;
pub(crate) mod parsers;
pub(crate) mod raw_text_reader;
pub(crate) mod raw_text_writer;
pub(crate) mod text_buffer;
pub(crate) mod text_formatter;
pub(crate) mod text_value;
pub(crate) mod text_writer;

pub use raw_text_reader::RawTextReader;
pub use raw_text_writer::{RawTextWriter, RawTextWriterBuilder};
pub use text_writer::{TextWriter, TextWriterBuilder};
