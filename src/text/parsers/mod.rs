//! The [nom]-based parsers that recognize the Ion text grammar, one syntactic category per
//! module. Each parser recognizes a complete lexeme (including any terminator its category
//! requires) and returns an owned, fully parsed value.

pub(crate) mod annotations;
pub(crate) mod blob;
pub(crate) mod boolean;
pub(crate) mod clob;
pub(crate) mod comments;
pub(crate) mod containers;
pub(crate) mod decimal;
pub(crate) mod float;
pub(crate) mod integer;
pub(crate) mod null;
pub(crate) mod numeric_support;
pub(crate) mod string;
pub(crate) mod symbol;
pub(crate) mod text_support;
pub(crate) mod timestamp;
pub(crate) mod top_level;
pub(crate) mod value;
