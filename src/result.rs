use std::convert::From;
use std::{fmt, io};

use thiserror::Error;

use crate::types::SymbolId;

/// A unified Result type representing the outcome of method calls that may fail.
pub type IonResult<T> = Result<T, IonError>;

/// Represents the different types of high-level failures that might occur when reading or writing
/// Ion data.
#[derive(Debug, Error)]
pub enum IonError {
    /// Indicates that an IO error was encountered while reading or writing.
    #[error("{source:?}")]
    IoError {
        #[from]
        source: io::Error,
    },

    /// Indicates that the input buffer ended while the reader expected more data. The reader
    /// that surfaced this error is no longer usable.
    #[error("the input stream ended unexpectedly while reading {label} at offset {offset}")]
    UnexpectedEof { label: &'static str, offset: usize },

    /// Indicates that the data stream being read contained illegal or otherwise unreadable data.
    /// The reader that surfaced this error is no longer usable.
    #[error("data source produced malformed Ion: {description}")]
    DecodingError { description: String },

    /// Indicates that a value could not be serialized in the requested encoding.
    #[error("could not encode value: {description}")]
    EncodingError { description: String },

    /// Returned when the user has performed an operation that is not legal in the current state,
    /// such as setting a field name at the top level or writing a NaN decimal.
    #[error("the user has performed an operation that is not legal in the current state: {operation}")]
    IllegalOperation { operation: String },

    /// Returned when a requested combination of timestamp fields violates the data model;
    /// for example, an offset on a timestamp with day precision or a fractional second
    /// outside of `[0, 1)`.
    #[error("invalid timestamp: {description}")]
    InvalidTimestamp { description: String },

    /// Indicates that a value was too large to be read into the requested native type.
    /// The value is still available through an arbitrary-precision accessor.
    #[error("{value_description} does not fit in the requested type {target_type}")]
    Overflow {
        value_description: String,
        target_type: &'static str,
    },

    /// Returned when a symbol ID with no corresponding text in the current symbol table
    /// is materialized or written.
    #[error("symbol ID ${sid} could not be resolved against the current symbol table")]
    UnknownSymbol { sid: SymbolId },
}

impl From<fmt::Error> for IonError {
    fn from(error: fmt::Error) -> Self {
        IonError::EncodingError {
            description: error.to_string(),
        }
    }
}

// io::Error does not implement Clone, which precludes deriving it for IonError. Readers hold
// their first fatal error and return it from every subsequent call, so a manual impl that
// reconstructs the io::Error from its kind and message is required.
impl Clone for IonError {
    fn clone(&self) -> Self {
        use IonError::*;
        match self {
            IoError { source } => IoError {
                source: io::Error::new(source.kind(), source.to_string()),
            },
            UnexpectedEof { label, offset } => UnexpectedEof {
                label,
                offset: *offset,
            },
            DecodingError { description } => DecodingError {
                description: description.clone(),
            },
            EncodingError { description } => EncodingError {
                description: description.clone(),
            },
            IllegalOperation { operation } => IllegalOperation {
                operation: operation.clone(),
            },
            InvalidTimestamp { description } => InvalidTimestamp {
                description: description.clone(),
            },
            Overflow {
                value_description,
                target_type,
            } => Overflow {
                value_description: value_description.clone(),
                target_type,
            },
            UnknownSymbol { sid } => UnknownSymbol { sid: *sid },
        }
    }
}

// io::Error is also not PartialEq; like Clone above, io errors are compared by kind.
impl PartialEq for IonError {
    fn eq(&self, other: &Self) -> bool {
        use IonError::*;
        match (self, other) {
            (IoError { source: s1 }, IoError { source: s2 }) => s1.kind() == s2.kind(),
            (
                UnexpectedEof {
                    label: l1,
                    offset: o1,
                },
                UnexpectedEof {
                    label: l2,
                    offset: o2,
                },
            ) => l1 == l2 && o1 == o2,
            (DecodingError { description: d1 }, DecodingError { description: d2 }) => d1 == d2,
            (EncodingError { description: d1 }, EncodingError { description: d2 }) => d1 == d2,
            (IllegalOperation { operation: o1 }, IllegalOperation { operation: o2 }) => o1 == o2,
            (InvalidTimestamp { description: d1 }, InvalidTimestamp { description: d2 }) => {
                d1 == d2
            }
            (
                Overflow {
                    value_description: v1,
                    target_type: t1,
                },
                Overflow {
                    value_description: v2,
                    target_type: t2,
                },
            ) => v1 == v2 && t1 == t2,
            (UnknownSymbol { sid: s1 }, UnknownSymbol { sid: s2 }) => s1 == s2,
            _ => false,
        }
    }
}

/// A convenience method for creating an IonResult containing an IonError::DecodingError with the
/// provided description text.
pub fn decoding_error<T, S: AsRef<str>>(description: S) -> IonResult<T> {
    Err(decoding_error_raw(description))
}

/// A convenience method for creating an IonError::DecodingError with the provided description
/// text. Useful in contexts where the only thing returned is an error, like `ok_or_else`.
pub fn decoding_error_raw<S: AsRef<str>>(description: S) -> IonError {
    IonError::DecodingError {
        description: description.as_ref().to_string(),
    }
}

/// A convenience method for creating an IonResult containing an IonError::EncodingError with the
/// provided description text.
pub fn encoding_error<T, S: AsRef<str>>(description: S) -> IonResult<T> {
    Err(encoding_error_raw(description))
}

/// A convenience method for creating an IonError::EncodingError with the provided description
/// text.
pub fn encoding_error_raw<S: AsRef<str>>(description: S) -> IonError {
    IonError::EncodingError {
        description: description.as_ref().to_string(),
    }
}

/// A convenience method for creating an IonResult containing an IonError::IllegalOperation with
/// the provided operation text.
pub fn illegal_operation<T, S: AsRef<str>>(operation: S) -> IonResult<T> {
    Err(illegal_operation_raw(operation))
}

/// A convenience method for creating an IonError::IllegalOperation with the provided operation
/// text.
pub fn illegal_operation_raw<S: AsRef<str>>(operation: S) -> IonError {
    IonError::IllegalOperation {
        operation: operation.as_ref().to_string(),
    }
}

/// A convenience method for creating an IonResult containing an IonError::InvalidTimestamp with
/// the provided description text.
pub fn invalid_timestamp<T, S: AsRef<str>>(description: S) -> IonResult<T> {
    Err(invalid_timestamp_raw(description))
}

/// A convenience method for creating an IonError::InvalidTimestamp with the provided description
/// text.
pub fn invalid_timestamp_raw<S: AsRef<str>>(description: S) -> IonError {
    IonError::InvalidTimestamp {
        description: description.as_ref().to_string(),
    }
}

/// A convenience method for creating an IonResult containing an IonError::UnexpectedEof.
pub fn incomplete_data_error<T>(label: &'static str, offset: usize) -> IonResult<T> {
    Err(incomplete_data_error_raw(label, offset))
}

/// A convenience method for creating an IonError::UnexpectedEof.
pub fn incomplete_data_error_raw(label: &'static str, offset: usize) -> IonError {
    IonError::UnexpectedEof { label, offset }
}

/// A convenience method for creating an IonResult containing an IonError::Overflow.
pub fn overflow_error<T, S: AsRef<str>>(value_description: S, target_type: &'static str) -> IonResult<T> {
    Err(IonError::Overflow {
        value_description: value_description.as_ref().to_string(),
        target_type,
    })
}

/// A convenience method for creating an IonResult containing an IonError::UnknownSymbol.
pub fn unknown_symbol_error<T>(sid: SymbolId) -> IonResult<T> {
    Err(unknown_symbol_error_raw(sid))
}

/// A convenience method for creating an IonError::UnknownSymbol.
pub fn unknown_symbol_error_raw(sid: SymbolId) -> IonError {
    IonError::UnknownSymbol { sid }
}
