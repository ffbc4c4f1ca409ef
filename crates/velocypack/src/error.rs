use thiserror::Error;
use velocypack_buffers::BufferError;

use crate::value_type::ValueType;

/// Broad category of a [`VPackError`], for callers that branch on the kind
/// of failure rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The builder API was driven in an invalid order.
    StructuralMisuse,
    /// A decoder was asked for a type the value does not have.
    TypeMismatch,
    IndexOutOfRange,
    /// An integer-coded object key needs an attribute translator.
    NeedsTranslator,
    /// No wire encoding exists for the requested value.
    Unsupported,
    /// The encoded bytes themselves are invalid or truncated.
    Malformed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VPackError {
    #[error("no open array or object to close")]
    NeedOpenCompound,
    #[error("keyed value requires an open object")]
    NeedOpenObject,
    #[error("a key was already written and awaits its value")]
    KeyAlreadyWritten,
    #[error("object key must be a string, found {found}")]
    KeyMustBeString { found: ValueType },
    #[error("object key is still waiting for its value")]
    DanglingKey,
    #[error("{depth} array or object value(s) still open")]
    UnclosedCompound { depth: usize },
    #[error("attribute translator is sealed")]
    TranslatorSealed,
    #[error("unexpected type {found}, expected one of {expected:?}")]
    UnexpectedType {
        expected: &'static [ValueType],
        found: ValueType,
    },
    #[error("number does not fit in {target}")]
    NumberOutOfRange { target: &'static str },
    #[error("index {index} out of range for length {length}")]
    IndexOutOfRange { index: usize, length: usize },
    #[error("integer attribute key requires an attribute translator")]
    NeedAttributeTranslator,
    #[error("unknown attribute code {0}")]
    UnknownAttributeCode(i64),
    #[error("invalid object key type {found}")]
    KeyType { found: ValueType },
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("invalid type code {0:#04x}")]
    InvalidTypeCode(u8),
    #[error("invalid date string")]
    DateParse,
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl VPackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VPackError::NeedOpenCompound
            | VPackError::NeedOpenObject
            | VPackError::KeyAlreadyWritten
            | VPackError::KeyMustBeString { .. }
            | VPackError::DanglingKey
            | VPackError::UnclosedCompound { .. }
            | VPackError::TranslatorSealed => ErrorKind::StructuralMisuse,
            VPackError::UnexpectedType { .. }
            | VPackError::NumberOutOfRange { .. }
            | VPackError::KeyType { .. } => ErrorKind::TypeMismatch,
            VPackError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            VPackError::NeedAttributeTranslator | VPackError::UnknownAttributeCode(_) => {
                ErrorKind::NeedsTranslator
            }
            VPackError::Unsupported(_) => ErrorKind::Unsupported,
            VPackError::InvalidTypeCode(_) | VPackError::DateParse | VPackError::Buffer(_) => {
                ErrorKind::Malformed
            }
        }
    }

    pub(crate) fn unexpected(expected: &'static [ValueType], found: ValueType) -> Self {
        VPackError::UnexpectedType { expected, found }
    }
}

pub type Result<T, E = VPackError> = std::result::Result<T, E>;
