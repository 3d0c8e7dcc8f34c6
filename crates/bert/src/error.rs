//! Error types for BERT encoding and decoding.

use thiserror::Error;

use crate::tags::Version;

/// Error during binary decoding.
///
/// Covers the format errors (bad magic, unknown tags, truncation, missing
/// list terminators) as well as the unsupported-version case where a
/// delegated stream arrives without an external packer present.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("bad magic: {found}")]
    BadMagic { found: u8 },

    #[error("unknown term tag: {tag}")]
    UnknownTag { tag: u8 },

    #[error("tag mismatch while reading {context}: expected {expected}, found {found}")]
    TagMismatch {
        context: &'static str,
        expected: u8,
        found: u8,
    },

    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("list of {len} elements is missing its NIL terminator (found {found})")]
    MissingListTerminator { len: usize, found: u8 },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("unparseable float representation: {repr:?}")]
    InvalidFloat { repr: String },

    #[error("unknown complex type tag: {tag:?}")]
    UnknownComplexTag { tag: String },

    #[error("nesting depth exceeds maximum {max}")]
    DepthLimitExceeded { max: usize },

    #[error("malformed encoding: {context}")]
    MalformedEncoding { context: &'static str },

    #[error("version {version:?} stream cannot be decoded without an external packer")]
    UnsupportedVersion { version: Version },

    #[error("packer error: {0}")]
    Packer(String),
}

/// Error during binary encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("atom of {len} bytes exceeds the u16 length prefix")]
    AtomTooLong { len: usize },

    #[error("{field} length {len} exceeds the u32 length prefix")]
    LengthExceedsLimit { field: &'static str, len: usize },

    #[error("non-finite float has no wire representation: {value}")]
    NonFiniteFloat { value: f64 },

    #[error("binary declared as {encoding} is not valid UTF-8")]
    InvalidUtf8 { encoding: String },

    #[error("term of kind {kind} has no direct wire form")]
    UnrepresentableTerm { kind: &'static str },

    #[error("version {version:?} requested without an external packer")]
    UnsupportedVersion { version: Version },

    #[error("packer error: {0}")]
    Packer(String),
}
