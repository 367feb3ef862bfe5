//! Error type shared by every encode/decode path.
//!
//! All failures are hard: a call either returns a complete result or one of
//! these errors, never a partial tree.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// No entry of the dispatch table matched the mapping.
    #[error("unknown IR shape with keys [{}]", .keys.join(", "))]
    UnknownShape { keys: Vec<String> },

    #[error("boolean IR `value` must be a boolean, found {found}")]
    InvalidBooleanValue { found: String },

    #[error("invalid character {ch:?} at offset {offset} in number text {text:?}")]
    InvalidNumberCharacter { ch: char, offset: usize, text: String },

    #[error("invalid BCD nybble {nybble} at position {position}")]
    InvalidBcdNybble { nybble: u8, position: usize },

    #[error("invalid number literal {text:?}")]
    InvalidNumberLiteral { text: String },

    #[error("cannot decode string payload of {bits} bits")]
    CannotDecodeString { bits: usize },

    #[error("decoded string has {actual} characters, expected {expected}")]
    DecodeLengthMismatch { expected: u64, actual: u64 },

    /// Name dictionary grew past what the two-byte index encoding can address.
    #[error(
        "property name index {index} exceeds the name dictionary limit of {max}",
        max = crate::node::object::MAX_NAME_INDEX
    )]
    IndexOutOfRange { index: usize },

    /// A dispatched shape carried a field of the wrong type.
    #[error("IR key `{key}` is missing or is not {expected}")]
    MalformedIr { key: &'static str, expected: &'static str },

    #[error("document nesting exceeds the configured limit of {limit}")]
    NestingTooDeep { limit: usize },

    #[error("string compression failed: {0}")]
    Compression(#[source] std::io::Error),

    #[error("at JSON path {path} → {message}")]
    Json { path: String, message: String },
}
