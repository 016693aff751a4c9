use std::str::Utf8Error;

use thiserror::Error;

use crate::source::QueryError;

/// Failures while turning raw account bytes into an [`EscrowRecord`](crate::EscrowRecord)
#[derive(Debug, Error)]
pub enum CodecError {
    /// The buffer is shorter than the fixed part of the layout
    #[error("malformed escrow record: expected at least {expected} bytes, got {actual}")]
    MalformedRecord { expected: usize, actual: usize },

    /// The memo bytes are not valid UTF-8
    #[error("escrow memo is not valid utf-8: {0}")]
    EncodingError(#[from] Utf8Error),

    #[error("memo of {len} bytes does not fit in a {capacity} byte field")]
    MemoTooLong { len: usize, capacity: usize },
}

/// Scan-level failures. Per-record problems never end up here.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("account query failed: {0}")]
    QueryFailed(#[source] QueryError),

    #[error("invalid identity {0:?}")]
    InvalidIdentity(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,

    #[error("amount contains a non-digit character")]
    InvalidDigit,

    #[error("amount has more than {max} fractional digits")]
    TooPrecise { max: usize },

    #[error("amount does not fit in 64-bit lamports")]
    Overflow,
}
