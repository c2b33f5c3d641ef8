use thiserror::Error;

/// A type alias for handling `Result`s with [`SipError`]
pub type Result<T> = std::result::Result<T, SipError>;

/// Errors that can occur while decoding or encoding a SIP PDU.
///
/// Per spec.md §7, parse errors are never turned into a wire response -
/// the caller logs and discards. This enum only needs to be precise
/// enough for that log line and for unit tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SipError {
    #[error("buffer does not contain a complete header block")]
    Fragmented,

    #[error("malformed start line: {0}")]
    MalformedStartLine(String),

    #[error("invalid SIP method: {0}")]
    InvalidMethod(String),

    #[error("invalid status code: {0}")]
    InvalidStatusCode(u16),

    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    #[error("missing mandatory header: {0}")]
    MissingHeader(&'static str),

    #[error("duplicate header not allowed to repeat: {0}")]
    DuplicateHeader(&'static str),

    #[error("Max-Forwards out of range [0,255]: {0}")]
    MaxForwardsOutOfRange(i64),

    #[error("CSeq method {header} does not match request method {line}")]
    CSeqMethodMismatch { header: String, line: String },

    #[error("body shorter than Content-Length: expected {expected}, got {actual}")]
    BodyTooShort { expected: usize, actual: usize },

    #[error("multipart boundary parameter missing from Content-Type")]
    MissingMultipartBoundary,
}
