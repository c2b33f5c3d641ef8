use thiserror::Error;

/// A type alias for handling `Result`s with [`SdpError`]
pub type Result<T> = std::result::Result<T, SdpError>;

/// Errors that can occur while parsing or negotiating an SDP body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdpError {
    #[error("malformed SDP line: {0}")]
    MalformedLine(String),

    #[error("missing required SDP field: {0}")]
    MissingField(&'static str),

    #[error("no compatible audio media found in offer")]
    NoCompatibleMedia,

    #[error("unsupported ptime: {0}, only 20ms is accepted")]
    UnsupportedPtime(u32),

    #[error("invalid connection address: {0}")]
    InvalidConnection(String),
}
