use thiserror::Error;

/// A type alias for handling `Result`s with [`CodecError`]
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while transcoding audio or detecting DTMF tones.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The payload type carried in the frame is not one we transcode.
    #[error("unsupported payload type: {0}")]
    UnsupportedPayloadType(u8),

    /// A frame was shorter than the codec's fixed block size.
    #[error("short frame: expected at least {expected} bytes, got {actual}")]
    ShortFrame { expected: usize, actual: usize },

    /// PCM buffer length is not a multiple of 2 (16-bit samples).
    #[error("PCM buffer has odd length {0}")]
    OddPcmLength(usize),
}
