use thiserror::Error;

pub type Result<T> = std::result::Result<T, RtpError>;

#[derive(Error, Debug)]
pub enum RtpError {
    #[error("packet shorter than the 12-byte RTP header: {0} bytes")]
    ShortHeader(usize),

    #[error("media port pool exhausted ({start}..={end})")]
    PoolExhausted { start: u16, end: u16 },

    #[error("I/O error binding media socket: {0}")]
    Io(#[from] std::io::Error),
}
