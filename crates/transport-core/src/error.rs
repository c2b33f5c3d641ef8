use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error on UDP socket: {0}")]
    Io(#[from] std::io::Error),

    #[error("inbound queue is full, datagram dropped")]
    QueueFull,
}
