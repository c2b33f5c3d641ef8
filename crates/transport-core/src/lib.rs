//! Per-UE UDP listener: a pooled-buffer read loop feeding a bounded
//! channel, drained by a small worker pool that parses and routes SIP
//! datagrams. Mirrors spec.md §4.3.

pub mod buffer_pool;
pub mod error;
pub mod listener;

pub use buffer_pool::{BufferPool, BUFFER_SIZE};
pub use error::{Result, TransportError};
pub use listener::{InboundDatagram, Listener, RoutedMessage, CHANNEL_CAPACITY, WORKER_COUNT};
