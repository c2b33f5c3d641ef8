use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{error, warn};
use ue_sip_core::{parser, Message};

use crate::buffer_pool::BufferPool;
use crate::error::Result;

pub const CHANNEL_CAPACITY: usize = 500;
pub const WORKER_COUNT: usize = 3;

/// One datagram, as handed from the read loop to a worker.
pub struct InboundDatagram {
    pub source: SocketAddr,
    pub buffer: Vec<u8>,
    pub length: usize,
}

/// A fully parsed inbound SIP message, ready for routing to a session.
pub struct RoutedMessage {
    pub source: SocketAddr,
    pub message: Message,
}

/// Per-UE listener: one UDP socket, a pooled-buffer read loop, and a
/// worker pool that parses and routes. Mirrors spec.md §4.3.
pub struct Listener {
    socket: Arc<UdpSocket>,
    pool: Arc<BufferPool>,
}

impl Listener {
    pub async fn bind(addr: impl tokio::net::ToSocketAddrs) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self { socket: Arc::new(socket), pool: Arc::new(BufferPool::default()) })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawn the read loop and `WORKER_COUNT` parsing workers, returning
    /// the channel of routed messages the session layer consumes.
    pub fn spawn(self, routed_tx: mpsc::Sender<RoutedMessage>) {
        let (datagram_tx, datagram_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let datagram_rx = Arc::new(tokio::sync::Mutex::new(datagram_rx));

        tokio::spawn(read_loop(self.socket.clone(), self.pool.clone(), datagram_tx));

        for worker_id in 0..WORKER_COUNT {
            let rx = datagram_rx.clone();
            let pool = self.pool.clone();
            let routed_tx = routed_tx.clone();
            tokio::spawn(async move {
                worker_loop(worker_id, rx, pool, routed_tx).await;
            });
        }
    }
}

async fn read_loop(socket: Arc<UdpSocket>, pool: Arc<BufferPool>, datagram_tx: mpsc::Sender<InboundDatagram>) {
    loop {
        let mut buffer = pool.acquire();
        let (length, source) = match socket.recv_from(&mut buffer).await {
            Ok(pair) => pair,
            Err(err) => {
                error!(%err, "udp read loop exiting");
                return;
            }
        };
        if datagram_tx.send(InboundDatagram { source, buffer, length }).await.is_err() {
            return;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    datagram_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<InboundDatagram>>>,
    pool: Arc<BufferPool>,
    routed_tx: mpsc::Sender<RoutedMessage>,
) {
    loop {
        let datagram = {
            let mut rx = datagram_rx.lock().await;
            match rx.recv().await {
                Some(datagram) => datagram,
                None => return,
            }
        };

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            parse_all(&datagram.buffer[..datagram.length])
        }));

        match result {
            Ok(messages) => {
                for message in messages {
                    if routed_tx.send(RoutedMessage { source: datagram.source, message }).await.is_err() {
                        break;
                    }
                }
            }
            Err(_) => warn!(worker_id, "panic while parsing datagram, dropped"),
        }

        pool.release(datagram.buffer);
    }
}

/// Parse as many concatenated PDUs as the buffer holds, dropping the
/// remainder on the first parse error (the sender is expected to retry).
fn parse_all(bytes: &[u8]) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        match parser::parse(rest) {
            Ok((message, tail)) => {
                messages.push(message);
                rest = tail;
            }
            Err(err) => {
                warn!(%err, "dropping unparsable tail of datagram");
                break;
            }
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_splits_concatenated_pdus() {
        let one = b"OPTIONS sip:a@b SIP/2.0\r\nVia: SIP/2.0/UDP 10.0.0.1:5060;branch=z9hG4bK1\r\nFrom: <sip:a@b>;tag=1\r\nTo: <sip:c@d>\r\nCall-ID: call-1\r\nCSeq: 1 OPTIONS\r\nMax-Forwards: 70\r\nContent-Length: 0\r\n\r\n";
        let mut both = one.to_vec();
        both.extend_from_slice(one);
        let messages = parse_all(&both);
        assert_eq!(messages.len(), 2);
    }
}
