use std::collections::HashMap;
use std::net::UdpSocket;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Result, RtpError};

/// Even-numbered RTP ports reserved for active calls, mirroring the
/// original UE's media pool: one socket per call, released back to the
/// pool when the call tears down.
pub struct MediaPortPool {
    start: u16,
    end: u16,
    allocated: Mutex<HashMap<u16, bool>>,
}

impl MediaPortPool {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end, allocated: Mutex::new(HashMap::new()) }
    }

    /// Bind a UDP socket on the first free port in range, mark it taken,
    /// and hand back both the port and the bound socket.
    pub fn reserve(&self, bind_addr: &str) -> Result<(u16, UdpSocket)> {
        let mut allocated = self.allocated.lock();
        for port in (self.start..=self.end).step_by(2) {
            if allocated.get(&port).copied().unwrap_or(false) {
                continue;
            }
            match UdpSocket::bind((bind_addr, port)) {
                Ok(socket) => {
                    allocated.insert(port, true);
                    debug!(port, "reserved media port");
                    return Ok((port, socket));
                }
                Err(_) => continue,
            }
        }
        Err(RtpError::PoolExhausted { start: self.start, end: self.end })
    }

    /// Release a previously reserved port. Releasing a port that isn't
    /// marked as allocated is logged and otherwise ignored, not an error.
    pub fn release(&self, port: u16) {
        let mut allocated = self.allocated.lock();
        match allocated.insert(port, false) {
            Some(true) => debug!(port, "released media port"),
            _ => warn!(port, "released a media port that was not reserved"),
        }
    }

    pub fn in_use_count(&self) -> usize {
        self.allocated.lock().values().filter(|&&taken| taken).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserves_and_releases_a_port() {
        let pool = MediaPortPool::new(40000, 40010);
        let (port, _socket) = pool.reserve("127.0.0.1").unwrap();
        assert!((40000..=40010).contains(&port));
        assert_eq!(pool.in_use_count(), 1);
        pool.release(port);
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn double_release_does_not_panic() {
        let pool = MediaPortPool::new(40100, 40110);
        let (port, _socket) = pool.reserve("127.0.0.1").unwrap();
        pool.release(port);
        pool.release(port);
    }

    #[test]
    fn exhausted_pool_errors() {
        let pool = MediaPortPool::new(40200, 40200);
        let _first = pool.reserve("127.0.0.1").unwrap();
        assert!(pool.reserve("127.0.0.1").is_err());
    }
}
