use parking_lot::Mutex;

pub const BUFFER_SIZE: usize = 4096;

/// A fixed-size byte buffer pool: the read loop borrows a buffer, fills
/// it from the socket, hands it downstream, and the worker returns it
/// once the datagram has been parsed. Avoids a fresh allocation per
/// datagram on a busy UE.
pub struct BufferPool {
    buffer_size: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new(buffer_size: usize) -> Self {
        Self { buffer_size, free: Mutex::new(Vec::new()) }
    }

    pub fn acquire(&self) -> Vec<u8> {
        self.free.lock().pop().unwrap_or_else(|| vec![0u8; self.buffer_size])
    }

    pub fn release(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        buffer.resize(self.buffer_size, 0);
        self.free.lock().push(buffer);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(BUFFER_SIZE)
    }
}
