//! Reusable output buffers.
//!
//! Every write acquires its buffers here and hands them back when the guard is
//! dropped, on success and on error alike. Buffers that grew very large are
//! released to the allocator instead of being kept.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

const MAX_POOLED: usize = 32;
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;
const INITIAL_CAPACITY: usize = 256;

static POOL: Lazy<BufferPool> = Lazy::new(BufferPool::new);

/// A process-wide stack of empty byte buffers.
pub(crate) struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    fn new() -> Self {
        BufferPool {
            buffers: Mutex::new(Vec::with_capacity(MAX_POOLED)),
        }
    }

    fn acquire(&self) -> Vec<u8> {
        self.buffers
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY))
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut buffers = self.buffers.lock();
        if buffers.len() < MAX_POOLED {
            buffers.push(buf);
        }
    }

    #[cfg(test)]
    fn idle(&self) -> usize {
        self.buffers.lock().len()
    }
}

/// A buffer on loan from the pool.
pub(crate) struct PooledBuffer {
    buf: Vec<u8>,
}

impl PooledBuffer {
    pub(crate) fn acquire() -> Self {
        PooledBuffer { buf: POOL.acquire() }
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        POOL.release(std::mem::take(&mut self.buf));
    }
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}
