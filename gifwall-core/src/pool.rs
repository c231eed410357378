//! Buffer pool implementations for per-frame allocation reuse.
//!
//! Decoding an animated GIF churns through one display raster per frame
//! plus index and pixel scratch arrays. The pools here recycle those by
//! exact size class so steady-state animation allocates nothing.

use crate::raster::{PixelBuffer, BYTES_PER_PIXEL};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// A pool of reusable ARGB rasters, keyed by capacity class.
///
/// A request with a matching free buffer reshapes it to the requested
/// dimensions without reallocating; otherwise a new buffer is allocated.
pub struct FramePool {
    /// Free buffers by capacity class (byte length).
    available: HashMap<usize, VecDeque<PixelBuffer>>,
    /// Total buffers allocated (for statistics).
    total_allocated: usize,
}

impl FramePool {
    /// Create an empty frame pool.
    pub fn new() -> Self {
        Self {
            available: HashMap::new(),
            total_allocated: 0,
        }
    }

    /// Acquire a buffer with exactly the given dimensions.
    pub fn obtain(&mut self, width: u32, height: u32) -> PixelBuffer {
        let class = width as usize * height as usize * BYTES_PER_PIXEL;
        if let Some(queue) = self.available.get_mut(&class) {
            if let Some(mut buffer) = queue.pop_front() {
                // Same capacity class, so this cannot fail.
                buffer.reconfigure(width, height);
                return buffer;
            }
        }
        self.total_allocated += 1;
        PixelBuffer::new(width, height)
    }

    /// Release a buffer back to the pool.
    pub fn release(&mut self, buffer: PixelBuffer) {
        self.available
            .entry(buffer.capacity_class())
            .or_default()
            .push_back(buffer);
    }

    /// Get the number of free buffers across all classes.
    pub fn available(&self) -> usize {
        self.available.values().map(VecDeque::len).sum()
    }

    /// Get the total number of allocated buffers.
    pub fn total_allocated(&self) -> usize {
        self.total_allocated
    }

    /// Drop all pooled buffers.
    pub fn flush(&mut self) {
        self.available.clear();
    }
}

impl Default for FramePool {
    fn default() -> Self {
        Self::new()
    }
}

/// A pool of reusable scratch vectors, keyed by exact element count.
pub struct ScratchPool<T: Clone + Default> {
    available: HashMap<usize, VecDeque<Vec<T>>>,
    total_allocated: usize,
}

impl<T: Clone + Default> ScratchPool<T> {
    /// Create an empty scratch pool.
    pub fn new() -> Self {
        Self {
            available: HashMap::new(),
            total_allocated: 0,
        }
    }

    /// Acquire a vector of exactly `len` elements.
    pub fn obtain(&mut self, len: usize) -> Vec<T> {
        if let Some(queue) = self.available.get_mut(&len) {
            if let Some(vec) = queue.pop_front() {
                return vec;
            }
        }
        self.total_allocated += 1;
        vec![T::default(); len]
    }

    /// Release a vector back to the pool.
    pub fn release(&mut self, vec: Vec<T>) {
        self.available.entry(vec.len()).or_default().push_back(vec);
    }

    /// Get the total number of allocated vectors.
    pub fn total_allocated(&self) -> usize {
        self.total_allocated
    }

    /// Drop all pooled vectors.
    pub fn flush(&mut self) {
        self.available.clear();
    }
}

impl<T: Clone + Default> Default for ScratchPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct PoolsInner {
    frames: FramePool,
    bytes: ScratchPool<u8>,
    pixels: ScratchPool<u32>,
}

/// Thread-safe pools shared between the decode worker and render thread.
///
/// Each operation takes one short critical section; obtain/release/flush
/// are safe to call concurrently from both sides of the frame handoff.
pub struct SharedPools {
    inner: Arc<Mutex<PoolsInner>>,
}

impl SharedPools {
    /// Create a new set of shared pools.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PoolsInner {
                frames: FramePool::new(),
                bytes: ScratchPool::new(),
                pixels: ScratchPool::new(),
            })),
        }
    }

    /// Acquire an ARGB raster.
    pub fn obtain_frame(&self, width: u32, height: u32) -> PixelBuffer {
        self.inner.lock().frames.obtain(width, height)
    }

    /// Release a raster back to the pool.
    pub fn release_frame(&self, buffer: PixelBuffer) {
        self.inner.lock().frames.release(buffer);
    }

    /// Acquire a byte scratch array of exactly `len` elements.
    pub fn obtain_bytes(&self, len: usize) -> Vec<u8> {
        self.inner.lock().bytes.obtain(len)
    }

    /// Release a byte scratch array.
    pub fn release_bytes(&self, vec: Vec<u8>) {
        self.inner.lock().bytes.release(vec);
    }

    /// Acquire a pixel scratch array of exactly `len` elements.
    pub fn obtain_pixels(&self, len: usize) -> Vec<u32> {
        self.inner.lock().pixels.obtain(len)
    }

    /// Release a pixel scratch array.
    pub fn release_pixels(&self, vec: Vec<u32>) {
        self.inner.lock().pixels.release(vec);
    }

    /// Number of free rasters in the frame pool.
    pub fn frames_available(&self) -> usize {
        self.inner.lock().frames.available()
    }

    /// Total rasters ever allocated by the frame pool.
    pub fn frames_allocated(&self) -> usize {
        self.inner.lock().frames.total_allocated()
    }

    /// Total pixel scratch arrays ever allocated.
    pub fn pixels_allocated(&self) -> usize {
        self.inner.lock().pixels.total_allocated()
    }

    /// Release every pooled resource and clear all pools.
    ///
    /// Called when a drawable is discarded so pooled memory does not
    /// outlive the animation that produced it.
    pub fn flush(&self) {
        let mut inner = self.inner.lock();
        inner.frames.flush();
        inner.bytes.flush();
        inner.pixels.flush();
    }
}

impl Default for SharedPools {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SharedPools {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_pool_reuse() {
        let mut pool = FramePool::new();

        let buf1 = pool.obtain(10, 10);
        assert_eq!(pool.total_allocated(), 1);
        assert_eq!(pool.available(), 0);

        pool.release(buf1);
        assert_eq!(pool.available(), 1);

        // Same capacity class: no new allocation.
        let _buf2 = pool.obtain(10, 10);
        assert_eq!(pool.total_allocated(), 1);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_frame_pool_reconfigures_shape() {
        let mut pool = FramePool::new();
        pool.release(PixelBuffer::new(20, 5));

        let buf = pool.obtain(10, 10);
        assert_eq!(pool.total_allocated(), 0);
        assert_eq!(buf.width(), 10);
        assert_eq!(buf.height(), 10);
    }

    #[test]
    fn test_frame_pool_class_mismatch_allocates() {
        let mut pool = FramePool::new();
        pool.release(PixelBuffer::new(10, 10));

        let _buf = pool.obtain(11, 10);
        assert_eq!(pool.total_allocated(), 1);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_scratch_pool() {
        let mut pool: ScratchPool<u8> = ScratchPool::new();
        let v = pool.obtain(128);
        assert_eq!(v.len(), 128);
        pool.release(v);
        let _v2 = pool.obtain(128);
        assert_eq!(pool.total_allocated(), 1);
    }

    #[test]
    fn test_shared_pools_flush() {
        let pools = SharedPools::new();
        let pools2 = pools.clone();

        let buf = pools.obtain_frame(8, 8);
        pools.release_frame(buf);
        assert_eq!(pools2.frames_available(), 1);

        pools2.flush();
        assert_eq!(pools.frames_available(), 0);
    }
}
