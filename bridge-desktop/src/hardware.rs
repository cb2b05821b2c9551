//! Software Hardware-Buffer Implementation
//!
//! Desktop machines do not expose a GPU-shared buffer pool the way embedded
//! video SoCs do. `SoftwareBufferAllocator` stands in for one: buffers are
//! plain heap allocations with a stable address, a monotonically increasing
//! native handle, a metadata header and a counted (no-op) cache flush. This
//! lets the hardware-backed memory provider run unchanged on desktop builds
//! and in tests.

use bridge_traits::{
    error::{BridgeError, Result},
    hardware::{
        BufferMetadata, HardwareBuffer, HardwareBufferAllocator, HardwareBufferPool,
        NativeHandle, PlaneLayout, SharedMemory,
    },
};
use parking_lot::Mutex;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Heap-backed stand-in for a GPU buffer allocator.
#[derive(Debug, Clone, Default)]
pub struct SoftwareBufferAllocator {
    max_buffer_size: Option<usize>,
}

impl SoftwareBufferAllocator {
    /// Create an allocator with no per-buffer size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the size of a single buffer, emulating a fixed-size carve-out.
    ///
    /// Requests above the limit fail the same way an exhausted GPU pool would.
    pub fn with_max_buffer_size(mut self, bytes: usize) -> Self {
        self.max_buffer_size = Some(bytes);
        self
    }
}

impl HardwareBufferAllocator for SoftwareBufferAllocator {
    fn name(&self) -> &str {
        "software"
    }

    fn open_pool(
        &self,
        layout: PlaneLayout,
        width: u32,
        height: u32,
    ) -> Result<Arc<dyn HardwareBufferPool>> {
        if width == 0 || height == 0 {
            return Err(BridgeError::OperationFailed(format!(
                "invalid working resolution {}x{}",
                width, height
            )));
        }

        debug!(?layout, width, height, "Opened software buffer pool");
        let pool: Arc<dyn HardwareBufferPool> = Arc::new(SoftwareBufferPool {
            layout,
            max_buffer_size: self.max_buffer_size,
            next_handle: AtomicU64::new(1),
            live_buffers: Arc::new(AtomicUsize::new(0)),
        });
        Ok(pool)
    }
}

/// Pool handing out [`SoftwareBuffer`]s.
#[derive(Debug)]
pub struct SoftwareBufferPool {
    layout: PlaneLayout,
    max_buffer_size: Option<usize>,
    next_handle: AtomicU64,
    live_buffers: Arc<AtomicUsize>,
}

impl SoftwareBufferPool {
    /// Number of buffers from this pool that are still referenced somewhere.
    pub fn live_buffers(&self) -> usize {
        self.live_buffers.load(Ordering::Acquire)
    }
}

impl HardwareBufferPool for SoftwareBufferPool {
    fn allocate(&self, size: usize) -> Result<Arc<dyn HardwareBuffer>> {
        if let Some(limit) = self.max_buffer_size {
            if size > limit {
                warn!(size, limit, "Software buffer request exceeds pool limit");
                return Err(BridgeError::OperationFailed(format!(
                    "requested {} bytes, pool limit is {}",
                    size, limit
                )));
            }
        }

        let handle = NativeHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let memory = SoftwareMemory::new(size);
        self.live_buffers.fetch_add(1, Ordering::AcqRel);

        debug!(handle = handle.0, size, layout = ?self.layout, "Allocated software buffer");

        let buffer: Arc<dyn HardwareBuffer> = Arc::new(SoftwareBuffer {
            handle,
            memory,
            metadata: Mutex::new(BufferMetadata::default()),
            live_buffers: Arc::clone(&self.live_buffers),
        });
        Ok(buffer)
    }
}

/// A heap buffer posing as GPU-shared memory.
pub struct SoftwareBuffer {
    handle: NativeHandle,
    memory: SoftwareMemory,
    metadata: Mutex<BufferMetadata>,
    live_buffers: Arc<AtomicUsize>,
}

impl SoftwareBuffer {
    /// Number of cache flushes requested on this buffer.
    pub fn flush_count(&self) -> usize {
        self.memory.flushes.load(Ordering::Acquire)
    }
}

impl HardwareBuffer for SoftwareBuffer {
    fn handle(&self) -> NativeHandle {
        self.handle
    }

    fn memory(&self) -> Option<&dyn SharedMemory> {
        Some(&self.memory)
    }

    fn write_metadata(&self, metadata: BufferMetadata) {
        *self.metadata.lock() = metadata;
    }

    fn metadata(&self) -> BufferMetadata {
        *self.metadata.lock()
    }
}

impl Drop for SoftwareBuffer {
    fn drop(&mut self) {
        self.live_buffers.fetch_sub(1, Ordering::AcqRel);
        debug!(handle = self.handle.0, "Freed software buffer");
    }
}

struct SoftwareMemory {
    ptr: NonNull<u8>,
    len: usize,
    flushes: AtomicUsize,
}

impl SoftwareMemory {
    fn new(len: usize) -> Self {
        let boxed: Box<[u8]> = vec![0u8; len].into_boxed_slice();
        let raw = Box::into_raw(boxed) as *mut u8;
        Self {
            // Box::into_raw never returns null, even for zero-length slices.
            ptr: NonNull::new(raw).unwrap_or(NonNull::dangling()),
            len,
            flushes: AtomicUsize::new(0),
        }
    }
}

// SAFETY: the allocation is exclusively owned by this struct and freed only in
// `Drop`. Concurrent writes through `cpu_view` are coordinated by the memory
// provider, which leases a buffer to at most one writer at a time.
unsafe impl Send for SoftwareMemory {}
unsafe impl Sync for SoftwareMemory {}

impl SharedMemory for SoftwareMemory {
    fn cpu_view(&self) -> Option<NonNull<u8>> {
        Some(self.ptr)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl Drop for SoftwareMemory {
    fn drop(&mut self) {
        // SAFETY: `ptr`/`len` come from `Box::into_raw` of a `Box<[u8]>` of
        // exactly `len` bytes and are reconstructed only once.
        unsafe {
            let slice = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
            drop(Box::from_raw(slice));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_pool_rejects_zero_resolution() {
        let allocator = SoftwareBufferAllocator::new();
        assert!(allocator
            .open_pool(PlaneLayout::Yuv420Planar, 0, 128)
            .is_err());
    }

    #[test]
    fn test_allocate_unique_handles() {
        let allocator = SoftwareBufferAllocator::new();
        let pool = allocator
            .open_pool(PlaneLayout::Yuv420Planar, 128, 128)
            .unwrap();

        let a = pool.allocate(64).unwrap();
        let b = pool.allocate(64).unwrap();
        assert_ne!(a.handle(), b.handle());

        let memory = a.memory().unwrap();
        assert_eq!(memory.len(), 64);
        assert!(memory.cpu_view().is_some());
    }

    #[test]
    fn test_allocate_respects_limit() {
        let allocator = SoftwareBufferAllocator::new().with_max_buffer_size(32);
        let pool = allocator
            .open_pool(PlaneLayout::Yuv420Planar, 128, 128)
            .unwrap();

        assert!(pool.allocate(32).is_ok());
        assert!(pool.allocate(33).is_err());
    }

    #[test]
    fn test_metadata_and_flush() {
        let pool = SoftwareBufferPool {
            layout: PlaneLayout::Yuv420Planar,
            max_buffer_size: None,
            next_handle: AtomicU64::new(1),
            live_buffers: Arc::new(AtomicUsize::new(0)),
        };
        let buffer = pool.allocate(16).unwrap();

        let metadata = BufferMetadata {
            width: 4,
            height: 2,
            aligned_width: 8,
            aligned_height: 2,
            pts: Some(1000),
        };
        buffer.write_metadata(metadata);
        assert_eq!(buffer.metadata(), metadata);

        buffer.memory().unwrap().flush().unwrap();
        assert_eq!(pool.live_buffers(), 1);

        drop(buffer);
        assert_eq!(pool.live_buffers(), 0);
    }

    #[test]
    fn test_cpu_view_is_writable() {
        let memory = SoftwareMemory::new(8);
        let ptr = memory.cpu_view().unwrap();
        unsafe {
            ptr.as_ptr().write(0xAB);
            assert_eq!(*ptr.as_ptr(), 0xAB);
        }
        memory.flush().unwrap();
        assert_eq!(memory.flushes.load(Ordering::Acquire), 1);
    }
}
