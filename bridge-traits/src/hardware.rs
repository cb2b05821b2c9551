//! Hardware buffer abstractions.
//!
//! A hardware-backed memory provider does not own CPU heap memory. Instead it
//! asks the host for buffers that live in memory shared with a GPU or a
//! hardware video renderer. Each buffer is made of three layers, any of which
//! may be missing on a misbehaving driver:
//!
//! ```text
//! HardwareBufferPool ──allocate──▶ HardwareBuffer (native handle, metadata)
//!                                        │
//!                                        └─▶ SharedMemory (cache flush)
//!                                                 │
//!                                                 └─▶ CPU-visible view (pointer)
//! ```
//!
//! Buffers are reference counted through `Arc`: the memory provider holds one
//! reference while a decoder is writing into the buffer, and a renderer may
//! hold further references after the provider has logically released it
//! (for example while the buffer is queued for display).

use std::ptr::NonNull;
use std::sync::Arc;

use crate::error::Result;

/// Opaque identifier of a native buffer, as understood by the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

/// Plane layout a hardware pool is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneLayout {
    /// Three-plane 4:2:0 YUV (Y, U, V).
    Yuv420Planar,
}

/// Picture geometry and timing written into a native buffer before it is
/// handed to a consumer outside the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferMetadata {
    /// Visible width in pixels
    pub width: u32,
    /// Visible height in pixels
    pub height: u32,
    /// Line stride of the luma plane in bytes
    pub aligned_width: u32,
    /// Allocated height in lines
    pub aligned_height: u32,
    /// Presentation timestamp, `None` when unknown
    pub pts: Option<i64>,
}

/// CPU-accessible window onto GPU-shared memory.
pub trait SharedMemory: Send + Sync {
    /// CPU-visible address of the memory, `None` when the memory is not mapped.
    fn cpu_view(&self) -> Option<NonNull<u8>>;

    /// Size of the mapping in bytes.
    fn len(&self) -> usize;

    /// Returns `true` if the mapping is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write back CPU caches so a non-CPU consumer observes written pixels.
    fn flush(&self) -> Result<()>;
}

/// A single buffer obtained from a [`HardwareBufferPool`].
pub trait HardwareBuffer: Send + Sync {
    /// Native handle identifying this buffer to the renderer.
    fn handle(&self) -> NativeHandle;

    /// Backing memory, `None` if the driver did not attach any.
    fn memory(&self) -> Option<&dyn SharedMemory>;

    /// Stamp final geometry and timestamp into the native buffer header.
    fn write_metadata(&self, metadata: BufferMetadata);

    /// Metadata most recently stamped into the buffer.
    fn metadata(&self) -> BufferMetadata;
}

/// Pool of hardware buffers bound to one plane layout and working resolution.
///
/// Implementations do not need to be reentrant; callers serialize access.
pub trait HardwareBufferPool: Send + Sync {
    /// Allocate a buffer able to hold at least `size` bytes of picture data.
    fn allocate(&self, size: usize) -> Result<Arc<dyn HardwareBuffer>>;
}

/// Host capability that creates hardware buffer pools.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::hardware::{HardwareBufferAllocator, PlaneLayout};
///
/// fn open(allocator: &dyn HardwareBufferAllocator) {
///     match allocator.open_pool(PlaneLayout::Yuv420Planar, 128, 128) {
///         Ok(pool) => { /* hand pool to a provider */ }
///         Err(err) => eprintln!("hardware pool unavailable: {}", err),
///     }
/// }
/// ```
pub trait HardwareBufferAllocator: Send + Sync {
    /// Human-readable allocator name used in logs.
    fn name(&self) -> &str;

    /// Open a pool bound to `layout` at a fixed working resolution.
    fn open_pool(
        &self,
        layout: PlaneLayout,
        width: u32,
        height: u32,
    ) -> Result<Arc<dyn HardwareBufferPool>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_handle_ordering() {
        let a = NativeHandle(1);
        let b = NativeHandle(2);
        assert!(a < b);
        assert_eq!(a, NativeHandle(1));
    }

    #[test]
    fn test_buffer_metadata_default() {
        let metadata = BufferMetadata::default();
        assert_eq!(metadata.width, 0);
        assert_eq!(metadata.pts, None);
    }
}
