//! Hardware-backed memory provider.
//!
//! Buffers come from a [`HardwareBufferPool`] opened on the host's
//! [`HardwareBufferAllocator`]. Each record keeps the native buffer alive while
//! it is leased; releasing a record drops the provider's reference, while the
//! renderer may keep its own clone (for example while the buffer is queued for
//! display).
//!
//! Pictures in these buffers must go through [`MemoryProvider::finalize`]
//! before leaving the decoder: it stamps geometry and timing into the native
//! buffer and flushes CPU caches so a GPU consumer reads the written pixels.

use std::sync::Arc;

use bridge_traits::hardware::{
    BufferMetadata, HardwareBuffer, HardwareBufferAllocator, HardwareBufferPool, NativeHandle,
    PlaneLayout,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, trace, warn};

use super::arena::BufferArena;
use super::provider::{BufferId, FrameBuffer, MemoryProvider, NativeBuffer, PoolStats};
use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};
use crate::types::{CodecOptions, PixelFormat, VideoPicture};

const PROVIDER_NAME: &str = "hardware";

#[derive(Default)]
struct PoolState {
    arena: BufferArena<Arc<dyn HardwareBuffer>>,
    allocations: u64,
}

/// Memory provider leasing GPU-shared buffers.
pub struct HardwareMemoryProvider {
    allocator: String,
    pool: Option<Arc<dyn HardwareBufferPool>>,
    state: Mutex<PoolState>,
}

impl HardwareMemoryProvider {
    /// Bind to `allocator` at the configured working resolution.
    ///
    /// Never fails: if the pool cannot be opened the provider is created
    /// degraded, still registers and answers `supports`, but every
    /// acquisition fails so the broker's next session falls back elsewhere.
    pub fn new(allocator: &dyn HardwareBufferAllocator, config: &DecoderConfig) -> Self {
        let width = config.hardware_working_width;
        let height = config.hardware_working_height;

        let pool = match allocator.open_pool(PlaneLayout::Yuv420Planar, width, height) {
            Ok(pool) => {
                info!(
                    provider = PROVIDER_NAME,
                    allocator = allocator.name(),
                    width,
                    height,
                    "Hardware buffer pool opened"
                );
                Some(pool)
            }
            Err(e) => {
                error!(
                    provider = PROVIDER_NAME,
                    allocator = allocator.name(),
                    error = %e,
                    "Unable to open hardware buffer pool, provider degraded"
                );
                None
            }
        };

        Self {
            allocator: allocator.name().to_string(),
            pool,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Whether the pool failed to open.
    pub fn is_degraded(&self) -> bool {
        self.pool.is_none()
    }
}

impl MemoryProvider for HardwareMemoryProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn supports(&self, options: &CodecOptions) -> bool {
        options.accepts(PixelFormat::GpuShared)
    }

    fn acquire_buffer(&self, size: usize) -> Result<FrameBuffer> {
        let Some(pool) = self.pool.as_ref() else {
            return Err(DecodeError::ProviderDegraded(format!(
                "no buffer pool on allocator {}",
                self.allocator
            )));
        };

        // The pool is not reentrant; allocate under the provider lock.
        let mut state = self.state.lock();

        let buffer = pool.allocate(size).map_err(|e| {
            error!(provider = PROVIDER_NAME, size, error = %e, "Hardware buffer allocation failed");
            DecodeError::HardwareAllocation(e.to_string())
        })?;

        let Some(memory) = buffer.memory() else {
            error!(provider = PROVIDER_NAME, handle = buffer.handle().0, "Hardware buffer has no memory");
            return Err(DecodeError::HardwareAllocation(
                "buffer has no shared memory".to_string(),
            ));
        };
        let Some(ptr) = memory.cpu_view() else {
            error!(provider = PROVIDER_NAME, handle = buffer.handle().0, "Hardware buffer is not CPU mapped");
            return Err(DecodeError::HardwareAllocation(
                "shared memory has no CPU view".to_string(),
            ));
        };
        let capacity = memory.len();
        if capacity < size {
            error!(
                provider = PROVIDER_NAME,
                handle = buffer.handle().0,
                size,
                capacity,
                "Hardware buffer smaller than requested"
            );
            return Err(DecodeError::HardwareAllocation(format!(
                "buffer smaller than requested ({} < {} bytes)",
                capacity, size
            )));
        }

        let index = state.arena.next_free();
        let slot = state.arena.slot_mut(index);
        slot.backing = Some(Arc::clone(&buffer));
        slot.capacity = capacity;
        state.allocations += 1;
        let id = state.arena.lease(index);

        trace!(
            provider = PROVIDER_NAME,
            buffer = %id,
            handle = buffer.handle().0,
            size,
            free = state.arena.free_len(),
            used = state.arena.used_len(),
            "Acquired hardware frame buffer"
        );
        Ok(FrameBuffer::new(
            id,
            ptr,
            capacity,
            Some(NativeBuffer::new(buffer)),
        ))
    }

    fn release_buffer(&self, id: BufferId) {
        let mut state = self.state.lock();
        let Some(slot) = state.arena.release(id) else {
            warn!(provider = PROVIDER_NAME, buffer = %id, "Release of unknown frame buffer ignored");
            return;
        };
        let handle = slot.backing.take().map(|buffer| buffer.handle().0);
        slot.capacity = 0;

        trace!(
            provider = PROVIDER_NAME,
            buffer = %id,
            handle,
            free = state.arena.free_len(),
            used = state.arena.used_len(),
            "Released hardware frame buffer"
        );
    }

    fn native_handle(&self, size: usize) -> Option<NativeHandle> {
        match self.acquire_buffer(size) {
            Ok(buffer) => buffer.native().map(NativeBuffer::handle),
            Err(e) => {
                debug!(provider = PROVIDER_NAME, size, error = %e, "No native handle available");
                None
            }
        }
    }

    fn release_native_handle(&self, handle: NativeHandle) {
        let id = self
            .state
            .lock()
            .arena
            .find_leased(|buffer| buffer.handle() == handle);
        match id {
            Some(id) => self.release_buffer(id),
            None => warn!(provider = PROVIDER_NAME, handle = handle.0, "Release of unknown native handle ignored"),
        }
    }

    fn finalize(&self, picture: &mut VideoPicture) {
        let Some(id) = picture.buffer else {
            error!(provider = PROVIDER_NAME, "Unable to finalize picture without a buffer");
            return;
        };

        let buffer = {
            let state = self.state.lock();
            match state.arena.leased(id).and_then(|slot| slot.backing.clone()) {
                Some(buffer) => buffer,
                None => {
                    error!(provider = PROVIDER_NAME, buffer = %id, "Unable to finalize unknown frame buffer");
                    return;
                }
            }
        };

        buffer.write_metadata(BufferMetadata {
            width: picture.width,
            height: picture.height,
            aligned_width: picture.strides[0] as u32,
            aligned_height: picture.height,
            pts: picture.pts,
        });
        if let Some(memory) = buffer.memory() {
            if let Err(e) = memory.flush() {
                warn!(provider = PROVIDER_NAME, buffer = %id, error = %e, "Cache flush failed");
            }
        }

        picture.format = PixelFormat::GpuShared;
        picture.native = Some(NativeBuffer::new(buffer));
    }

    fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            free: state.arena.free_len(),
            used: state.arena.used_len(),
            allocations: state.allocations,
            bytes_reserved: state.arena.bytes_reserved(),
        }
    }
}

impl Drop for HardwareMemoryProvider {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        debug!(
            provider = PROVIDER_NAME,
            free = state.arena.free_len(),
            used = state.arena.used_len(),
            "Releasing hardware frame buffers"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;

    struct NoPoolAllocator;

    impl HardwareBufferAllocator for NoPoolAllocator {
        fn name(&self) -> &str {
            "absent"
        }

        fn open_pool(
            &self,
            _layout: PlaneLayout,
            _width: u32,
            _height: u32,
        ) -> bridge_traits::error::Result<Arc<dyn HardwareBufferPool>> {
            Err(BridgeError::NotAvailable("no GPU".to_string()))
        }
    }

    #[test]
    fn test_degraded_provider_fails_every_acquire() {
        let provider = HardwareMemoryProvider::new(&NoPoolAllocator, &DecoderConfig::default());
        assert!(provider.is_degraded());
        assert!(provider.supports(&CodecOptions::new([PixelFormat::GpuShared])));

        let err = provider.acquire_buffer(64).unwrap_err();
        assert!(matches!(err, DecodeError::ProviderDegraded(_)));
        assert_eq!(provider.stats(), PoolStats::default());
        assert_eq!(provider.native_handle(64), None);
    }

    #[test]
    fn test_supports_only_gpu_format() {
        let provider = HardwareMemoryProvider::new(&NoPoolAllocator, &DecoderConfig::default());
        assert!(!provider.supports(&CodecOptions::new([PixelFormat::Yuv420p])));
    }
}
