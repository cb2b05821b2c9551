//! Heap-backed memory provider.
//!
//! The built-in fallback every broker starts with. Records are plain byte
//! vectors that are reused by size: a record grows when a larger picture is
//! requested and never shrinks.

use std::ptr::NonNull;

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use super::arena::BufferArena;
use super::provider::{BufferId, FrameBuffer, MemoryProvider, PoolStats};
use crate::error::{DecodeError, Result};
use crate::types::{CodecOptions, PixelFormat};

const PROVIDER_NAME: &str = "malloc";

#[derive(Debug, Default)]
struct HeapState {
    arena: BufferArena<Vec<u8>>,
    allocations: u64,
}

/// Memory provider backed by heap allocations.
#[derive(Debug, Default)]
pub struct MallocMemoryProvider {
    state: Mutex<HeapState>,
}

impl MallocMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn allocate(size: usize) -> Option<Vec<u8>> {
    let mut block = Vec::new();
    block.try_reserve_exact(size).ok()?;
    block.resize(size, 0);
    Some(block)
}

impl MemoryProvider for MallocMemoryProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn supports(&self, options: &CodecOptions) -> bool {
        options.accepts(PixelFormat::Yuv420p)
    }

    fn acquire_buffer(&self, size: usize) -> Result<FrameBuffer> {
        let mut state = self.state.lock();
        let index = state.arena.next_free();

        let slot = state.arena.slot_mut(index);
        let grow = slot.backing.is_none() || slot.capacity < size;
        if grow {
            match allocate(size) {
                Some(block) => {
                    slot.backing = Some(block);
                    slot.capacity = size;
                }
                None => {
                    slot.backing = None;
                    slot.capacity = 0;
                    error!(provider = PROVIDER_NAME, size, "Frame buffer allocation failed");
                    return Err(DecodeError::OutOfMemory { requested: size });
                }
            }
        }

        let capacity = slot.capacity;
        let ptr = match slot.backing.as_mut() {
            Some(block) => NonNull::new(block.as_mut_ptr()),
            None => None,
        };
        let Some(ptr) = ptr else {
            return Err(DecodeError::OutOfMemory { requested: size });
        };

        if grow {
            state.allocations += 1;
        }
        let id = state.arena.lease(index);

        trace!(
            provider = PROVIDER_NAME,
            buffer = %id,
            size,
            capacity,
            reused = !grow,
            free = state.arena.free_len(),
            used = state.arena.used_len(),
            "Acquired frame buffer"
        );
        Ok(FrameBuffer::new(id, ptr, capacity, None))
    }

    fn release_buffer(&self, id: BufferId) {
        let mut state = self.state.lock();
        if state.arena.release(id).is_none() {
            warn!(provider = PROVIDER_NAME, buffer = %id, "Release of unknown frame buffer ignored");
            return;
        }
        trace!(
            provider = PROVIDER_NAME,
            buffer = %id,
            free = state.arena.free_len(),
            used = state.arena.used_len(),
            "Released frame buffer"
        );
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

impl Drop for MallocMemoryProvider {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.arena.used_len() > 0 {
            warn!(
                provider = PROVIDER_NAME,
                used = state.arena.used_len(),
                "Dropping provider with frame buffers still leased"
            );
        }
        debug!(
            provider = PROVIDER_NAME,
            bytes = state.arena.bytes_reserved(),
            "Freeing heap frame buffers"
        );
    }
}
