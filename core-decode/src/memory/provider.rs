//! Memory provider contract and the buffer lease types it hands out.

use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use bridge_traits::hardware::{HardwareBuffer, NativeHandle};
use serde::Serialize;

use crate::error::Result;
use crate::types::{CodecOptions, VideoPicture};

// ============================================================================
// Buffer identity
// ============================================================================

/// Identity of a buffer leased from a provider.
///
/// `slot` addresses a fixed record in the provider's arena; `generation`
/// changes every time the slot is leased again, so an id kept past its release
/// never matches a later lease of the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId {
    slot: u32,
    generation: u32,
}

impl BufferId {
    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Arena slot index.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Lease generation of the slot.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.slot, self.generation)
    }
}

// ============================================================================
// Native buffers
// ============================================================================

/// Shared reference to a hardware buffer travelling with a picture.
///
/// Cloning adds a reference; the buffer stays alive for as long as any
/// renderer-side clone exists, independently of the provider's release.
#[derive(Clone)]
pub struct NativeBuffer(Arc<dyn HardwareBuffer>);

impl NativeBuffer {
    pub(crate) fn new(buffer: Arc<dyn HardwareBuffer>) -> Self {
        Self(buffer)
    }

    /// Native handle understood by the host renderer.
    pub fn handle(&self) -> NativeHandle {
        self.0.handle()
    }

    /// Underlying hardware buffer.
    pub fn buffer(&self) -> &Arc<dyn HardwareBuffer> {
        &self.0
    }
}

impl fmt::Debug for NativeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeBuffer").field(&self.0.handle()).finish()
    }
}

/// Address of one picture plane inside a leased buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanePtr(NonNull<u8>);

impl PlanePtr {
    /// Raw address of the first byte of the plane.
    pub fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr()
    }
}

// SAFETY: a plane pointer is an address, not an owner. Reading through it is
// only sound while the buffer it points into is held, which the lag-of-one
// release order guarantees for the picture it is attached to.
unsafe impl Send for PlanePtr {}
unsafe impl Sync for PlanePtr {}

// ============================================================================
// Frame buffer lease
// ============================================================================

/// A writable block of memory leased from a [`MemoryProvider`].
///
/// The lease does not free anything when dropped. Memory goes back to the
/// provider only through [`MemoryProvider::release_buffer`] with [`FrameBuffer::id`].
pub struct FrameBuffer {
    id: BufferId,
    ptr: NonNull<u8>,
    capacity: usize,
    native: Option<NativeBuffer>,
}

impl FrameBuffer {
    pub(crate) fn new(
        id: BufferId,
        ptr: NonNull<u8>,
        capacity: usize,
        native: Option<NativeBuffer>,
    ) -> Self {
        Self {
            id,
            ptr,
            capacity,
            native,
        }
    }

    /// Identity to hand back to the provider on release.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Usable size in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Base address of the buffer.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Native buffer backing this lease, for hardware-backed providers.
    pub fn native(&self) -> Option<&NativeBuffer> {
        self.native.as_ref()
    }

    /// Mutable view of the whole buffer.
    ///
    /// # Safety
    ///
    /// The lease must not have been released, and no other view of the same
    /// buffer may be alive.
    pub unsafe fn as_mut_slice(&mut self) -> &mut [u8] {
        std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.capacity)
    }

    /// Address of a plane starting `offset` bytes into the buffer.
    pub(crate) fn plane(&self, offset: usize) -> Option<PlanePtr> {
        if offset > self.capacity {
            return None;
        }
        NonNull::new(self.ptr.as_ptr().wrapping_add(offset)).map(PlanePtr)
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .field("native", &self.native)
            .finish()
    }
}

// SAFETY: the lease is a view into memory owned by a provider whose arena
// outlives the session; the provider hands each slot to one holder at a time.
unsafe impl Send for FrameBuffer {}

// ============================================================================
// Provider contract
// ============================================================================

/// Snapshot of a provider's arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Records on the free list
    pub free: usize,
    /// Records currently leased
    pub used: usize,
    /// Fresh backing allocations performed so far
    pub allocations: u64,
    /// Bytes of backing memory held across all records
    pub bytes_reserved: usize,
}

/// A pluggable source of reusable frame buffers for one backing kind.
///
/// Implementations guard their free and used lists with their own lock;
/// every method takes `&self` and may be called from any thread.
pub trait MemoryProvider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Whether this provider can back pictures in any of `options.formats`.
    ///
    /// Pure predicate; returns `false` when nothing matches.
    fn supports(&self, options: &CodecOptions) -> bool;

    /// Lease a buffer of at least `size` bytes.
    ///
    /// The most recently released record is reused first.
    fn acquire_buffer(&self, size: usize) -> Result<FrameBuffer>;

    /// Return a leased buffer to the free list.
    ///
    /// Unknown or already released ids are logged and ignored.
    fn release_buffer(&self, id: BufferId);

    /// Lease a buffer and return only its native handle.
    ///
    /// Providers without native buffers return `None`.
    fn native_handle(&self, _size: usize) -> Option<NativeHandle> {
        None
    }

    /// Release a buffer leased through [`MemoryProvider::native_handle`].
    fn release_native_handle(&self, _handle: NativeHandle) {}

    /// Stamp final picture metadata into the buffer backing `picture`.
    fn finalize(&self, _picture: &mut VideoPicture) {}

    /// Current arena counters.
    fn stats(&self) -> PoolStats;
}
