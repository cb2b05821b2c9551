//! # Frame-Buffer Memory
//!
//! Providers lease reusable frame buffers to external decoders; the broker
//! picks the provider a session uses from the negotiated pixel formats.
//!
//! - [`MallocMemoryProvider`]: heap buffers reused by size, the fallback
//! - [`HardwareMemoryProvider`]: GPU-shared buffers with metadata stamping
//!   and cache flush on finalize
//! - [`MemoryBroker`]: most-recently-registered-first provider registry

mod arena;
pub mod broker;
pub mod hardware;
pub mod malloc;
pub mod provider;

pub use broker::MemoryBroker;
pub use hardware::HardwareMemoryProvider;
pub use malloc::MallocMemoryProvider;
pub use provider::{BufferId, FrameBuffer, MemoryProvider, NativeBuffer, PlanePtr, PoolStats};
