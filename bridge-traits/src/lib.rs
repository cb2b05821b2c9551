//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the decode core and the host
//! application embedding it. Each trait represents a capability the core
//! needs but cannot provide itself, because it depends on the host's
//! renderer, GPU driver stack or logging pipeline.
//!
//! ## Traits
//!
//! ### Video Pipeline
//! - [`ProcessInfo`](process::ProcessInfo) - Receives decoder name and dimension changes
//!   for the player's information overlay and renderer reconfiguration
//! - [`HardwareBufferAllocator`](hardware::HardwareBufferAllocator) - Opens pools of
//!   GPU-shared buffers that a hardware-backed memory provider hands to decoders
//!
//! ### Utilities
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Hardware Buffers |
//! |----------|---------------------|------------------|
//! | Desktop  | `bridge-desktop`    | Software stand-in |
//! | Embedded (GPU-shared memory) | host supplied | Native pool |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing (see `core_runtime::config::CoreConfigBuilder::build`).
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert driver errors into `BridgeError` and include
//! enough context (pool size, requested bytes) to diagnose allocation failures.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`: providers are registered from the
//! host's main thread while decoding runs on the player thread. The core
//! still serializes calls into a single hardware pool, because native
//! allocators are typically not thread-safe.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::process::ProcessInfo;
//!
//! struct OverlayInfo;
//!
//! impl ProcessInfo for OverlayInfo {
//!     fn set_video_dimensions(&self, width: u32, height: u32) {
//!         println!("video is now {}x{}", width, height);
//!     }
//!
//!     fn set_video_decoder_name(&self, name: &str, is_hardware: bool) {
//!         println!("decoder: {} (hw: {})", name, is_hardware);
//!     }
//! }
//! ```

pub mod error;
pub mod hardware;
pub mod process;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use hardware::{
    BufferMetadata, HardwareBuffer, HardwareBufferAllocator, HardwareBufferPool, NativeHandle,
    PlaneLayout, SharedMemory,
};
pub use process::ProcessInfo;
pub use time::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
