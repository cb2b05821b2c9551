//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides ready-to-use implementations of the bridge traits the
//! decode core needs:
//! - `HardwareBufferAllocator` using heap memory with stable addresses
//!   (`SoftwareBufferAllocator`), for machines without a GPU-shared pool
//! - `ProcessInfo` recording decoder name and dimensions (`DesktopProcessInfo`)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopProcessInfo, SoftwareBufferAllocator};
//! use std::sync::Arc;
//!
//! let process_info = Arc::new(DesktopProcessInfo::new());
//! let allocator = Arc::new(SoftwareBufferAllocator::new());
//! // Use in core configuration
//! ```

mod hardware;
mod process;

pub use hardware::{SoftwareBuffer, SoftwareBufferAllocator, SoftwareBufferPool};
pub use process::DesktopProcessInfo;
