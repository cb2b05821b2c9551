//! Workspace façade crate.
//!
//! This crate exposes shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-decode`). Host applications can
//! depend on `decode-workspace` and enable the documented features without
//! wiring each crate individually:
//!
//! - `desktop-shims` (default): desktop bridge defaults and
//!   [`bootstrap_desktop`]
//! - `embedded`: the service without desktop shims; the host injects its own
//!   `ProcessInfo` and `HardwareBufferAllocator`

#[cfg(any(feature = "desktop-shims", feature = "embedded"))]
pub use core_decode as decode;

#[cfg(any(feature = "desktop-shims", feature = "embedded"))]
pub use core_service::{CoreError, DecodeService, Result};

#[cfg(feature = "desktop-shims")]
pub use core_service::bootstrap_desktop;
