//! # Core Configuration Module
//!
//! Provides configuration management for the video decode core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host bridges and feature flags the decode core
//! needs. It enforces fail-fast validation so that a missing capability is
//! reported at startup rather than when the first stream is opened.
//!
//! ## Required Dependencies
//!
//! - `ProcessInfo` - Receives decoder name and video dimension changes
//!
//! ## Optional Dependencies
//!
//! - `HardwareBufferAllocator` - GPU-shared buffer pools (required when
//!   hardware decode is enabled)
//! - `LoggerSink` - Mirrors core logs into the host logging pipeline
//!
//! When the `desktop-shims` feature is enabled, `DesktopProcessInfo` and, if
//! hardware decode is enabled, `SoftwareBufferAllocator` are injected
//! automatically when not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .process_info(Arc::new(MyOverlay))
//!     .hardware_allocator(Arc::new(MyGpuAllocator))
//!     .enable_hardware_decode(true)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HardwareBufferAllocator, LoggerSink, ProcessInfo};
use std::sync::Arc;

/// Core configuration for the video decode core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Decoder name and dimension collaborator (required)
    pub process_info: Arc<dyn ProcessInfo>,

    /// GPU-shared buffer allocator (optional)
    pub hardware_allocator: Option<Arc<dyn HardwareBufferAllocator>>,

    /// Host log sink (optional)
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    /// Feature flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("process_info", &"ProcessInfo { ... }")
            .field(
                "hardware_allocator",
                &self.hardware_allocator.as_ref().map(|a| a.name().to_string()),
            )
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Register a hardware memory provider (requires HardwareBufferAllocator)
    pub enable_hardware_decode: bool,

    /// Log every retrieved picture at debug level
    pub enable_picture_logging: bool,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// Feature flags must be consistent with the bridges provided.
    pub fn validate(&self) -> Result<()> {
        if self.features.enable_hardware_decode && self.hardware_allocator.is_none() {
            return Err(Error::Config(
                "Hardware decode enabled but no HardwareBufferAllocator provided. \
                 Disable the feature or inject a HardwareBufferAllocator implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_process_info() -> Result<Arc<dyn ProcessInfo>> {
    use bridge_desktop::DesktopProcessInfo;

    let info: Arc<dyn ProcessInfo> = Arc::new(DesktopProcessInfo::new());
    Ok(info)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_process_info() -> Result<Arc<dyn ProcessInfo>> {
    Err(Error::CapabilityMissing {
        capability: "ProcessInfo".to_string(),
        message: "ProcessInfo implementation is required to report decoder name and video dimensions. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default DesktopProcessInfo. \
                 Embedded: inject the player's process information overlay."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_hardware_allocator() -> Option<Arc<dyn HardwareBufferAllocator>> {
    use bridge_desktop::SoftwareBufferAllocator;

    let allocator: Arc<dyn HardwareBufferAllocator> = Arc::new(SoftwareBufferAllocator::new());
    Some(allocator)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_hardware_allocator() -> Option<Arc<dyn HardwareBufferAllocator>> {
    None
}

/// Builder for constructing a [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    process_info: Option<Arc<dyn ProcessInfo>>,
    hardware_allocator: Option<Arc<dyn HardwareBufferAllocator>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the process information collaborator (required).
    ///
    /// With the `desktop-shims` feature, `DesktopProcessInfo` is used if not provided.
    pub fn process_info(mut self, info: Arc<dyn ProcessInfo>) -> Self {
        self.process_info = Some(info);
        self
    }

    /// Sets the hardware buffer allocator.
    pub fn hardware_allocator(mut self, allocator: Arc<dyn HardwareBufferAllocator>) -> Self {
        self.hardware_allocator = Some(allocator);
        self
    }

    /// Sets the logger sink for host integration.
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Enables or disables the hardware memory provider.
    ///
    /// Requires a `HardwareBufferAllocator`.
    ///
    /// Default: false
    pub fn enable_hardware_decode(mut self, enabled: bool) -> Self {
        self.features.enable_hardware_decode = enabled;
        self
    }

    /// Enables or disables per-picture logging.
    ///
    /// Default: false
    pub fn enable_picture_logging(mut self, enabled: bool) -> Self {
        self.features.enable_picture_logging = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - `ProcessInfo` is missing and no desktop default is available
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let process_info = match self.process_info {
            Some(info) => info,
            None => provide_default_process_info()?,
        };

        let hardware_allocator = match self.hardware_allocator {
            Some(allocator) => Some(allocator),
            None if self.features.enable_hardware_decode => provide_default_hardware_allocator(),
            None => None,
        };

        let config = CoreConfig {
            process_info,
            hardware_allocator,
            logger_sink: self.logger_sink,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
