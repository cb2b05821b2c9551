//! Decode service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (process
//! information, GPU-shared buffer allocation, log forwarding) into the decode
//! core. The service owns the [`MemoryBroker`] that every session acquires its
//! memory provider from; there is no global broker, hosts pass the service
//! around instead. Desktop apps typically enable the `desktop-shims` feature
//! (which depends on `bridge-desktop`) and call [`bootstrap_desktop`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use core_decode::{
    DecoderAdapter, DecoderConfig, ExternalDecoder, HardwareMemoryProvider, MemoryBroker,
    MemoryProvider,
};
use core_runtime::config::CoreConfig;
use core_runtime::logging::LoggingConfig;
use tracing::{info, warn};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct DecodeService {
    config: CoreConfig,
    decoder_config: DecoderConfig,
    broker: Arc<MemoryBroker>,
    hardware: Option<Arc<HardwareMemoryProvider>>,
}

impl DecodeService {
    /// Create a new service from the host configuration.
    ///
    /// The broker starts with the heap provider. A hardware provider is
    /// registered on top of it when hardware decode is enabled in both
    /// configurations; a pool that cannot be opened leaves that provider
    /// registered but degraded.
    pub fn new(config: CoreConfig, decoder_config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        decoder_config
            .validate()
            .map_err(CoreError::InitializationFailed)?;

        let mut decoder_config = decoder_config;
        if config.features.enable_picture_logging {
            decoder_config.log_pictures = true;
        }

        let broker = Arc::new(MemoryBroker::new());
        let hardware_enabled =
            config.features.enable_hardware_decode && decoder_config.enable_hardware_provider;
        let hardware = match config.hardware_allocator.as_ref() {
            Some(allocator) if hardware_enabled => {
                let provider = Arc::new(HardwareMemoryProvider::new(
                    allocator.as_ref(),
                    &decoder_config,
                ));
                if provider.is_degraded() {
                    warn!(
                        allocator = allocator.name(),
                        "Hardware memory provider registered without a buffer pool"
                    );
                }
                broker.register_provider(Arc::clone(&provider) as Arc<dyn MemoryProvider>);
                Some(provider)
            }
            _ => None,
        };

        info!(
            providers = broker.len(),
            hardware = hardware.is_some(),
            log_pictures = decoder_config.log_pictures,
            "Decode service initialized"
        );

        Ok(Self {
            config,
            decoder_config,
            broker,
            hardware,
        })
    }

    /// The broker sessions acquire memory providers from.
    pub fn broker(&self) -> Arc<MemoryBroker> {
        Arc::clone(&self.broker)
    }

    /// Hardware provider registered at startup, if any.
    pub fn hardware_provider(&self) -> Option<&Arc<HardwareMemoryProvider>> {
        self.hardware.as_ref()
    }

    /// Effective decoder configuration handed to new sessions.
    pub fn decoder_config(&self) -> &DecoderConfig {
        &self.decoder_config
    }

    /// Access the host configuration being used by the service.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Register a host-specific memory provider.
    ///
    /// The most recently registered provider that supports a stream's
    /// formats wins, so this overrides the built-in providers.
    pub fn register_provider(&self, provider: Arc<dyn MemoryProvider>) {
        self.broker.register_provider(provider);
    }

    /// Remove a provider previously passed to [`register_provider`](Self::register_provider).
    pub fn unregister_provider(&self, provider: &Arc<dyn MemoryProvider>) -> bool {
        self.broker.unregister_provider(provider)
    }

    /// Create a closed decode session around `decoder`.
    pub fn open_session(&self, decoder: Box<dyn ExternalDecoder>) -> DecoderAdapter {
        DecoderAdapter::new(
            decoder,
            Arc::clone(&self.broker),
            Arc::clone(&self.config.process_info),
            self.decoder_config.clone(),
        )
    }

    /// Logging configuration forwarding events to the host's sink, if one
    /// was provided.
    pub fn logging_config(&self) -> LoggingConfig {
        match &self.config.logger_sink {
            Some(sink) => LoggingConfig::default().with_logger_sink(Arc::clone(sink)),
            None => LoggingConfig::default(),
        }
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Uses the desktop process information shim and, when hardware decode is
/// requested, the software buffer allocator.
///
/// ```
/// # #[cfg(feature = "desktop-shims")]
/// # fn example() -> core_service::Result<()> {
/// use core_decode::DecoderConfig;
/// use core_service::bootstrap_desktop;
///
/// let service = bootstrap_desktop(DecoderConfig::software_only())?;
/// assert_eq!(service.broker().len(), 1);
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(decoder_config: DecoderConfig) -> Result<DecodeService> {
    let config = CoreConfig::builder()
        .enable_hardware_decode(decoder_config.enable_hardware_provider)
        .enable_picture_logging(decoder_config.log_pictures)
        .build()?;
    DecodeService::new(config, decoder_config)
}
