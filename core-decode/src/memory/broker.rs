//! Registry selecting a memory provider for a decode session.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::malloc::MallocMemoryProvider;
use super::provider::MemoryProvider;
use crate::types::CodecOptions;

/// Registry of memory providers.
///
/// The heap provider is registered when the broker is created. Providers
/// registered later take precedence, so a specialized provider can override
/// the heap fallback for formats both accept.
///
/// # Example
///
/// ```ignore
/// use core_decode::memory::MemoryBroker;
/// use core_decode::types::{CodecOptions, PixelFormat};
///
/// let broker = MemoryBroker::new();
/// let provider = broker
///     .acquire_memory_provider(&CodecOptions::new([PixelFormat::Yuv420p]))
///     .expect("heap provider is always registered");
/// assert_eq!(provider.name(), "malloc");
/// ```
pub struct MemoryBroker {
    providers: RwLock<Vec<Arc<dyn MemoryProvider>>>,
}

fn same_provider(a: &Arc<dyn MemoryProvider>, b: &Arc<dyn MemoryProvider>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl MemoryBroker {
    /// Create a broker holding the built-in heap provider.
    pub fn new() -> Self {
        let broker = Self {
            providers: RwLock::new(Vec::new()),
        };
        broker.register_provider(Arc::new(MallocMemoryProvider::new()));
        broker
    }

    /// Add a provider. Registering the same provider twice has no effect.
    pub fn register_provider(&self, provider: Arc<dyn MemoryProvider>) {
        let mut providers = self.providers.write();
        if providers.iter().any(|p| same_provider(p, &provider)) {
            debug!(provider = provider.name(), "Provider already registered");
            return;
        }
        info!(provider = provider.name(), "Registered memory provider");
        providers.push(provider);
    }

    /// Remove a provider. Returns `false` if it was not registered.
    ///
    /// Sessions already holding the provider keep it until they close.
    pub fn unregister_provider(&self, provider: &Arc<dyn MemoryProvider>) -> bool {
        let mut providers = self.providers.write();
        match providers.iter().position(|p| same_provider(p, provider)) {
            Some(index) => {
                providers.remove(index);
                info!(provider = provider.name(), "Unregistered memory provider");
                true
            }
            None => false,
        }
    }

    /// Most recently registered provider supporting `options`, if any.
    pub fn acquire_memory_provider(
        &self,
        options: &CodecOptions,
    ) -> Option<Arc<dyn MemoryProvider>> {
        let providers = self.providers.read();
        let found = providers
            .iter()
            .rev()
            .find(|provider| provider.supports(options))
            .cloned();

        match &found {
            Some(provider) => debug!(provider = provider.name(), formats = ?options.formats, "Selected memory provider"),
            None => debug!(formats = ?options.formats, "No memory provider for formats"),
        }
        found
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    /// Returns `true` if no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}
