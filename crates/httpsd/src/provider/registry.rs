//! [`ProviderRegistry`]: the single-slot holder for the active provider.

use std::{
    fmt,
    net::SocketAddr,
    sync::{Arc, OnceLock},
};

use common::ServerError;

use super::ServerProvider;
use crate::server::SecureServer;

/// Holds at most one [`ServerProvider`] for the lifetime of the registry.
#[derive(Default)]
pub struct ProviderRegistry {
    slot: OnceLock<Arc<dyn ServerProvider>>,
}

impl ProviderRegistry {
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Make `provider` the active provider.
    ///
    /// # Errors
    ///
    /// [`ServerError::ProviderAlreadyInstalled`] if a provider is already
    /// active; the existing one stays in place.
    pub fn install(&self, provider: Arc<dyn ServerProvider>) -> Result<(), ServerError> {
        self.slot
            .set(provider)
            .map_err(|_| ServerError::ProviderAlreadyInstalled)
    }

    /// The active provider.
    ///
    /// # Errors
    ///
    /// [`ServerError::ProviderAbsent`] if none has been installed.
    pub fn provider(&self) -> Result<Arc<dyn ServerProvider>, ServerError> {
        self.slot.get().cloned().ok_or(ServerError::ProviderAbsent)
    }

    pub fn is_installed(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Create an unbound server. Equivalent to `create_with(None, 0)`.
    pub fn create(&self) -> Result<Box<dyn SecureServer>, ServerError> {
        self.create_with(None, 0)
    }

    /// Ask the active provider for a server, passing `addr` and `backlog`
    /// through unchanged.
    pub fn create_with(
        &self,
        addr: Option<SocketAddr>,
        backlog: i32,
    ) -> Result<Box<dyn SecureServer>, ServerError> {
        self.provider()?.create_secure_server(addr, backlog)
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("provider", &self.slot.get().map(|p| p.name()))
            .finish()
    }
}
