//! Secure-server factory: callers obtain a [`SecureServer`] from the installed
//! [`ServerProvider`] without knowing how it is constructed.
//!
//! Exactly one provider is active per [`ProviderRegistry`]. The process-wide
//! registry is reached through [`install`], [`create`] and [`create_with`];
//! embedders and tests can hold their own registry instead.
//!
//! The factory performs no I/O of its own and keeps no per-call state. Any
//! failure from the provider is returned unchanged.

pub mod registry;
pub mod tcp;

use std::{net::SocketAddr, sync::Arc};

use common::ServerError;

use crate::server::SecureServer;

pub use registry::ProviderRegistry;
pub use tcp::TcpProvider;

/// A pluggable engine that constructs [`SecureServer`] instances.
#[cfg_attr(test, mockall::automock)]
pub trait ServerProvider: Send + Sync {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &'static str;

    /// Construct a server, bound to `addr` when one is given.
    ///
    /// `backlog <= 0` selects the system default accept queue length.
    fn create_secure_server(
        &self,
        addr: Option<SocketAddr>,
        backlog: i32,
    ) -> Result<Box<dyn SecureServer>, ServerError>;
}

static GLOBAL: ProviderRegistry = ProviderRegistry::new();

/// The process-wide registry.
pub fn registry() -> &'static ProviderRegistry {
    &GLOBAL
}

/// Install the process-wide provider.
///
/// # Errors
///
/// [`ServerError::ProviderAlreadyInstalled`] if one is already active.
pub fn install(provider: Arc<dyn ServerProvider>) -> Result<(), ServerError> {
    GLOBAL.install(provider)
}

/// Create an unbound server from the process-wide provider.
///
/// Equivalent to `create_with(None, 0)`.
pub fn create() -> Result<Box<dyn SecureServer>, ServerError> {
    GLOBAL.create()
}

/// Create a server from the process-wide provider, bound to `addr` when given.
///
/// # Errors
///
/// [`ServerError::ProviderAbsent`] if no provider is installed, otherwise
/// whatever the provider reports ([`ServerError::Bind`], [`ServerError::Io`]).
pub fn create_with(
    addr: Option<SocketAddr>,
    backlog: i32,
) -> Result<Box<dyn SecureServer>, ServerError> {
    GLOBAL.create_with(addr, backlog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tunables::Tunables;

    // The only test that touches the process-wide registry.
    #[test]
    fn process_wide_registry_lifecycle() {
        assert!(matches!(create(), Err(ServerError::ProviderAbsent)));

        install(Arc::new(TcpProvider::new(Tunables::default()))).unwrap();
        assert_eq!(registry().provider().unwrap().name(), "tcp");

        let server = create().unwrap();
        assert!(!server.is_bound());

        let bound = create_with(Some("127.0.0.1:0".parse().unwrap()), 4).unwrap();
        assert!(bound.is_bound());
        assert_eq!(bound.backlog(), Some(4));

        let again = install(Arc::new(TcpProvider::new(Tunables::default())));
        assert!(matches!(again, Err(ServerError::ProviderAlreadyInstalled)));
    }
}
