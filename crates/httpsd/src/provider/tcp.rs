//! [`TcpProvider`]: the bundled provider producing [`TcpSecureServer`]s.

use std::net::SocketAddr;

use common::ServerError;

use super::ServerProvider;
use crate::{
    server::{SecureServer, TcpSecureServer},
    tunables::Tunables,
};

/// Builds TCP-listener-backed servers configured from a [`Tunables`] snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TcpProvider {
    tunables: Tunables,
}

impl TcpProvider {
    pub fn new(tunables: Tunables) -> Self {
        Self { tunables }
    }
}

impl Default for TcpProvider {
    /// Uses the process-wide tunables.
    fn default() -> Self {
        Self::new(*crate::tunables::global())
    }
}

impl ServerProvider for TcpProvider {
    fn name(&self) -> &'static str {
        "tcp"
    }

    fn create_secure_server(
        &self,
        addr: Option<SocketAddr>,
        backlog: i32,
    ) -> Result<Box<dyn SecureServer>, ServerError> {
        let server = match addr {
            Some(addr) => TcpSecureServer::bound(addr, backlog, &self.tunables)?,
            None => TcpSecureServer::new(&self.tunables),
        };
        Ok(Box::new(server))
    }
}

#[cfg(test)]
mod tests {
    use std::{net::TcpListener, sync::Arc};

    use super::*;
    use crate::provider::ProviderRegistry;

    fn registry() -> ProviderRegistry {
        let registry = ProviderRegistry::new();
        registry
            .install(Arc::new(TcpProvider::new(Tunables::default())))
            .unwrap();
        registry
    }

    #[test]
    fn create_without_address_is_unbound() {
        let server = registry().create().unwrap();
        assert!(!server.is_bound());
        assert_eq!(server.backlog(), None);
        assert!(!server.is_tls_ready());
    }

    #[test]
    fn backlog_is_ignored_without_address() {
        let server = registry().create_with(None, 50).unwrap();
        assert!(!server.is_bound());
        assert_eq!(server.backlog(), None);
    }

    #[test]
    fn create_with_address_binds() {
        let server = registry()
            .create_with(Some("127.0.0.1:0".parse().unwrap()), 32)
            .unwrap();
        assert!(server.is_bound());
        assert_eq!(server.backlog(), Some(32));
        assert!(!server.is_tls_ready());
    }

    #[test]
    fn taken_address_yields_bind_failure_and_no_server() {
        let holder = TcpListener::bind("127.0.0.1:0").unwrap();
        let taken = holder.local_addr().unwrap();

        let result = registry().create_with(Some(taken), 0);
        assert!(matches!(result, Err(ServerError::Bind(_))));
    }
}
