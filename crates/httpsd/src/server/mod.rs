//! The secure-server capability and its bundled TCP implementation.
//!
//! # Lifecycle
//!
//! 1. A provider creates the server unbound (or bound, when an address was
//!    supplied) and without TLS configuration.
//! 2. [`SecureServer::bind`] attaches a listening socket if none was attached
//!    at creation.
//! 3. [`SecureServer::set_tls_configuration`] makes the server TLS-ready. The
//!    last configuration set wins.
//!
//! Accepting connections and speaking HTTP belong to the engine that consumes
//! the server, not to this crate.

pub mod tcp;
pub mod tls;

use std::{fmt, net::SocketAddr};

use common::ServerError;

pub use tcp::TcpSecureServer;
pub use tls::TlsConfiguration;

/// A bindable, TLS-capable HTTP server.
pub trait SecureServer: Send + Sync + fmt::Debug {
    /// Bind to `addr` with the given accept backlog (`<= 0` for the system
    /// default).
    ///
    /// # Errors
    ///
    /// [`ServerError::Bind`] if the address cannot be bound or the server is
    /// already bound; [`ServerError::Io`] for other socket failures.
    fn bind(&self, addr: SocketAddr, backlog: i32) -> Result<(), ServerError>;

    /// The bound local address, or `None` while unbound.
    fn local_addr(&self) -> Option<SocketAddr>;

    /// The requested accept backlog, or `None` when unbound or using the
    /// system default.
    fn backlog(&self) -> Option<u32>;

    /// Replace the TLS configuration.
    ///
    /// # Errors
    ///
    /// [`ServerError::InvalidArgument`] if `config` is `None`; the previous
    /// configuration is left in place.
    fn set_tls_configuration(&self, config: Option<TlsConfiguration>) -> Result<(), ServerError>;

    /// The last configuration set, or `None` before any was set.
    fn tls_configuration(&self) -> Option<TlsConfiguration>;

    fn is_bound(&self) -> bool {
        self.local_addr().is_some()
    }

    fn is_tls_ready(&self) -> bool {
        self.tls_configuration().is_some()
    }
}

/// Unwrap a TLS configuration argument, rejecting `None`.
pub fn require_tls(config: Option<TlsConfiguration>) -> Result<TlsConfiguration, ServerError> {
    config.ok_or_else(|| ServerError::InvalidArgument("tls configuration must be present".into()))
}

/// Map a caller-supplied backlog to its stored form: `None` for the system
/// default.
pub fn requested_backlog(backlog: i32) -> Option<u32> {
    u32::try_from(backlog).ok().filter(|&b| b > 0)
}
