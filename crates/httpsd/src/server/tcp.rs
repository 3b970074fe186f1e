//! [`TcpSecureServer`]: the bundled [`SecureServer`] backed by a TCP listener.

use std::{
    io,
    net::{SocketAddr, TcpListener, TcpStream},
    sync::OnceLock,
};

use arc_swap::ArcSwapOption;
use common::ServerError;
use rustls::ServerConfig;
use socket2::{Domain, Protocol, Socket, Type};
use tokio_rustls::TlsAcceptor;
use tracing::debug;

use super::{require_tls, requested_backlog, SecureServer, TlsConfiguration};
use crate::tunables::Tunables;

/// Accept queue length used when the caller asks for the system default.
pub const DEFAULT_BACKLOG: i32 = 128;

#[derive(Debug)]
struct Bound {
    listener: TcpListener,
    local_addr: SocketAddr,
    backlog: Option<u32>,
}

/// A TCP-listener-backed secure server.
///
/// The listening socket is attached at most once. The TLS configuration slot
/// is lock-free for readers and can be replaced at any time.
#[derive(Debug)]
pub struct TcpSecureServer {
    bound: OnceLock<Bound>,
    tls: ArcSwapOption<ServerConfig>,
    no_delay: bool,
}

impl TcpSecureServer {
    /// Create an unbound server.
    pub fn new(tunables: &Tunables) -> Self {
        Self {
            bound: OnceLock::new(),
            tls: ArcSwapOption::empty(),
            no_delay: tunables.tcp_no_delay(),
        }
    }

    /// Create a server already bound to `addr`.
    ///
    /// # Errors
    ///
    /// See [`SecureServer::bind`]. On failure the socket is closed and no
    /// server exists.
    pub fn bound(addr: SocketAddr, backlog: i32, tunables: &Tunables) -> Result<Self, ServerError> {
        let server = Self::new(tunables);
        server.bind(addr, backlog)?;
        Ok(server)
    }

    /// A TLS acceptor for the current configuration, or `None` until one is set.
    pub fn tls_acceptor(&self) -> Option<TlsAcceptor> {
        self.tls.load_full().map(TlsAcceptor::from)
    }

    /// Duplicate the listening socket for hand-off to an engine.
    ///
    /// # Errors
    ///
    /// [`ServerError::Io`] if the server is unbound or the descriptor cannot be
    /// duplicated.
    pub fn try_clone_listener(&self) -> Result<TcpListener, ServerError> {
        let bound = self
            .bound
            .get()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "server is not bound"))?;
        Ok(bound.listener.try_clone()?)
    }

    /// Apply per-connection socket options to an accepted stream.
    pub fn configure_stream(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_nodelay(self.no_delay)
    }
}

impl SecureServer for TcpSecureServer {
    fn bind(&self, addr: SocketAddr, backlog: i32) -> Result<(), ServerError> {
        if let Some(existing) = self.bound.get() {
            return Err(ServerError::Bind(format!(
                "server is already bound to {}",
                existing.local_addr
            )));
        }

        let listener = listen(addr, backlog)?;
        let local_addr = listener.local_addr()?;
        let bound = Bound {
            listener,
            local_addr,
            backlog: requested_backlog(backlog),
        };

        // A concurrent bind may have won the race; the losing socket is dropped.
        self.bound.set(bound).map_err(|lost| {
            ServerError::Bind(format!(
                "server is already bound; discarded {}",
                lost.local_addr
            ))
        })?;

        debug!(%local_addr, backlog, "secure server bound");
        Ok(())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.bound.get().map(|b| b.local_addr)
    }

    fn backlog(&self) -> Option<u32> {
        self.bound.get().and_then(|b| b.backlog)
    }

    fn set_tls_configuration(&self, config: Option<TlsConfiguration>) -> Result<(), ServerError> {
        let config = require_tls(config)?;
        self.tls.store(Some(config.server_config().clone()));
        Ok(())
    }

    fn tls_configuration(&self) -> Option<TlsConfiguration> {
        self.tls.load_full().map(TlsConfiguration::new)
    }
}

/// Open a listening socket on `addr`.
fn listen(addr: SocketAddr, backlog: i32) -> Result<TcpListener, ServerError> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    #[cfg(unix)]
    socket.set_reuse_address(true)?;

    socket
        .bind(&addr.into())
        .map_err(|e| ServerError::from_bind(addr, e))?;

    let queue = if backlog > 0 { backlog } else { DEFAULT_BACKLOG };
    socket
        .listen(queue)
        .map_err(|e| ServerError::from_bind(addr, e))?;

    Ok(socket.into())
}
