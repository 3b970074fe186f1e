//! Common error types shared across crates.

use std::{io, net::SocketAddr};

use thiserror::Error;

/// Errors surfaced by the secure-server factory and the servers it produces.
///
/// Every variant is returned synchronously to the direct caller; nothing in
/// the bootstrap layer retries or logs on the caller's behalf.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The requested address is already in use, unusable, or the server is
    /// already bound.
    #[error("bind failed: {0}")]
    Bind(String),

    /// Any other transport-level failure while building or binding a server.
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    /// A caller passed an argument the operation cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `create` was called before any server provider was installed.
    #[error("no secure server provider is installed")]
    ProviderAbsent,

    /// A provider was already installed for this registry.
    #[error("a secure server provider is already installed")]
    ProviderAlreadyInstalled,
}

impl ServerError {
    /// Classify an I/O error raised while binding `addr`.
    ///
    /// Address-level failures become [`ServerError::Bind`]; everything else
    /// stays an [`ServerError::Io`].
    pub fn from_bind(addr: SocketAddr, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::AddrInUse
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::PermissionDenied => ServerError::Bind(format!("{addr}: {err}")),
            _ => ServerError::Io(err),
        }
    }

    /// Returns `true` for provider-registration failures.
    ///
    /// These are fatal to the call that hit them but not to the process.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            ServerError::ProviderAbsent | ServerError::ProviderAlreadyInstalled
        )
    }
}
