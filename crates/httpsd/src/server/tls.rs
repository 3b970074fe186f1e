//! TLS configuration handle attached to a secure server.
//!
//! A [`TlsConfiguration`] wraps a `rustls::ServerConfig`. The bootstrap layer
//! treats it as opaque: it is stored, swapped and handed to the engine, never
//! inspected.

use std::{fmt, io::BufReader, sync::Arc};

use anyhow::{Context, Result};
use rustls::ServerConfig;

/// Cheaply cloneable handle to a TLS server configuration.
#[derive(Clone)]
pub struct TlsConfiguration {
    inner: Arc<ServerConfig>,
}

impl TlsConfiguration {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { inner: config }
    }

    /// Build a configuration from PEM-encoded certificate chain and private key
    /// bytes, using the `ring` crypto provider and no client authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate or key cannot be parsed, or if rustls
    /// rejects the pair.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self> {
        let certs = rustls_pemfile::certs(&mut BufReader::new(cert_pem))
            .collect::<Result<Vec<_>, _>>()
            .context("failed to parse TLS certificate chain")?;
        if certs.is_empty() {
            anyhow::bail!("no certificate found in PEM data");
        }

        let key = rustls_pemfile::private_key(&mut BufReader::new(key_pem))
            .context("failed to read TLS private key")?
            .context("no private key found in PEM data")?;

        let mut config = ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .context("crypto provider rejected default protocol versions")?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("failed to build rustls ServerConfig")?;
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        Ok(Self::new(Arc::new(config)))
    }

    pub fn server_config(&self) -> &Arc<ServerConfig> {
        &self.inner
    }

    /// Returns `true` if both handles point at the same configuration object.
    pub fn same_as(&self, other: &TlsConfiguration) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Arc<ServerConfig>> for TlsConfiguration {
    fn from(config: Arc<ServerConfig>) -> Self {
        Self::new(config)
    }
}

impl From<ServerConfig> for TlsConfiguration {
    fn from(config: ServerConfig) -> Self {
        Self::new(Arc::new(config))
    }
}

impl fmt::Debug for TlsConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfiguration")
            .field("alpn_protocols", &self.inner.alpn_protocols)
            .finish_non_exhaustive()
    }
}
