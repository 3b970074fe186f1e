//! Startup configuration for the `httpsd` binary.
//!
//! Values are read from environment variables (`TLS_CERT_PATH`, `TLS_PORT`,
//! ...). Runtime tunables for the engine live in [`crate::tunables`] and are
//! loaded separately.

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated startup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// IP address the server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Port the HTTPS server binds to.
    #[serde(default = "default_tls_port")]
    pub tls_port: u16,

    /// Accept backlog; `0` or less selects the system default.
    #[serde(default)]
    pub backlog: i32,

    /// Filesystem path to the PEM-encoded TLS certificate chain. **Required.**
    pub tls_cert_path: String,

    /// Filesystem path to the PEM-encoded TLS private key. **Required.**
    pub tls_key_path: String,

    /// OTLP endpoint for span export. Export is disabled when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}
fn default_tls_port() -> u16 {
    8443
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The address to bind the secure server to.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .listen_addr
            .parse()
            .with_context(|| format!("LISTEN_ADDR is not an IP address: {}", self.listen_addr))?;
        Ok(SocketAddr::new(ip, self.tls_port))
    }

    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.tls_cert_path, "TLS_CERT_PATH")?;
        ensure_non_empty(&self.tls_key_path, "TLS_KEY_PATH")?;
        self.socket_addr()?;
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            ensure_non_empty(endpoint, "OTEL_EXPORTER_OTLP_ENDPOINT")?;
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            listen_addr: default_listen_addr(),
            tls_port: default_tls_port(),
            backlog: 0,
            tls_cert_path: "/etc/httpsd/tls.crt".into(),
            tls_key_path: "/etc/httpsd/tls.key".into(),
            otel_exporter_otlp_endpoint: None,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_listen_addr(), "0.0.0.0");
        assert_eq!(default_tls_port(), 8443);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_cert_path() {
        let cfg = Config {
            tls_cert_path: " ".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_listen_addr() {
        let cfg = Config {
            listen_addr: "localhost".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_otlp_endpoint() {
        let cfg = Config {
            otel_exporter_otlp_endpoint: Some("".into()),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn socket_addr_supports_ipv6() {
        let cfg = Config {
            listen_addr: "::1".into(),
            tls_port: 9443,
            ..valid()
        };
        let expected: SocketAddr = "[::1]:9443".parse().unwrap();
        assert_eq!(cfg.socket_addr().unwrap(), expected);
    }
}
