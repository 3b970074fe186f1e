//! Bootstrap layer for a secure HTTP server.
//!
//! - [`provider`]: factory that hands out [`server::SecureServer`] instances
//!   from the installed provider.
//! - [`server`]: the secure-server capability, its TLS configuration handle,
//!   and the bundled TCP implementation.
//! - [`tunables`]: environment-derived operational limits, loaded once.
//! - [`config`] and [`telemetry`]: startup plumbing for the `httpsd` binary.

pub mod config;
pub mod provider;
pub mod server;
pub mod telemetry;
pub mod tunables;
