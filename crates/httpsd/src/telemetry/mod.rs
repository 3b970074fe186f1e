//! Structured logging and optional OpenTelemetry span export.
//!
//! Log level is configurable via `LOG_LEVEL` (default: `info`), overridden by
//! `RUST_LOG`, and raised to `debug` when the `debug` tunable is set.

pub mod init;

pub use init::{init_telemetry, shutdown};
