//! `httpsd` — bootstrap preflight for the secure server.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Load the process-wide tunables.
//! 3. Initialise telemetry (JSON logs, optional OTLP).
//! 4. Warn about legacy override keys and off-tick tunables.
//! 5. Install the TCP provider and create a bound secure server.
//! 6. Load the TLS certificate and key and attach the configuration.
//!
//! Serving connections is the engine's job; this binary exits once the server
//! is bound and TLS-ready.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use httpsd::{
    config::Config,
    provider::{self, TcpProvider},
    server::TlsConfiguration,
    telemetry,
    tunables::{self, TracingSink},
};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Tunables
    // -----------------------------------------------------------------------
    let limits = tunables::global();

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    let log_level = if limits.debug_enabled() {
        "debug"
    } else {
        cfg.log_level.as_str()
    };
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "httpsd starting");

    // -----------------------------------------------------------------------
    // 4. Diagnostics
    // -----------------------------------------------------------------------
    tunables::check_legacy_properties(&TracingSink);
    for anomaly in limits.tick_anomalies() {
        warn!(%anomaly, "tunable does not line up with the clock tick");
    }
    info!(
        clock_tick_ms = limits.clock_tick(),
        idle_interval_ms = limits.idle_interval(),
        max_idle_connections = limits.max_idle_connections(),
        drain_amount = limits.drain_amount(),
        max_req_headers = limits.max_req_headers(),
        max_req_time_ms = limits.max_req_time(),
        max_rsp_time_ms = limits.max_rsp_time(),
        timer_ms = limits.timer_millis(),
        tcp_no_delay = limits.tcp_no_delay(),
        "tunables loaded"
    );

    // -----------------------------------------------------------------------
    // 5. Provider + server
    // -----------------------------------------------------------------------
    provider::install(Arc::new(TcpProvider::new(*limits)))?;
    let addr = cfg.socket_addr()?;
    let server = provider::create_with(Some(addr), cfg.backlog)
        .with_context(|| format!("failed to create secure server on {addr}"))?;

    // -----------------------------------------------------------------------
    // 6. TLS
    // -----------------------------------------------------------------------
    let cert_pem = tokio::fs::read(&cfg.tls_cert_path)
        .await
        .with_context(|| format!("failed to read {}", cfg.tls_cert_path))?;
    let key_pem = tokio::fs::read(&cfg.tls_key_path)
        .await
        .with_context(|| format!("failed to read {}", cfg.tls_key_path))?;
    let tls = TlsConfiguration::from_pem(&cert_pem, &key_pem)?;
    server.set_tls_configuration(Some(tls))?;

    info!(
        addr = ?server.local_addr(),
        backlog = ?server.backlog(),
        tls_ready = server.is_tls_ready(),
        "secure server ready"
    );

    telemetry::shutdown();
    Ok(())
}
