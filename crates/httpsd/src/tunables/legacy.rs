//! Diagnostics for override keys that are no longer consulted.
//!
//! Presence of a legacy key never changes the effective [`Tunables`]; it
//! only produces a warning through the supplied [`DiagnosticSink`].
//!
//! [`Tunables`]: super::Tunables

use super::source::{EnvSource, PropertySource};

/// Receiver for migration warnings.
pub trait DiagnosticSink {
    /// Record one warning.
    fn warn(&self, message: &str);
}

/// Forwards warnings to the `tracing` subscriber at `WARN` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "httpsd::tunables", "{message}");
    }
}

/// A historical override name and what superseded it, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyKey {
    pub key: &'static str,
    pub replacement: Option<&'static str>,
}

impl LegacyKey {
    /// The warning emitted when this key is found.
    pub fn message(&self) -> String {
        match self.replacement {
            Some(replacement) => format!(
                "{} property is no longer used. Use {replacement} instead.",
                self.key
            ),
            None => format!("{} property is no longer used.", self.key),
        }
    }
}

/// Every legacy key that is still recognised for diagnostics.
pub const LEGACY_KEYS: [LegacyKey; 3] = [
    LegacyKey {
        key: "readTimeout",
        replacement: Some(super::keys::MAX_REQ_TIME),
    },
    LegacyKey {
        key: "writeTimeout",
        replacement: Some(super::keys::MAX_RSP_TIME),
    },
    LegacyKey {
        key: "selCacheTimeout",
        replacement: None,
    },
];

/// Warn about every legacy key present in `source`.
///
/// Returns the number of warnings emitted. Stateless: repeated calls warn
/// again for the same keys.
pub fn check_legacy_properties_in<S, D>(source: &S, sink: &D) -> usize
where
    S: PropertySource + ?Sized,
    D: DiagnosticSink + ?Sized,
{
    let mut emitted = 0;
    for legacy in LEGACY_KEYS.iter().filter(|l| source.contains(l.key)) {
        sink.warn(&legacy.message());
        emitted += 1;
    }
    emitted
}

/// Warn about every legacy key present in the process environment.
pub fn check_legacy_properties<D: DiagnosticSink + ?Sized>(sink: &D) -> usize {
    check_legacy_properties_in(&EnvSource, sink)
}
