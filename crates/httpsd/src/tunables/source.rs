//! Where tunable overrides come from.

use std::collections::HashMap;

/// A read-only lookup of named override values.
///
/// The process environment is the production source; tests and embedders
/// inject maps instead.
pub trait PropertySource {
    /// Return the raw value for `key`, or `None` when the key is not set.
    fn property(&self, key: &str) -> Option<String>;

    /// Returns `true` if `key` is set at all, whatever its value.
    fn contains(&self, key: &str) -> bool {
        self.property(key).is_some()
    }
}

/// Reads overrides from process environment variables, using the key names
/// verbatim (`idleInterval`, `maxReqTime`, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSource;

impl PropertySource for EnvSource {
    fn property(&self, key: &str) -> Option<String> {
        // Non-UTF-8 values cannot be decoded and count as absent.
        std::env::var(key).ok()
    }

    fn contains(&self, key: &str) -> bool {
        std::env::var_os(key).is_some()
    }
}

impl PropertySource for HashMap<String, String> {
    fn property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: PropertySource + ?Sized> PropertySource for &T {
    fn property(&self, key: &str) -> Option<String> {
        (**self).property(key)
    }

    fn contains(&self, key: &str) -> bool {
        (**self).contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_source_lookup() {
        let mut map = HashMap::new();
        map.insert("clockTick".to_owned(), "500".to_owned());
        assert_eq!(map.property("clockTick").as_deref(), Some("500"));
        assert!(map.contains("clockTick"));
        assert!(!map.contains("timerMillis"));
    }

    #[test]
    fn env_source_reads_process_environment() {
        let key = "httpsd_source_test_unique_key";
        assert!(!EnvSource.contains(key));
        std::env::set_var(key, "42");
        assert_eq!(EnvSource.property(key).as_deref(), Some("42"));
        assert!(EnvSource.contains(key));
        std::env::remove_var(key);
    }
}
