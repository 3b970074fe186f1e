//! Process-wide operational tunables for the secure server engine.
//!
//! Values are read once from a [`PropertySource`] (the process environment in
//! production), defaulted when absent or malformed, and then frozen. The
//! engine reads them through [`global`] or through a [`Tunables`] snapshot it
//! was handed at construction.
//!
//! # Timer granularity
//!
//! `idleInterval`, `maxReqTime` and `maxRspTime` are meant to be reasonable
//! multiples of `clockTick`. Nothing enforces this; [`Tunables::tick_anomalies`]
//! reports deviations so the caller can decide what to do with them.

pub mod decode;
pub mod legacy;
pub mod source;

use std::{fmt, sync::OnceLock, time::Duration};

pub use legacy::{
    check_legacy_properties, check_legacy_properties_in, DiagnosticSink, TracingSink,
};
pub use source::{EnvSource, PropertySource};

/// Override key names, exactly as looked up in the source.
pub mod keys {
    pub const IDLE_INTERVAL: &str = "idleInterval";
    pub const CLOCK_TICK: &str = "clockTick";
    pub const MAX_IDLE_CONNECTIONS: &str = "maxIdleConnections";
    pub const DRAIN_AMOUNT: &str = "drainAmount";
    pub const MAX_REQ_HEADERS: &str = "maxReqHeaders";
    pub const MAX_REQ_TIME: &str = "maxReqTime";
    pub const MAX_RSP_TIME: &str = "maxRspTime";
    pub const TIMER_MILLIS: &str = "timerMillis";
    pub const DEBUG: &str = "debug";
    pub const NO_DELAY: &str = "nodelay";
}

pub const DEFAULT_CLOCK_TICK: i32 = 10_000;
/// Seconds; stored internally in milliseconds.
pub const DEFAULT_IDLE_INTERVAL_SECS: i64 = 30;
pub const DEFAULT_MAX_IDLE_CONNECTIONS: i32 = 200;
pub const DEFAULT_DRAIN_AMOUNT: i64 = 64 * 1024;
pub const DEFAULT_MAX_REQ_HEADERS: i32 = 200;
/// `-1`: no limit.
pub const DEFAULT_MAX_REQ_TIME: i64 = -1;
/// `-1`: no limit.
pub const DEFAULT_MAX_RSP_TIME: i64 = -1;
pub const DEFAULT_TIMER_MILLIS: i64 = 1000;

/// Immutable snapshot of every tunable.
///
/// All time values are milliseconds. Negative request/response times mean
/// "unlimited" and are never coerced to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tunables {
    clock_tick: i32,
    idle_interval: i64,
    max_idle_connections: i32,
    drain_amount: i64,
    max_req_headers: i32,
    max_req_time: i64,
    max_rsp_time: i64,
    timer_millis: i64,
    debug: bool,
    no_delay: bool,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            clock_tick: DEFAULT_CLOCK_TICK,
            idle_interval: DEFAULT_IDLE_INTERVAL_SECS * 1000,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
            drain_amount: DEFAULT_DRAIN_AMOUNT,
            max_req_headers: DEFAULT_MAX_REQ_HEADERS,
            max_req_time: DEFAULT_MAX_REQ_TIME,
            max_rsp_time: DEFAULT_MAX_RSP_TIME,
            timer_millis: DEFAULT_TIMER_MILLIS,
            debug: false,
            no_delay: false,
        }
    }
}

impl Tunables {
    /// Build a snapshot from `source`, falling back to the default for every
    /// key that is absent or malformed.
    pub fn from_source<S: PropertySource + ?Sized>(source: &S) -> Self {
        let idle_secs = long_or(source, keys::IDLE_INTERVAL, DEFAULT_IDLE_INTERVAL_SECS);
        let idle_interval = idle_secs
            .checked_mul(1000)
            .unwrap_or(DEFAULT_IDLE_INTERVAL_SECS * 1000);

        Self {
            clock_tick: int_or(source, keys::CLOCK_TICK, DEFAULT_CLOCK_TICK),
            idle_interval,
            max_idle_connections: int_or(
                source,
                keys::MAX_IDLE_CONNECTIONS,
                DEFAULT_MAX_IDLE_CONNECTIONS,
            ),
            drain_amount: long_or(source, keys::DRAIN_AMOUNT, DEFAULT_DRAIN_AMOUNT),
            max_req_headers: int_or(source, keys::MAX_REQ_HEADERS, DEFAULT_MAX_REQ_HEADERS),
            max_req_time: long_or(source, keys::MAX_REQ_TIME, DEFAULT_MAX_REQ_TIME),
            max_rsp_time: long_or(source, keys::MAX_RSP_TIME, DEFAULT_MAX_RSP_TIME),
            timer_millis: long_or(source, keys::TIMER_MILLIS, DEFAULT_TIMER_MILLIS),
            debug: flag(source, keys::DEBUG),
            no_delay: flag(source, keys::NO_DELAY),
        }
    }

    /// Build a snapshot from the process environment.
    pub fn from_env() -> Self {
        Self::from_source(&EnvSource)
    }

    /// Internal timer granularity, in milliseconds.
    pub fn clock_tick(&self) -> i32 {
        self.clock_tick
    }

    /// Idle-connection timeout, in milliseconds.
    pub fn idle_interval(&self) -> i64 {
        self.idle_interval
    }

    pub fn max_idle_connections(&self) -> i32 {
        self.max_idle_connections
    }

    /// Maximum bytes to discard from an unread request body before giving up
    /// on the connection.
    pub fn drain_amount(&self) -> i64 {
        self.drain_amount
    }

    pub fn max_req_headers(&self) -> i32 {
        self.max_req_headers
    }

    /// Maximum time to receive a request, in milliseconds; negative is unlimited.
    pub fn max_req_time(&self) -> i64 {
        self.max_req_time
    }

    /// Maximum time to send a response, in milliseconds; negative is unlimited.
    pub fn max_rsp_time(&self) -> i64 {
        self.max_rsp_time
    }

    pub fn timer_millis(&self) -> i64 {
        self.timer_millis
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// Value for `TCP_NODELAY` on accepted connections.
    pub fn tcp_no_delay(&self) -> bool {
        self.no_delay
    }

    pub fn clock_tick_duration(&self) -> Option<Duration> {
        millis(i64::from(self.clock_tick))
    }

    pub fn idle_interval_duration(&self) -> Option<Duration> {
        millis(self.idle_interval)
    }

    pub fn timer_duration(&self) -> Option<Duration> {
        millis(self.timer_millis)
    }

    /// `None` when requests may take forever.
    pub fn max_req_duration(&self) -> Option<Duration> {
        millis(self.max_req_time)
    }

    /// `None` when responses may take forever.
    pub fn max_rsp_duration(&self) -> Option<Duration> {
        millis(self.max_rsp_time)
    }

    /// Report every tick-driven value that is not a whole multiple of
    /// `clockTick`.
    ///
    /// `timerMillis` and `drainAmount` are not driven by the clock tick and are
    /// never reported. Unlimited request/response times are skipped.
    pub fn tick_anomalies(&self) -> Vec<TickAnomaly> {
        if self.clock_tick <= 0 {
            return vec![TickAnomaly::ClockTickNotPositive {
                clock_tick: self.clock_tick,
            }];
        }
        let tick = i64::from(self.clock_tick);

        [
            (keys::IDLE_INTERVAL, self.idle_interval),
            (keys::MAX_REQ_TIME, self.max_req_time),
            (keys::MAX_RSP_TIME, self.max_rsp_time),
        ]
        .into_iter()
        .filter(|&(field, value)| {
            let unlimited = field != keys::IDLE_INTERVAL && value < 0;
            !unlimited && value % tick != 0
        })
        .map(|(field, value)| TickAnomaly::NotTickMultiple {
            field,
            value,
            clock_tick: self.clock_tick,
        })
        .collect()
    }
}

/// A tunable whose value does not line up with the timer granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAnomaly {
    /// `clockTick` is zero or negative, so no multiple relationship holds.
    ClockTickNotPositive { clock_tick: i32 },

    /// `field` (milliseconds) is not a whole multiple of `clockTick`.
    NotTickMultiple {
        field: &'static str,
        value: i64,
        clock_tick: i32,
    },
}

impl fmt::Display for TickAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickAnomaly::ClockTickNotPositive { clock_tick } => {
                write!(f, "clockTick is not positive ({clock_tick} ms)")
            }
            TickAnomaly::NotTickMultiple {
                field,
                value,
                clock_tick,
            } => write!(
                f,
                "{field} ({value} ms) is not a multiple of clockTick ({clock_tick} ms)"
            ),
        }
    }
}

/// One-time holder for a [`Tunables`] snapshot.
///
/// The first caller of [`TunablesCell::get_or_load`] reads the source; every
/// other caller, concurrent or later, receives the same snapshot.
#[derive(Debug, Default)]
pub struct TunablesCell {
    inner: OnceLock<Tunables>,
}

impl TunablesCell {
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    pub fn get_or_load<S: PropertySource + ?Sized>(&self, source: &S) -> &Tunables {
        self.inner.get_or_init(|| Tunables::from_source(source))
    }

    /// The snapshot, if one has been loaded.
    pub fn get(&self) -> Option<&Tunables> {
        self.inner.get()
    }
}

static GLOBAL: TunablesCell = TunablesCell::new();

/// The process-wide snapshot, loaded from the environment on first use.
pub fn global() -> &'static Tunables {
    GLOBAL.get_or_load(&EnvSource)
}

fn int_or<S: PropertySource + ?Sized>(source: &S, key: &str, default: i32) -> i32 {
    source
        .property(key)
        .and_then(|raw| decode::decode_i32(&raw).ok())
        .unwrap_or(default)
}

fn long_or<S: PropertySource + ?Sized>(source: &S, key: &str, default: i64) -> i64 {
    source
        .property(key)
        .and_then(|raw| decode::decode_i64(&raw).ok())
        .unwrap_or(default)
}

fn flag<S: PropertySource + ?Sized>(source: &S, key: &str) -> bool {
    source
        .property(key)
        .is_some_and(|raw| decode::decode_flag(&raw))
}

fn millis(value: i64) -> Option<Duration> {
    u64::try_from(value).ok().map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Barrier,
        },
        thread,
    };

    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let t = Tunables::from_source(&HashMap::<String, String>::new());
        assert_eq!(t.clock_tick(), 10_000);
        assert_eq!(t.idle_interval(), 30_000);
        assert_eq!(t.max_idle_connections(), 200);
        assert_eq!(t.drain_amount(), 65_536);
        assert_eq!(t.max_req_headers(), 200);
        assert_eq!(t.max_req_time(), -1);
        assert_eq!(t.max_rsp_time(), -1);
        assert_eq!(t.timer_millis(), 1000);
        assert!(!t.debug_enabled());
        assert!(!t.tcp_no_delay());
        assert_eq!(t, Tunables::default());
    }

    #[test]
    fn idle_interval_is_converted_to_millis() {
        let t = Tunables::from_source(&source(&[("idleInterval", "5")]));
        assert_eq!(t.idle_interval(), 5000);
        assert_eq!(t.idle_interval_duration(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn overrides_are_applied() {
        let t = Tunables::from_source(&source(&[
            ("clockTick", "500"),
            ("maxIdleConnections", "16"),
            ("drainAmount", "0x1000"),
            ("maxReqHeaders", "64"),
            ("maxReqTime", "30000"),
            ("maxRspTime", "60000"),
            ("timerMillis", "250"),
            ("debug", "true"),
            ("nodelay", "TRUE"),
        ]));
        assert_eq!(t.clock_tick(), 500);
        assert_eq!(t.max_idle_connections(), 16);
        assert_eq!(t.drain_amount(), 4096);
        assert_eq!(t.max_req_headers(), 64);
        assert_eq!(t.max_req_time(), 30_000);
        assert_eq!(t.max_rsp_time(), 60_000);
        assert_eq!(t.timer_millis(), 250);
        assert!(t.debug_enabled());
        assert!(t.tcp_no_delay());
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let t = Tunables::from_source(&source(&[
            ("clockTick", "fast"),
            ("maxIdleConnections", "99999999999"),
            ("idleInterval", "9223372036854775807"),
            ("maxReqTime", ""),
            ("debug", "yes"),
            ("nodelay", "1"),
        ]));
        assert_eq!(t, Tunables::default());
    }

    #[test]
    fn unlimited_times_are_not_zero() {
        let t = Tunables::default();
        assert_eq!(t.max_req_time(), -1);
        assert_eq!(t.max_req_duration(), None);
        assert_eq!(t.max_rsp_duration(), None);

        let limited = Tunables::from_source(&source(&[("maxReqTime", "0")]));
        assert_eq!(limited.max_req_duration(), Some(Duration::ZERO));
    }

    #[test]
    fn defaults_have_no_tick_anomalies() {
        assert!(Tunables::default().tick_anomalies().is_empty());
    }

    #[test]
    fn off_tick_values_are_reported_not_rejected() {
        let t = Tunables::from_source(&source(&[
            ("clockTick", "1000"),
            ("idleInterval", "5"),
            ("maxReqTime", "1500"),
            ("maxRspTime", "-1"),
        ]));
        assert_eq!(t.max_req_time(), 1500);
        assert_eq!(
            t.tick_anomalies(),
            vec![TickAnomaly::NotTickMultiple {
                field: keys::MAX_REQ_TIME,
                value: 1500,
                clock_tick: 1000,
            }]
        );
    }

    #[test]
    fn non_positive_clock_tick_is_reported() {
        let t = Tunables::from_source(&source(&[("clockTick", "0")]));
        assert_eq!(
            t.tick_anomalies(),
            vec![TickAnomaly::ClockTickNotPositive { clock_tick: 0 }]
        );
        assert!(t.tick_anomalies()[0].to_string().contains("not positive"));
    }

    struct CountingSource {
        reads: AtomicUsize,
        inner: HashMap<String, String>,
    }

    impl PropertySource for CountingSource {
        fn property(&self, key: &str) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.property(key)
        }
    }

    #[test]
    fn concurrent_first_access_loads_once() {
        const READERS: usize = 16;

        let cell = Arc::new(TunablesCell::new());
        let source = Arc::new(CountingSource {
            reads: AtomicUsize::new(0),
            inner: source(&[("idleInterval", "7"), ("clockTick", "700")]),
        });
        let barrier = Arc::new(Barrier::new(READERS));

        let handles: Vec<_> = (0..READERS)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let source = Arc::clone(&source);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let t = cell.get_or_load(&*source);
                    (t as *const Tunables as usize, *t)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let (first_ptr, first) = results[0];
        for (ptr, t) in &results {
            assert_eq!(*ptr, first_ptr);
            assert_eq!(*t, first);
        }
        assert_eq!(first.idle_interval(), 7000);
        assert_eq!(first.clock_tick(), 700);
        // One pass over the ten keys, no matter how many readers raced.
        assert_eq!(source.reads.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn cell_ignores_later_sources() {
        let cell = TunablesCell::new();
        assert!(cell.get().is_none());
        cell.get_or_load(&source(&[("maxReqHeaders", "10")]));
        let t = cell.get_or_load(&source(&[("maxReqHeaders", "20")]));
        assert_eq!(t.max_req_headers(), 10);
    }

    #[test]
    fn global_is_stable() {
        assert!(std::ptr::eq(global(), global()));
    }
}
