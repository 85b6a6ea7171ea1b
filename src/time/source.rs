//! Clock abstraction for real-time and fast-forward operation.
//!
//! The polling loop never calls `Local::now()` directly. It asks the global
//! time source, which is the wall clock in normal operation and a
//! fast-forward clock under `adhanr simulate`. Core scheduling operations take
//! `now` as a parameter, so tests never go through this module at all.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, TimeZone};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Source of "now" and of sleeping between ticks.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Sleep for `duration` (or pretend to).
    fn sleep(&self, duration: StdDuration);

    fn is_simulated(&self) -> bool;

    /// True once a simulated run reached its end instant.
    fn is_ended(&self) -> bool {
        false
    }
}

/// The system wall clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Clock that jumps forward by each requested sleep instantly.
///
/// Every `sleep(d)` advances the simulated instant by exactly `d` and yields
/// for a millisecond, so a full day of one-second ticks replays in well under
/// two minutes while keeping the same tick-by-tick behaviour.
pub struct FastForwardTimeSource {
    current: Mutex<DateTime<Local>>,
    end_time: DateTime<Local>,
}

impl FastForwardTimeSource {
    pub fn new(start_time: DateTime<Local>, end_time: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start_time),
            end_time,
        }
    }

    fn current(&self) -> DateTime<Local> {
        match self.current.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl TimeSource for FastForwardTimeSource {
    fn now(&self) -> DateTime<Local> {
        self.current()
    }

    fn sleep(&self, duration: StdDuration) {
        let step = ChronoDuration::milliseconds(duration.as_millis() as i64);
        if let Ok(mut guard) = self.current.lock() {
            *guard = (*guard + step).min(self.end_time);
        }
        std::thread::sleep(StdDuration::from_millis(1));
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.current() >= self.end_time
    }
}

/// Install the process time source. Only the first call has an effect.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

fn source() -> &'static Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource))
}

pub fn now() -> DateTime<Local> {
    source().now()
}

pub fn sleep(duration: StdDuration) {
    source().sleep(duration)
}

pub fn is_simulated() -> bool {
    source().is_simulated()
}

pub fn simulation_ended() -> bool {
    source().is_ended()
}

/// Parse a local `YYYY-MM-DD HH:MM:SS` instant.
pub fn parse_datetime(s: &str) -> Result<DateTime<Local>, String> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;
    Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| "Ambiguous or invalid local time".to_string())
}
