//! Time provider abstraction
//!
//! Session expiry reads time through the [`Clock`] trait so that tests can
//! drive expiry with a controllable clock instead of sleeping.
//!
//! # Example
//!
//! ```
//! use ripple::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let millis = clock.now_millis();
//! assert!(clock.now_secs() as u64 <= millis / 1000);
//! ```

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(any(test, feature = "testing"))]
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A time provider for getting current timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> u64;

    /// Get current time as seconds since Unix epoch.
    fn now_secs(&self) -> i64 {
        (self.now_millis() / 1000) as i64
    }
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Controllable clock for tests.
///
/// Unlike the system clock it only moves when told to, so session expiry can
/// be tested at exact boundaries.
///
/// Only available in unit tests and with the `testing` feature.
#[cfg(any(test, feature = "testing"))]
pub struct FixedClock {
    millis: Mutex<u64>,
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    /// Create a new fixed clock at the given time in milliseconds.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: Mutex::new(millis),
        }
    }

    fn millis(&self) -> MutexGuard<'_, u64> {
        self.millis.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance(&self, ms: u64) {
        *self.millis() += ms;
    }

    /// Advance the clock by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.advance(secs * 1000);
    }

    /// Set the clock to a specific time in milliseconds.
    pub fn set(&self, ms: u64) {
        *self.millis() = ms;
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        *self.millis()
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.get()
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1704067200000)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedClock")
            .field("millis", &self.get())
            .finish()
    }
}
