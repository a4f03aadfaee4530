// SPDX-License-Identifier: MIT

//! Clock abstraction for testable time handling.
//!
//! The engine is single-threaded cooperative, so unlike a typical service
//! clock this one does not need to be `Send + Sync`: [`FakeClock`] shares
//! its mutable state via `Rc<RefCell<_>>` rather than `Arc<Mutex<_>>`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time.
///
/// Object-safe so a node can hold `Rc<dyn Clock>` rather than being generic
/// over the concrete clock type.
pub trait Clock {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    current: Rc<RefCell<Instant>>,
    epoch_ms: Rc<RefCell<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Rc::new(RefCell::new(Instant::now())),
            epoch_ms: Rc::new(RefCell::new(1_000_000)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.current.borrow_mut() += duration;
        *self.epoch_ms.borrow_mut() += duration.as_millis() as u64;
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        *self.current.borrow_mut() = instant;
    }

    /// Set the epoch milliseconds value.
    pub fn set_epoch_ms(&self, ms: u64) {
        *self.epoch_ms.borrow_mut() = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.borrow()
    }

    fn epoch_ms(&self) -> u64 {
        *self.epoch_ms.borrow()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
