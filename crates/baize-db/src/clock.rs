//! # Clock
//!
//! Injectable time source. Production code runs on [`SystemClock`]; tests
//! supply a [`FixedClock`] so session intervals and restock stamps are
//! deterministic. The pure core never reads a clock - every timestamp it
//! sees came through here.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for repositories.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        FixedClock {
            now: Mutex::new(at),
        }
    }

    /// Moves the clock to an absolute instant.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex poisoned") = at;
    }

    /// Moves the clock forward (or backward) by a duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}
