//! The time source of the resolver.
//!
//! Timeouts are never enforced preemptively. The resolver records when it
//! sent a query and compares the time elapsed since then with the
//! configured timeout whenever it is asked to make progress. The clock is
//! a type parameter so that tests can run the resolver with
//! [`FakeClock`] and move time forward explicitly.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{self, Duration};

//------------ Clock ---------------------------------------------------------

/// A source of instants.
pub trait Clock: Clone {
    /// The type of a recorded point in time.
    type Instant: Clone + Debug + Elapsed + Send + Sync;

    /// Creates a new instance of the clock.
    fn new() -> Self;

    /// Records the current time.
    fn now(&self) -> Self::Instant;
}

//------------ Elapsed -------------------------------------------------------

/// A point in time that knows how long ago it was.
pub trait Elapsed {
    /// Returns the time passed since the instant was recorded.
    fn elapsed(&self) -> Duration;

    /// Returns how much of `timeout` is left.
    fn remaining(&self, timeout: Duration) -> Duration {
        timeout.saturating_sub(self.elapsed())
    }
}

//------------ SystemClock ---------------------------------------------------

/// The monotonic system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = time::Instant;

    fn new() -> Self {
        SystemClock
    }

    fn now(&self) -> Self::Instant {
        time::Instant::now()
    }
}

impl Elapsed for time::Instant {
    fn elapsed(&self) -> Duration {
        time::Instant::elapsed(self)
    }
}

//------------ FakeClock -----------------------------------------------------

/// A clock that only moves when told to.
///
/// Clones of a fake clock share the same time.
#[derive(Clone, Debug, Default)]
pub struct FakeClock {
    now: Arc<Mutex<Duration>>,
}

impl FakeClock {
    /// Moves the time forward.
    pub fn adjust_time(&self, adjust: Duration) {
        let mut now = self.lock();
        *now = now.saturating_add(adjust);
    }

    fn curr_time(&self) -> Duration {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, Duration> {
        self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for FakeClock {
    type Instant = FakeInstant;

    fn new() -> Self {
        Self::default()
    }

    fn now(&self) -> Self::Instant {
        FakeInstant {
            start: self.curr_time(),
            clock: self.clone(),
        }
    }
}

//------------ FakeInstant ---------------------------------------------------

/// An instant of a [`FakeClock`].
#[derive(Clone, Debug)]
pub struct FakeInstant {
    start: Duration,
    clock: FakeClock,
}

impl Elapsed for FakeInstant {
    fn elapsed(&self) -> Duration {
        self.clock.curr_time().saturating_sub(self.start)
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fake_clock() {
        let clock = FakeClock::new();
        let start = clock.now();
        assert_eq!(start.elapsed(), Duration::ZERO);
        clock.clone().adjust_time(Duration::from_secs(3));
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(
            start.remaining(Duration::from_secs(5)),
            Duration::from_secs(2)
        );
        assert_eq!(start.remaining(Duration::from_secs(1)), Duration::ZERO);
    }
}
