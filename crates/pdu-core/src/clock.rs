//! Time source for debounce bookkeeping.
//!
//! Every `now()` and every debounce wait in the PDU layer goes through a
//! [`Clock`]. Production code uses [`SystemClock`]; tests use [`ManualClock`],
//! whose `sleep` advances virtual time instantly and records how long the
//! caller asked to wait.
//!
//! Wall-clock timestamps ([`Clock::now`]) are only reported. Waits are
//! computed from [`Clock::monotonic`], which never jumps when the system
//! clock is corrected.

use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fmt;
use std::time::{Duration, Instant};

/// Injectable clock with a blocking sleep.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Monotonic reading: time since an arbitrary fixed origin.
    fn monotonic(&self) -> Duration;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);

    /// Monotonic time elapsed since an earlier [`monotonic`](Self::monotonic)
    /// reading. Never negative.
    fn elapsed_since(&self, earlier: Duration) -> Duration {
        self.monotonic().saturating_sub(earlier)
    }
}

static ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// Real time: `Utc::now()`, `Instant` and `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic(&self) -> Duration {
        ORIGIN.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug)]
struct ManualState {
    now: DateTime<Utc>,
    monotonic: Duration,
    sleeps: Vec<Duration>,
}

/// Virtual clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    /// Clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: start,
                monotonic: Duration::ZERO,
                sleeps: Vec::new(),
            }),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.now = add(state.now, duration);
        state.monotonic = state.monotonic.saturating_add(duration);
    }

    /// Step the wall clock to an arbitrary instant (may go backwards).
    ///
    /// Monotonic time is unaffected, as with a real system clock correction.
    pub fn set(&self, now: DateTime<Utc>) {
        self.state.lock().now = now;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }

    /// Sum of all requested sleeps.
    pub fn total_slept(&self) -> Duration {
        self.state.lock().sleeps.iter().sum()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().now
    }

    fn monotonic(&self) -> Duration {
        self.state.lock().monotonic
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.sleeps.push(duration);
        state.now = add(state.now, duration);
        state.monotonic = state.monotonic.saturating_add(duration);
    }
}

fn add(at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_sleep_advances_and_records() {
        let clock = ManualClock::default();
        let start = clock.monotonic();
        let wall_start = clock.now();

        clock.sleep(Duration::from_secs(3));
        clock.advance(Duration::from_millis(500));

        assert_eq!(clock.elapsed_since(start), Duration::from_millis(3500));
        assert_eq!(clock.now() - wall_start, TimeDelta::milliseconds(3500));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(3)]);
        assert_eq!(clock.total_slept(), Duration::from_secs(3));
    }

    #[test]
    fn test_wall_steps_do_not_move_monotonic_time() {
        let clock = ManualClock::default();
        let start = clock.monotonic();

        clock.set(add(clock.now(), Duration::from_secs(3600)));
        assert_eq!(clock.elapsed_since(start), Duration::ZERO);

        clock.set(DateTime::<Utc>::UNIX_EPOCH - TimeDelta::seconds(60));
        assert_eq!(clock.elapsed_since(start), Duration::ZERO);
    }

    #[test]
    fn test_elapsed_since_later_reading_is_zero() {
        let clock = ManualClock::default();
        let later = clock.monotonic() + Duration::from_secs(60);
        assert_eq!(clock.elapsed_since(later), Duration::ZERO);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let start = clock.monotonic();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.elapsed_since(start) >= Duration::from_millis(5));
    }
}
