use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Source of wall-clock readings for the engine.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time source that only moves when told to. Used for replays and tests.
pub struct ManualTimeSource {
    now: Mutex<DateTime<Utc>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    pub fn advance_secs(&self, seconds: i64) {
        self.advance(Duration::seconds(seconds));
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    Stopped,
    Running,
    Paused,
}

/// Pausable match clock. Elapsed time is derived from the instant the clock
/// last started plus what was banked before, so nothing needs to tick it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchClock {
    state: ClockState,
    banked: Duration,
    running_since: Option<DateTime<Utc>>,
    lap_started_at: u64,
    closed: bool,
}

impl Default for MatchClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchClock {
    pub fn new() -> Self {
        Self {
            state: ClockState::Stopped,
            banked: Duration::zero(),
            running_since: None,
            lap_started_at: 0,
            closed: false,
        }
    }

    /// Rebuilds a clock from persisted readings. The result never runs until
    /// started again.
    pub fn restore(seconds: u64, lap_started_at: u64, closed: bool) -> Self {
        let state = if closed || seconds == 0 {
            ClockState::Stopped
        } else {
            ClockState::Paused
        };
        Self {
            state,
            banked: Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX)),
            running_since: None,
            lap_started_at: lap_started_at.min(seconds),
            closed,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns `false` when the clock was already running or is closed.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.closed || self.state == ClockState::Running {
            return false;
        }
        self.state = ClockState::Running;
        self.running_since = Some(now);
        true
    }

    /// Returns `false` unless the clock was running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != ClockState::Running {
            return false;
        }
        self.bank(now);
        self.state = ClockState::Paused;
        true
    }

    /// Freezes the clock for good.
    pub fn stop(&mut self, now: DateTime<Utc>) {
        self.bank(now);
        self.state = ClockState::Stopped;
        self.closed = true;
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match self.running_since {
            Some(since) => self.banked + (now - since).max(Duration::zero()),
            None => self.banked,
        }
    }

    pub fn seconds(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from(self.elapsed(now).num_seconds()).unwrap_or(0)
    }

    /// Clock reading at which the current set began.
    pub fn lap_started_at(&self) -> u64 {
        self.lap_started_at
    }

    pub fn lap_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.seconds(now).saturating_sub(self.lap_started_at)
    }

    /// Starts a new lap; total elapsed keeps accumulating.
    pub fn start_lap(&mut self, now: DateTime<Utc>) {
        self.lap_started_at = self.seconds(now);
    }

    fn bank(&mut self, now: DateTime<Utc>) {
        if let Some(since) = self.running_since.take() {
            self.banked = self.banked + (now - since).max(Duration::zero());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn new_clock_is_stopped_at_zero() {
        let clock = MatchClock::new();
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.seconds(at(100)), 0);
    }

    #[test]
    fn running_clock_reads_wall_time() {
        let mut clock = MatchClock::new();
        assert!(clock.start(at(0)));
        assert_eq!(clock.seconds(at(42)), 42);
    }

    #[test]
    fn double_start_does_not_double_count() {
        let mut once = MatchClock::new();
        once.start(at(0));

        let mut twice = MatchClock::new();
        twice.start(at(0));
        assert!(!twice.start(at(10)));

        assert_eq!(once.seconds(at(30)), twice.seconds(at(30)));
        assert_eq!(twice.seconds(at(30)), 30);
    }

    #[test]
    fn pause_freezes_accrual() {
        let mut clock = MatchClock::new();
        clock.start(at(0));
        assert!(clock.pause(at(20)));
        assert!(!clock.pause(at(25)));
        assert_eq!(clock.seconds(at(60)), 20);

        clock.start(at(100));
        assert_eq!(clock.seconds(at(110)), 30);
    }

    #[test]
    fn backwards_wall_clock_never_subtracts() {
        let mut clock = MatchClock::new();
        clock.start(at(50));
        assert_eq!(clock.seconds(at(40)), 0);
        clock.pause(at(40));
        assert_eq!(clock.seconds(at(100)), 0);
    }

    #[test]
    fn stop_is_terminal() {
        let mut clock = MatchClock::new();
        clock.start(at(0));
        clock.stop(at(15));
        assert!(clock.is_closed());
        assert!(!clock.start(at(20)));
        assert_eq!(clock.seconds(at(500)), 15);
    }

    #[test]
    fn laps_track_per_set_time() {
        let mut clock = MatchClock::new();
        clock.start(at(0));
        clock.start_lap(at(90));
        assert_eq!(clock.lap_started_at(), 90);
        assert_eq!(clock.lap_seconds(at(100)), 10);
        assert_eq!(clock.seconds(at(100)), 100);
    }

    #[test]
    fn restore_pauses_at_stored_reading() {
        let clock = MatchClock::restore(125, 100, false);
        assert_eq!(clock.state(), ClockState::Paused);
        assert_eq!(clock.seconds(at(999)), 125);
        assert_eq!(clock.lap_seconds(at(999)), 25);

        let closed = MatchClock::restore(125, 100, true);
        assert_eq!(closed.state(), ClockState::Stopped);
        assert!(closed.is_closed());
    }

    #[test]
    fn manual_time_source_advances() {
        let source = ManualTimeSource::new(at(0));
        source.advance_secs(5);
        assert_eq!(source.now(), at(5));
    }
}
