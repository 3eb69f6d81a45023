//! Frame-driven timers.
//!
//! The playfield advances in fixed steps of [`FRAME_DURATION`]. Every timer here
//! is a plain value advanced by the state machine; none of them calls back into
//! it. A [`Countdown`] reports its expiry by returning the action it was built
//! with, and the caller decides what to do with it.

use std::time::Duration;

const FRAME_NANOS: u64 = 16_666_667;

/// Length of one simulation step (60 Hz).
pub const FRAME_DURATION: Duration = Duration::from_nanos(FRAME_NANOS);

/// Fastest gravity: twenty rows per frame.
pub const GRAVITY_20G: Duration = Duration::from_nanos(FRAME_NANOS / 20);

/// Converts a frame count to a duration.
#[must_use]
pub const fn frames(count: u64) -> Duration {
    Duration::from_nanos(FRAME_NANOS * count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum TimerState {
    Running,
    Stopped,
}

/// One-shot countdown that yields `action` when it runs out.
///
/// Starting it again while running keeps the remaining time; stopping rewinds
/// it to the full duration.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Countdown, frames, FRAME_DURATION};
///
/// let mut countdown = Countdown::new(frames(2), "done");
/// countdown.start();
/// assert_eq!(countdown.update(FRAME_DURATION), None);
/// assert_eq!(countdown.update(FRAME_DURATION), Some("done"));
/// assert!(countdown.state().is_stopped());
/// ```
#[derive(Debug, Clone)]
pub struct Countdown<A> {
    duration: Duration,
    remaining: Duration,
    state: TimerState,
    action: A,
}

impl<A: Copy> Countdown<A> {
    /// Creates a stopped countdown.
    #[must_use]
    pub const fn new(duration: Duration, action: A) -> Self {
        Self {
            duration,
            remaining: duration,
            state: TimerState::Stopped,
            action,
        }
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Rewinds to the full duration and stops.
    pub fn stop(&mut self) {
        self.remaining = self.duration;
        self.state = TimerState::Stopped;
    }

    /// Starts the countdown. Has no effect while it is already running.
    pub fn start(&mut self) {
        self.state = TimerState::Running;
    }

    /// Advances by `elapsed`. Returns the action once, when the countdown
    /// runs out, and stops it.
    pub fn update(&mut self, elapsed: Duration) -> Option<A> {
        if !self.is_running() {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        if !self.remaining.is_zero() {
            return None;
        }
        self.stop();
        Some(self.action)
    }
}

/// Minimum spacing between repeated actions.
///
/// Counts down every frame regardless of input; an action may fire once the
/// cooldown reaches zero, after which the caller re-arms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    remaining: Duration,
    interval: Duration,
}

impl Cooldown {
    /// Creates a cooldown that is ready immediately.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            remaining: Duration::ZERO,
            interval,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.remaining = self.remaining.saturating_sub(elapsed);
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn rearm(&mut self) {
        self.remaining = self.interval;
    }

    pub fn reset(&mut self) {
        self.remaining = Duration::ZERO;
    }
}

/// Accumulates elapsed time and reports how many whole intervals passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulator {
    elapsed: Duration,
    interval: Duration,
}

impl Accumulator {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            interval,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Adds `elapsed` and returns the number of whole intervals consumed.
    pub fn tick(&mut self, elapsed: Duration) -> u32 {
        self.elapsed += elapsed;
        let mut steps = 0;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            steps += 1;
        }
        steps
    }
}

/// Delayed auto-shift for held horizontal input.
///
/// The first move happens as soon as the cooldown allows. The next one waits
/// the normal delay; once more than one repeat has accumulated, moves use the
/// turbo delay until [`AutoRepeat::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoRepeat {
    cooldown: Cooldown,
    normal_delay: Duration,
    turbo_delay: Duration,
    repeats: u32,
}

impl AutoRepeat {
    const TURBO_THRESHOLD: u32 = 1;

    #[must_use]
    pub const fn new(normal_delay: Duration, turbo_delay: Duration) -> Self {
        Self {
            cooldown: Cooldown::new(normal_delay),
            normal_delay,
            turbo_delay,
            repeats: 0,
        }
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.cooldown.tick(elapsed);
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown.is_ready()
    }

    #[must_use]
    pub fn is_turbo(&self) -> bool {
        self.repeats > Self::TURBO_THRESHOLD
    }

    /// Records a move and re-arms with the normal or turbo delay.
    pub fn repeat(&mut self) {
        self.repeats = self.repeats.saturating_add(1);
        let delay = if self.is_turbo() {
            self.turbo_delay
        } else {
            self.normal_delay
        };
        self.cooldown.set_interval(delay);
        self.cooldown.rearm();
    }

    pub fn reset(&mut self) {
        self.repeats = 0;
        self.cooldown.set_interval(self.normal_delay);
        self.cooldown.reset();
    }
}
