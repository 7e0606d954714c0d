use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time provider sampled by [`SceneClock`](super::SceneClock).
pub trait TimeSource {
    /// Current monotonic timestamp. Must never go backwards.
    fn now(&self) -> Instant;
}

/// Wall-clock source backed by [`Instant::now`].
#[derive(Debug, Copy, Clone, Default)]
pub struct MonotonicSource;

impl TimeSource for MonotonicSource {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced source for deterministic tests and replays.
///
/// Time only moves when [`ManualSource::advance`] or [`ManualSource::set`] is
/// called. Clones share the same timeline, so a test can keep one clone while a
/// scene owns another.
#[derive(Debug, Clone)]
pub struct ManualSource {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Moves time forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Jumps to `offset` past the source's origin.
    ///
    /// # Panics
    /// Panics (debug only) if this would move time backwards.
    pub fn set(&self, offset: Duration) {
        debug_assert!(offset >= self.offset.get(), "ManualSource cannot go backwards");
        self.offset.set(offset);
    }

    /// Current offset past the source's origin.
    pub fn offset(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualSource {
    #[inline]
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}
