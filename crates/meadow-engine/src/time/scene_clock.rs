use std::time::{Duration, Instant};

use super::{MonotonicSource, TimeSource, TimeState};

/// Clock configuration.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ClockConfig {
    /// Upper bound for the reported `delta_time`.
    ///
    /// `None` reports the exact time between samples. A bound keeps downstream
    /// integration stable after debugger pauses or long stalls. `total_time` is
    /// never clamped.
    pub max_delta: Option<Duration>,
}

/// Scene clock producing [`TimeState`] snapshots.
///
/// The reference point is captured in the constructor and never changes, so
/// `total_time` is always "time since construction". `delta_time` is the time
/// since the previous [`advance`](Self::advance), or since construction for the
/// first call: a scene that sits idle between setup and its first frame sees that
/// idle time as the first frame's delta.
///
/// Must be advanced from a single thread; there is no internal locking.
#[derive(Debug, Clone)]
pub struct SceneClock<S = MonotonicSource> {
    source: S,
    start: Instant,
    last: Instant,
    frame_count: u64,
    max_delta: Option<Duration>,
}

impl SceneClock<MonotonicSource> {
    /// Creates a wall-clock scene clock starting now.
    pub fn new(config: ClockConfig) -> Self {
        Self::with_source(MonotonicSource, config)
    }
}

impl<S: TimeSource> SceneClock<S> {
    /// Creates a clock sampling `source`, starting at `source.now()`.
    pub fn with_source(source: S, config: ClockConfig) -> Self {
        let start = source.now();
        Self {
            source,
            start,
            last: start,
            frame_count: 0,
            max_delta: config.max_delta,
        }
    }

    /// Samples the source and returns the new time state.
    pub fn advance(&mut self) -> TimeState {
        let now = self.source.now();

        let mut dt = now.saturating_duration_since(self.last);
        if let Some(max) = self.max_delta {
            dt = dt.min(max);
        }
        let total = now.saturating_duration_since(self.start);

        self.last = now;
        self.frame_count = self.frame_count.wrapping_add(1);

        TimeState::new(dt.as_secs_f32(), total.as_secs_f32())
    }

    /// Time since construction, without advancing.
    pub fn elapsed(&self) -> Duration {
        self.source.now().saturating_duration_since(self.start)
    }
}

impl<S> SceneClock<S> {
    /// Number of `advance` calls so far.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for SceneClock<MonotonicSource> {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualSource;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn manual_clock(config: ClockConfig) -> (ManualSource, SceneClock<ManualSource>) {
        let src = ManualSource::new();
        let clock = SceneClock::with_source(src.clone(), config);
        (src, clock)
    }

    // ── advance ───────────────────────────────────────────────────────────

    #[test]
    fn first_delta_is_time_since_construction() {
        let (src, mut clock) = manual_clock(ClockConfig::default());

        src.advance(ms(40));
        let t = clock.advance();

        assert_eq!(t.delta_time, ms(40).as_secs_f32());
        assert_eq!(t.total_time, ms(40).as_secs_f32());
    }

    #[test]
    fn immediate_advance_reports_zero() {
        let (_src, mut clock) = manual_clock(ClockConfig::default());
        let t = clock.advance();
        assert_eq!(t, TimeState::ZERO);
    }

    #[test]
    fn delta_and_total_follow_sample_times() {
        let (src, mut clock) = manual_clock(ClockConfig::default());
        let samples = [ms(5), ms(21), ms(22), ms(100), ms(1_000)];

        let mut prev = Duration::ZERO;
        let mut prev_total = 0.0f32;
        for &at in &samples {
            src.set(at);
            let t = clock.advance();

            assert_eq!(t.total_time, at.as_secs_f32());
            assert_eq!(t.delta_time, (at - prev).as_secs_f32());
            assert!(t.total_time >= prev_total);

            prev = at;
            prev_total = t.total_time;
        }

        assert_eq!(clock.frame_count(), samples.len() as u64);
    }

    #[test]
    fn repeated_sample_yields_zero_delta() {
        let (src, mut clock) = manual_clock(ClockConfig::default());
        src.advance(ms(10));
        clock.advance();
        let t = clock.advance();
        assert_eq!(t.delta_time, 0.0);
        assert_eq!(t.total_time, ms(10).as_secs_f32());
    }

    // ── clamping ──────────────────────────────────────────────────────────

    #[test]
    fn max_delta_clamps_delta_only() {
        let (src, mut clock) = manual_clock(ClockConfig {
            max_delta: Some(ms(250)),
        });

        src.advance(Duration::from_secs(3));
        let t = clock.advance();

        assert_eq!(t.delta_time, ms(250).as_secs_f32());
        assert_eq!(t.total_time, 3.0);
    }

    // ── misc ──────────────────────────────────────────────────────────────

    fn frames_of<S>(clock: &SceneClock<S>) -> u64 {
        clock.frame_count()
    }

    #[test]
    fn frame_count_needs_no_time_source() {
        let (_src, mut clock) = manual_clock(ClockConfig::default());
        clock.advance();
        clock.advance();
        assert_eq!(frames_of(&clock), 2);
    }

    #[test]
    fn elapsed_does_not_advance() {
        let (src, clock) = manual_clock(ClockConfig::default());
        src.advance(ms(7));
        assert_eq!(clock.elapsed(), ms(7));
        assert_eq!(clock.frame_count(), 0);
    }

    #[test]
    fn wall_clock_advances() {
        let mut clock = SceneClock::default();
        std::thread::sleep(ms(10));
        let t = clock.advance();
        assert!(t.delta_time >= 0.009);
        assert_eq!(t.delta_time, t.total_time);
    }
}
