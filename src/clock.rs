//! Emitter simulation clock.
//!
//! Tracks the pool's simulation time, wraps it at the loop duration and turns
//! each tick into an exact emission count.
//!
//! # Example
//!
//! ```
//! use particle_pool::clock::EmitterClock;
//!
//! let mut clock = EmitterClock::new(10.0, false);
//! let tick = clock.advance(0.5);
//! assert_eq!(tick.emission_count(2.0), 1);
//! assert_eq!(clock.time(), 0.5);
//! ```

/// Result of one clock step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Simulation time before the step.
    pub last_time: f32,
    /// Simulation time after the step (wrapped when looping).
    pub time: f32,
    /// How many times the clock wrapped during the step.
    pub wraps: u32,
    /// Loop duration in effect for the step.
    pub duration: f32,
}

impl Tick {
    /// Particles due during this step at `rate` particles per second.
    ///
    /// Counts boundary crossings of `time * rate` rather than accumulating
    /// `dt * rate`, so variable frame times neither drift nor double count.
    /// Each wrap contributes one full cycle of `floor(duration * rate)`.
    pub fn emission_count(&self, rate: f32) -> u32 {
        if !(rate > 0.0) {
            return 0;
        }
        let before = (self.last_time * rate).floor() as i64;
        let after = (self.time * rate).floor() as i64;
        let cycle = (self.duration * rate).floor() as i64;
        let count = i64::from(self.wraps) * cycle - before + after;
        u32::try_from(count.max(0)).unwrap_or(u32::MAX)
    }
}

/// Looping simulation clock for one emitter.
#[derive(Debug, Clone)]
pub struct EmitterClock {
    time: f32,
    last_time: f32,
    duration: f32,
    looping: bool,
    frame_count: u64,
    cycles: u64,
}

impl EmitterClock {
    /// Create a clock at `t = 0`.
    pub fn new(duration: f32, looping: bool) -> Self {
        Self {
            time: 0.0,
            last_time: 0.0,
            duration,
            looping,
            frame_count: 0,
            cycles: 0,
        }
    }

    /// Step the clock by `dt` seconds.
    ///
    /// When looping and the time passes `duration`, it wraps with `%` rather
    /// than clamping, so a looping emitter restarts seamlessly.
    pub fn advance(&mut self, dt: f32) -> Tick {
        self.last_time = self.time;
        self.time += dt;
        self.frame_count += 1;

        let mut wraps = 0;
        if self.looping && self.duration > 0.0 && self.time > self.duration {
            let wrapped = self.time % self.duration;
            // Derive the wrap count from the remainder so the two always agree
            wraps = ((self.time - wrapped) / self.duration).round() as u32;
            self.time = wrapped;
            self.cycles += u64::from(wraps);
        }

        Tick {
            last_time: self.last_time,
            time: self.time,
            wraps,
            duration: self.duration,
        }
    }

    /// Current simulation time in seconds.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Simulation time before the latest step.
    #[inline]
    pub fn last_time(&self) -> f32 {
        self.last_time
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Steps taken since the last reset.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Completed loop cycles since the last reset.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Return to `t = 0`, keeping duration and loop settings.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.last_time = 0.0;
        self.frame_count = 0;
        self.cycles = 0;
    }
}

impl Default for EmitterClock {
    fn default() -> Self {
        Self::new(10.0, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_new() {
        let clock = EmitterClock::new(5.0, true);
        assert_eq!(clock.time(), 0.0);
        assert_eq!(clock.frame(), 0);
        assert!(clock.is_looping());
    }

    #[test]
    fn test_advance_accumulates_without_loop() {
        let mut clock = EmitterClock::new(1.0, false);
        for _ in 0..4 {
            clock.advance(0.5);
        }
        assert_eq!(clock.time(), 2.0);
        assert_eq!(clock.last_time(), 1.5);
        assert_eq!(clock.frame(), 4);
        assert_eq!(clock.cycles(), 0);
    }

    #[test]
    fn test_loop_wraps_not_clamps() {
        let mut clock = EmitterClock::new(10.0, true);
        clock.advance(9.5);
        let tick = clock.advance(1.0);
        assert_eq!(tick.wraps, 1);
        assert!((clock.time() - 0.5).abs() < 1e-5);
        assert_eq!(clock.cycles(), 1);
    }

    #[test]
    fn test_exact_duration_does_not_wrap() {
        let mut clock = EmitterClock::new(2.0, true);
        let tick = clock.advance(2.0);
        assert_eq!(tick.wraps, 0);
        assert_eq!(clock.time(), 2.0);
    }

    #[test]
    fn test_large_step_wraps_multiple_times() {
        let mut clock = EmitterClock::new(1.0, true);
        let tick = clock.advance(3.25);
        assert_eq!(tick.wraps, 3);
        assert!((tick.time - 0.25).abs() < 1e-5);
        // Three full cycles at 4/s plus one particle in the partial cycle
        assert_eq!(tick.emission_count(4.0), 13);
    }

    #[test]
    fn test_emission_count_boundaries() {
        let mut clock = EmitterClock::new(100.0, false);
        assert_eq!(clock.advance(0.5).emission_count(2.0), 1);
        assert_eq!(clock.advance(0.5).emission_count(2.0), 1);
        assert_eq!(clock.advance(0.1).emission_count(2.0), 0);
        assert_eq!(clock.advance(0.5).emission_count(2.0), 1);
    }

    #[test]
    fn test_emission_count_across_wrap() {
        let mut clock = EmitterClock::new(10.0, true);
        let mut total = 0;
        // Seven 1.5 s steps at 3/s, the last one crossing the loop boundary
        for _ in 0..7 {
            total += clock.advance(1.5).emission_count(3.0);
        }
        // 10.5 s elapsed: 30 in the first cycle, 1 in the second
        assert_eq!(total, 31);
    }

    #[test]
    fn test_zero_rate_emits_nothing() {
        let mut clock = EmitterClock::new(10.0, false);
        assert_eq!(clock.advance(5.0).emission_count(0.0), 0);
        assert_eq!(clock.advance(5.0).emission_count(-3.0), 0);
    }

    #[test]
    fn test_emission_count_saturates() {
        let mut clock = EmitterClock::new(10.0, false);
        let tick = clock.advance(1.0e10);
        assert_eq!(tick.emission_count(1.0), u32::MAX);
    }

    #[test]
    fn test_reset() {
        let mut clock = EmitterClock::new(10.0, true);
        clock.advance(4.0);
        clock.reset();
        assert_eq!(clock.time(), 0.0);
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.duration(), 10.0);
    }
}
