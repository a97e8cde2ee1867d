use std::time::Instant;

/// Source of wall-clock readings, in seconds.
pub trait TimeSource {
    fn now_seconds(&mut self) -> f64;
}

/// Monotonic wall clock measured from construction.
#[derive(Debug, Clone)]
pub struct SystemTimeSource {
    start: Instant,
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_seconds(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Clock advanced by hand. Headless runs and tests drive frames with it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualTimeSource {
    now: f64,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, seconds: f64) {
        self.now += seconds;
    }

    pub fn set(&mut self, seconds: f64) {
        self.now = seconds;
    }
}

impl TimeSource for ManualTimeSource {
    fn now_seconds(&mut self) -> f64 {
        self.now
    }
}

/// Manual source that moves forward by a fixed amount on every reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStepTimeSource {
    now: f64,
    step: f64,
}

impl FixedStepTimeSource {
    pub fn new(step: f64) -> Self {
        Self { now: 0.0, step }
    }
}

impl TimeSource for FixedStepTimeSource {
    fn now_seconds(&mut self) -> f64 {
        let reading = self.now;
        self.now += self.step;
        reading
    }
}

/// Frame timing: per-frame delta, accumulated elapsed time and the discrete
/// tick derived from it.
///
/// The first [`advance`](Self::advance) only samples the source and yields a
/// zero delta. Readings that go backwards yield a zero delta so elapsed time
/// never decreases.
#[derive(Debug, Clone)]
pub struct FrameClock<T> {
    source: T,
    elapsed: f64,
    last_wall_time: Option<f64>,
    tick_seconds: f64,
}

impl<T: TimeSource> FrameClock<T> {
    pub fn new(source: T) -> Self {
        Self::with_tick_seconds(source, 1.0)
    }

    /// `tick_seconds` is the length of one tick; non-positive values fall back to one second.
    pub fn with_tick_seconds(source: T, tick_seconds: f64) -> Self {
        let tick_seconds = if tick_seconds > 0.0 && tick_seconds.is_finite() {
            tick_seconds
        } else {
            tracing::warn!(tick_seconds, "invalid tick length, using 1s");
            1.0
        };
        Self {
            source,
            elapsed: 0.0,
            last_wall_time: None,
            tick_seconds,
        }
    }

    /// Sample the source and return the seconds since the previous call.
    pub fn advance(&mut self) -> f32 {
        let now = self.source.now_seconds();
        let dt = match self.last_wall_time {
            Some(last) if now > last => now - last,
            _ => 0.0,
        };
        self.last_wall_time = Some(now);
        self.elapsed += dt;
        dt as f32
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Whole ticks elapsed: `floor(elapsed / tick_seconds)`.
    pub fn tick(&self) -> u64 {
        (self.elapsed / self.tick_seconds).floor() as u64
    }

    pub fn tick_seconds(&self) -> f64 {
        self.tick_seconds
    }

    pub fn source(&self) -> &T {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut T {
        &mut self.source
    }
}
