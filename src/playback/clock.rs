use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Source of wall-clock time, in seconds
///
/// The engine never reads the system clock directly, so tests can drive it
/// with a [`ManualClock`].
pub trait TimeSource: Send + Sync {
    /// Current wall time in seconds. Must never go backwards.
    fn now(&self) -> f64;
}

/// Wall time measured from the moment the clock was created
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven time source. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Pairing of a wall time with the data time being shown at that instant
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockAnchor {
    pub wall_time: f64,
    pub data_time: f64,
}

/// Maps elapsed wall time onto data time at a given speed.
///
/// Has to be re-anchored whenever playback starts, the speed changes or the
/// position is moved while playing; otherwise the next target jumps.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    anchor: ClockAnchor,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reanchor(&mut self, data_time: f64, wall_time: f64) {
        self.anchor = ClockAnchor { wall_time, data_time };
    }

    pub fn anchor(&self) -> ClockAnchor {
        self.anchor
    }

    /// Data time that should be on screen at `wall_now`
    pub fn target_data_time(&self, wall_now: f64, speed: f64) -> f64 {
        self.anchor.data_time + (wall_now - self.anchor.wall_time) * speed
    }
}
