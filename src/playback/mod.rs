pub mod advancer;
pub mod clock;
pub mod engine;
pub mod live;
pub mod slots;

pub use advancer::{Advance, FrameAdvancer, GAP_THRESHOLD};
pub use clock::{ClockAnchor, ManualClock, SystemClock, TimeSource, VirtualClock};
pub use engine::PlaybackEngine;
pub use live::{LiveBuffer, LiveHandle, LIVE_WARMUP_FRAMES};
pub use slots::{Slot, SlotSet, SlotSource, MAX_SLOTS};

/// Playback mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Paused,
    Playing,
    /// Following the newest frame of the live slots
    Live,
}

/// Snapshot of the shared playback cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub mode: PlaybackMode,
    /// 1.0 = real-time, 2.0 = 2x speed
    pub speed: f64,
    /// Global cursor shared by every slot
    pub current_index: usize,
}

/// Notifications for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A dropout of `duration` data-seconds was jumped over
    GapSkipped { duration: f64 },
    /// Playback stopped on the last frame
    ReachedEnd,
    /// A stream warmed up and playback now follows it
    EnteredLive { slot: usize },
    ModeChanged { from: PlaybackMode, to: PlaybackMode },
}
