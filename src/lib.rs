//! Synchronized playback of recorded and live MOT (moving object tracking)
//! frame sequences across up to four side-by-side slots.

pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod playback;
pub mod stream;

pub use config::PlaybackSettings;
pub use playback::{PlaybackEngine, PlaybackEvent, PlaybackMode, PlaybackState};
