//! Bounded live ingestion buffer.
//!
//! A [`LiveHandle`] is the only piece of playback state shared with the
//! stream side. The transport task may append, annotate errors and mark the
//! stream disconnected at any time; it never touches the cursor or the clock.

use crate::core::{Frame, FrameSequence, LIVE_CAPACITY};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Frames a live slot must hold before playback switches to live mode
pub const LIVE_WARMUP_FRAMES: usize = 5;

/// Capped frame store fed by a stream
#[derive(Debug)]
pub struct LiveBuffer {
    sequence: FrameSequence,
    connected: bool,
    stream_error: Option<String>,
    latest_raw: Option<String>,
    total_appended: u64,
    evicted: u64,
    dropped: u64,
}

impl LiveBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            sequence: FrameSequence::live(capacity),
            connected: true,
            stream_error: None,
            latest_raw: None,
            total_appended: 0,
            evicted: 0,
            dropped: 0,
        }
    }

    pub fn sequence(&self) -> &FrameSequence {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn stream_error(&self) -> Option<&str> {
        self.stream_error.as_deref()
    }

    pub fn latest_raw(&self) -> Option<&str> {
        self.latest_raw.as_deref()
    }

    pub fn total_appended(&self) -> u64 {
        self.total_appended
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Frames refused as duplicates or received after disconnect
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn append(&mut self, frame: Frame) -> bool {
        if !self.connected {
            self.dropped += 1;
            return false;
        }

        match self.sequence.push(frame) {
            Ok(evicted) => {
                self.total_appended += 1;
                if evicted.is_some() {
                    self.evicted += 1;
                }
                true
            }
            Err(frame) => {
                debug!("Dropped duplicate live frame at {}", frame.timestamp);
                self.dropped += 1;
                false
            }
        }
    }
}

/// Shared handle to a [`LiveBuffer`]. Clones refer to the same buffer.
#[derive(Debug, Clone)]
pub struct LiveHandle {
    inner: Arc<Mutex<LiveBuffer>>,
}

impl Default for LiveHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveHandle {
    pub fn new() -> Self {
        Self::with_capacity(LIVE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LiveBuffer::new(capacity))),
        }
    }

    /// Lock the buffer for reading.
    ///
    /// A panic on the stream side cannot leave the buffer half written, so a
    /// poisoned lock is recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, LiveBuffer> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Push a frame to the tail, evicting the oldest past capacity.
    /// Returns false when the frame was not kept.
    pub fn append(&self, frame: Frame) -> bool {
        self.lock().append(frame)
    }

    /// Remember the most recent raw payload, parsed or not
    pub fn record_raw(&self, payload: &str) {
        self.lock().latest_raw = Some(payload.to_string());
    }

    /// Annotate the slot with a transport error. Buffered frames stay.
    pub fn set_error(&self, message: impl Into<String>) {
        self.lock().stream_error = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.lock().stream_error = None;
    }

    /// Stop accepting frames. What is buffered stays inspectable.
    pub fn mark_disconnected(&self) {
        let mut buffer = self.lock();
        if buffer.connected {
            buffer.connected = false;
            info!("Live stream disconnected with {} frames buffered", buffer.len());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clone of the frame at `index`, clamped to the newest frame
    pub fn frame(&self, index: usize) -> Option<Frame> {
        self.lock().sequence.clamped(index).cloned()
    }

    /// Copy of the buffered frames as a replay sequence
    pub fn snapshot(&self) -> FrameSequence {
        FrameSequence::replay(self.lock().sequence.to_vec())
    }
}
