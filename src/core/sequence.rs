use crate::core::Frame;
use std::collections::{HashSet, VecDeque};

/// Maximum number of frames retained by a live sequence
pub const LIVE_CAPACITY: usize = 2000;

/// Ordered container of frames.
///
/// Replay sequences are built once from a batch of frames, sorted by
/// timestamp with duplicate timestamps removed, and never change again.
/// Live sequences are append-only with a fixed capacity; appending past the
/// capacity evicts the oldest frame. No two retained frames share a
/// timestamp in either kind.
#[derive(Debug, Clone, Default)]
pub struct FrameSequence {
    frames: VecDeque<Frame>,
    live: bool,
    capacity: usize,
    /// Timestamp keys of the retained frames, live sequences only
    retained: HashSet<u64>,
}

/// Hash key for a timestamp, with both zeroes mapped together
fn timestamp_key(timestamp: f64) -> u64 {
    if timestamp == 0.0 {
        0
    } else {
        timestamp.to_bits()
    }
}

impl FrameSequence {
    /// Build a replay sequence. Sorts by timestamp and keeps the first frame
    /// of every run of equal timestamps.
    pub fn replay(mut frames: Vec<Frame>) -> Self {
        frames.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        frames.dedup_by(|b, a| a.timestamp == b.timestamp);

        Self {
            capacity: frames.len(),
            frames: frames.into(),
            live: false,
            retained: HashSet::new(),
        }
    }

    /// Create an empty live sequence holding at most `capacity` frames
    pub fn live(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            live: true,
            capacity,
            retained: HashSet::with_capacity(capacity + 1),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Frame at `index`, or the last frame when the sequence is shorter
    pub fn clamped(&self, index: usize) -> Option<&Frame> {
        let last = self.frames.len().checked_sub(1)?;
        self.frames.get(index.min(last))
    }

    /// Timestamp of the frame at `index`
    pub fn timestamp(&self, index: usize) -> Option<f64> {
        self.frames.get(index).map(|f| f.timestamp)
    }

    pub fn first(&self) -> Option<&Frame> {
        self.frames.front()
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.back()
    }

    /// Data time covered by the sequence, in seconds
    pub fn duration(&self) -> f64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Append to a live sequence.
    ///
    /// Returns the evicted head frame when the capacity was exceeded. A frame
    /// whose timestamp is already retained is dropped and returned as-is,
    /// otherwise arrival order is kept. Appending to a replay sequence is
    /// refused the same way.
    pub fn push(&mut self, frame: Frame) -> Result<Option<Frame>, Frame> {
        if !self.live || !self.retained.insert(timestamp_key(frame.timestamp)) {
            return Err(frame);
        }

        self.frames.push_back(frame);
        if self.frames.len() > self.capacity {
            let evicted = self.frames.pop_front();
            if let Some(old) = &evicted {
                self.retained.remove(&timestamp_key(old.timestamp));
            }
            return Ok(evicted);
        }
        Ok(None)
    }

    /// Copy the retained frames into an owned vector
    pub fn to_vec(&self) -> Vec<Frame> {
        self.frames.iter().cloned().collect()
    }
}

impl From<Vec<Frame>> for FrameSequence {
    fn from(frames: Vec<Frame>) -> Self {
        Self::replay(frames)
    }
}
