use crate::core::FrameSequence;

/// Data-time gap between consecutive frames that counts as a sensor dropout
pub const GAP_THRESHOLD: f64 = 1.5;

/// Result of one advancement step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advance {
    /// Forward scan finished at `index`
    Moved { index: usize, exhausted: bool },
    /// Jumped over a dropout onto `index`. The clock must be re-anchored at
    /// that frame's timestamp.
    GapSkipped { index: usize, gap: f64, exhausted: bool },
}

impl Advance {
    pub fn index(&self) -> usize {
        match *self {
            Advance::Moved { index, .. } | Advance::GapSkipped { index, .. } => index,
        }
    }

    /// The last frame of the sequence has been reached
    pub fn exhausted(&self) -> bool {
        match *self {
            Advance::Moved { exhausted, .. } | Advance::GapSkipped { exhausted, .. } => exhausted,
        }
    }
}

/// Moves a cursor forward through a sequence to match a target data time
#[derive(Debug, Clone, Copy)]
pub struct FrameAdvancer {
    gap_threshold: f64,
}

impl Default for FrameAdvancer {
    fn default() -> Self {
        Self::new(GAP_THRESHOLD)
    }
}

impl FrameAdvancer {
    pub fn new(gap_threshold: f64) -> Self {
        Self { gap_threshold }
    }

    pub fn gap_threshold(&self) -> f64 {
        self.gap_threshold
    }

    /// Advance from `index` toward `target` data time.
    ///
    /// Only the immediate next frame is checked for a gap. A gap longer than
    /// the threshold is skipped once `target` has passed the current frame's
    /// timestamp by more than `threshold / speed`. At most one gap is skipped
    /// per call.
    ///
    /// Otherwise the cursor moves forward while the next frame's timestamp
    /// is not after `target`. The cursor never moves backwards.
    pub fn advance(&self, sequence: &FrameSequence, index: usize, target: f64, speed: f64) -> Advance {
        let Some(last) = sequence.len().checked_sub(1) else {
            return Advance::Moved { index: 0, exhausted: true };
        };
        let mut idx = index.min(last);

        if idx < last {
            let (Some(current), Some(next)) = (sequence.timestamp(idx), sequence.timestamp(idx + 1)) else {
                return Advance::Moved { index: idx, exhausted: false };
            };
            let gap = next - current;
            if gap > self.gap_threshold && target > current + self.gap_threshold / speed {
                return Advance::GapSkipped {
                    index: idx + 1,
                    gap,
                    exhausted: idx + 1 >= last,
                };
            }
        }

        while idx < last && sequence.timestamp(idx + 1).is_some_and(|ts| ts <= target) {
            idx += 1;
        }

        Advance::Moved {
            index: idx,
            exhausted: idx >= last,
        }
    }
}
