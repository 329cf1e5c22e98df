use crate::core::{Frame, FrameSequence};
use crate::error::SlotError;
use crate::playback::live::LiveHandle;

/// Number of side-by-side views
pub const MAX_SLOTS: usize = 4;

/// Frames backing a slot
#[derive(Debug, Clone)]
pub enum SlotSource {
    /// Recorded sequence, fixed once loaded
    Replay(FrameSequence),
    /// Stream fed buffer, grows until disconnect
    Live(LiveHandle),
}

/// One view's frame sequence
#[derive(Debug, Clone)]
pub struct Slot {
    pub display_name: String,
    source: SlotSource,
}

impl Slot {
    pub fn replay(display_name: &str, sequence: FrameSequence) -> Self {
        Self {
            display_name: display_name.to_string(),
            source: SlotSource::Replay(sequence),
        }
    }

    pub fn live(display_name: &str, handle: LiveHandle) -> Self {
        Self {
            display_name: display_name.to_string(),
            source: SlotSource::Live(handle),
        }
    }

    pub fn source(&self) -> &SlotSource {
        &self.source
    }

    pub fn is_live(&self) -> bool {
        matches!(self.source, SlotSource::Live(_))
    }

    /// Live slot whose stream is still connected
    pub fn is_streaming(&self) -> bool {
        self.live_handle().is_some_and(LiveHandle::is_connected)
    }

    pub fn live_handle(&self) -> Option<&LiveHandle> {
        match &self.source {
            SlotSource::Live(handle) => Some(handle),
            SlotSource::Replay(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match &self.source {
            SlotSource::Replay(seq) => seq.len(),
            SlotSource::Live(handle) => handle.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against the slot's sequence, holding the live lock if needed
    pub fn with_sequence<R>(&self, f: impl FnOnce(&FrameSequence) -> R) -> R {
        match &self.source {
            SlotSource::Replay(seq) => f(seq),
            SlotSource::Live(handle) => f(handle.lock().sequence()),
        }
    }

    /// Frame shown for the shared cursor: `sequence[min(index, len - 1)]`
    pub fn frame(&self, index: usize) -> Option<Frame> {
        self.with_sequence(|seq| seq.clamped(index).cloned())
    }

    pub fn timestamp(&self, index: usize) -> Option<f64> {
        self.with_sequence(|seq| seq.timestamp(index))
    }

    /// Advisory transport error for live slots
    pub fn stream_error(&self) -> Option<String> {
        self.live_handle()
            .and_then(|handle| handle.lock().stream_error().map(str::to_string))
    }
}

/// The fixed set of slots plus the choice of timing anchor.
///
/// The anchor is the lowest occupied, non-empty slot. Once chosen it is kept
/// for as long as it stays occupied and non-empty, so other slots coming
/// and going never change which sequence drives timing.
#[derive(Debug, Default)]
pub struct SlotSet {
    slots: [Option<Slot>; MAX_SLOTS],
    anchor: Option<usize>,
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(index: usize) -> Result<(), SlotError> {
        if index >= MAX_SLOTS {
            return Err(SlotError::OutOfRange { index, max: MAX_SLOTS - 1 });
        }
        Ok(())
    }

    /// Place `slot` at `index`, returning whatever was there
    pub fn occupy(&mut self, index: usize, slot: Slot) -> Result<Option<Slot>, SlotError> {
        Self::check(index)?;
        let previous = self.slots[index].replace(slot);
        if self.anchor == Some(index) {
            // the anchor's sequence was swapped out from under it
            self.anchor = None;
        }
        self.refresh_anchor();
        Ok(previous)
    }

    pub fn clear(&mut self, index: usize) -> Result<Option<Slot>, SlotError> {
        Self::check(index)?;
        let previous = self.slots[index].take();
        self.refresh_anchor();
        Ok(previous)
    }

    pub fn clear_all(&mut self) {
        self.slots = Default::default();
        self.anchor = None;
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Occupied slots with their indices
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (i, s)))
    }

    pub fn is_empty(&self) -> bool {
        self.occupied().next().is_none()
    }

    /// Any slot still receiving from a stream
    pub fn has_streaming(&self) -> bool {
        self.occupied().any(|(_, slot)| slot.is_streaming())
    }

    /// Longest sequence across every occupied slot
    pub fn max_length(&self) -> usize {
        self.occupied().map(|(_, slot)| slot.len()).max().unwrap_or(0)
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn anchor_slot(&self) -> Option<&Slot> {
        self.anchor.and_then(|i| self.get(i))
    }

    /// Re-evaluate the anchor. Live buffers can fill after a slot is
    /// occupied, so this runs on every tick as well as on slot changes.
    pub fn refresh_anchor(&mut self) -> Option<usize> {
        let still_valid = self
            .anchor
            .and_then(|i| self.get(i))
            .is_some_and(|slot| !slot.is_empty());

        if !still_valid {
            let found = self
                .occupied()
                .find(|(_, slot)| !slot.is_empty())
                .map(|(i, _)| i);
            self.anchor = found;
        }
        self.anchor
    }

    /// Slot whose timestamps drive playback at `cursor`.
    ///
    /// This is the anchor while it has frames past the cursor. Once the
    /// anchor runs out, the longest slot takes over so frames only a longer
    /// slot holds are still played.
    pub fn timing_slot(&self, cursor: usize) -> Option<usize> {
        let anchor = self.anchor?;
        if cursor + 1 < self.get(anchor).map_or(0, Slot::len) {
            return Some(anchor);
        }

        let mut longest: Option<(usize, usize)> = None;
        for (i, slot) in self.occupied() {
            let len = slot.len();
            if longest.map_or(true, |(_, best)| len > best) {
                longest = Some((i, len));
            }
        }
        match longest {
            Some((i, len)) if cursor + 1 < len => Some(i),
            _ => Some(anchor),
        }
    }

    /// First streaming slot holding more than `warmup` frames
    pub fn warmed_live_slot(&self, warmup: usize) -> Option<usize> {
        self.occupied()
            .find(|(_, slot)| slot.is_streaming() && slot.len() > warmup)
            .map(|(i, _)| i)
    }
}
