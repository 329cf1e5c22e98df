use crate::config::PlaybackSettings;
use crate::core::{Frame, FrameSequence};
use crate::error::SlotError;
use crate::playback::advancer::{Advance, FrameAdvancer};
use crate::playback::clock::{TimeSource, VirtualClock};
use crate::playback::live::LiveHandle;
use crate::playback::slots::{Slot, SlotSet};
use crate::playback::{PlaybackEvent, PlaybackMode, PlaybackState};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Playback scheduler for up to four synchronized slots
///
/// All cursor and clock changes happen through `&mut self`: either in
/// [`tick`](Self::tick), called once per display refresh, or in the control
/// methods. Live streams only ever append to their [`LiveHandle`].
pub struct PlaybackEngine {
    slots: SlotSet,
    state: PlaybackState,
    clock: VirtualClock,
    advancer: FrameAdvancer,
    /// Slot the clock was last anchored on
    driver: Option<usize>,
    time: Arc<dyn TimeSource>,
    settings: PlaybackSettings,
    visible: bool,
    subscribers: Vec<Sender<PlaybackEvent>>,
}

impl PlaybackEngine {
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self::with_settings(time, PlaybackSettings::default())
    }

    pub fn with_settings(time: Arc<dyn TimeSource>, settings: PlaybackSettings) -> Self {
        Self {
            slots: SlotSet::new(),
            state: PlaybackState {
                mode: PlaybackMode::Paused,
                speed: settings.default_speed,
                current_index: 0,
            },
            clock: VirtualClock::new(),
            advancer: FrameAdvancer::new(settings.gap_threshold),
            driver: None,
            time,
            settings,
            visible: true,
            subscribers: Vec::new(),
        }
    }

    /// Get current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn mode(&self) -> PlaybackMode {
        self.state.mode
    }

    pub fn speed(&self) -> f64 {
        self.state.speed
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.state.mode == PlaybackMode::Playing
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// Longest sequence across all occupied slots
    pub fn max_length(&self) -> usize {
        self.slots.max_length()
    }

    /// Index of the slot driving timing
    pub fn anchor_slot(&self) -> Option<usize> {
        self.slots.anchor()
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    /// Frame a slot shows for the shared cursor
    pub fn current_frame(&self, slot: usize) -> Option<Frame> {
        self.slots.get(slot)?.frame(self.state.current_index)
    }

    /// Cursor position as a fraction of the longest sequence
    pub fn progress(&self) -> f64 {
        let span = self.max_length().saturating_sub(1).max(1);
        self.state.current_index as f64 / span as f64
    }

    /// Data time the clock wants on screen right now
    pub fn target_data_time(&self) -> f64 {
        self.clock.target_data_time(self.time.now(), self.state.speed)
    }

    /// Receive playback events. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Create a live buffer sized from the settings
    pub fn new_live_handle(&self) -> LiveHandle {
        LiveHandle::with_capacity(self.settings.live_capacity)
    }

    /// Load a recorded sequence into a slot
    pub fn occupy_slot(&mut self, index: usize, name: &str, sequence: FrameSequence) -> Result<(), SlotError> {
        info!("Slot {} <- '{}' ({} frames)", index, name, sequence.len());
        self.place(index, Slot::replay(name, sequence))
    }

    /// Attach a stream buffer to a slot
    pub fn occupy_live_slot(&mut self, index: usize, name: &str, handle: LiveHandle) -> Result<(), SlotError> {
        info!("Slot {} <- live stream '{}'", index, name);
        self.place(index, Slot::live(name, handle))
    }

    fn place(&mut self, index: usize, slot: Slot) -> Result<(), SlotError> {
        let previous_anchor = self.slots.anchor();
        if let Some(old) = self.slots.occupy(index, slot)? {
            if let Some(handle) = old.live_handle() {
                handle.mark_disconnected();
            }
        }
        self.after_slot_change(previous_anchor, index);
        Ok(())
    }

    /// Empty a slot. A live slot's buffer stops accepting frames.
    pub fn clear_slot(&mut self, index: usize) -> Result<(), SlotError> {
        let previous_anchor = self.slots.anchor();
        if let Some(old) = self.slots.clear(index)? {
            info!("Slot {} cleared ('{}')", index, old.display_name);
            if let Some(handle) = old.live_handle() {
                handle.mark_disconnected();
            }
        }
        self.after_slot_change(previous_anchor, index);
        Ok(())
    }

    /// Stop a slot's stream but keep its frames on screen
    pub fn disconnect_slot(&mut self, index: usize) {
        if let Some(handle) = self.slots.get(index).and_then(Slot::live_handle) {
            handle.mark_disconnected();
        }
        self.leave_live_if_idle();
    }

    /// Home action: drop every slot and return to a paused, empty timeline
    pub fn reset(&mut self) {
        for (_, slot) in self.slots.occupied() {
            if let Some(handle) = slot.live_handle() {
                handle.mark_disconnected();
            }
        }
        self.slots.clear_all();
        self.driver = None;
        self.state.current_index = 0;
        self.set_mode(PlaybackMode::Paused);
    }

    fn after_slot_change(&mut self, previous_anchor: Option<usize>, changed: usize) {
        self.clamp_index();

        if self.max_length() == 0 && self.state.mode == PlaybackMode::Playing {
            self.set_mode(PlaybackMode::Paused);
        }
        self.leave_live_if_idle();

        // timing only moves when the slot driving it changed
        let anchor = self.slots.anchor();
        let driver_changed = anchor != previous_anchor || anchor == Some(changed) || self.driver == Some(changed);
        if self.is_playing() && driver_changed {
            self.reanchor_at_cursor();
        }
    }

    fn leave_live_if_idle(&mut self) {
        if self.state.mode == PlaybackMode::Live && !self.slots.has_streaming() {
            self.clamp_index();
            self.set_mode(PlaybackMode::Paused);
        }
    }

    /// Start playback. Returns false when there is nothing to play or a
    /// stream is attached.
    pub fn play(&mut self) -> bool {
        match self.state.mode {
            PlaybackMode::Playing => return true,
            PlaybackMode::Live => return false,
            PlaybackMode::Paused => {}
        }

        let max_length = self.max_length();
        if max_length == 0 {
            debug!("Play ignored: no frames loaded");
            return false;
        }
        if self.slots.has_streaming() {
            debug!("Play ignored: live stream attached");
            return false;
        }

        if self.state.current_index >= max_length - 1 {
            self.state.current_index = 0;
        }
        self.set_mode(PlaybackMode::Playing);
        self.reanchor_at_cursor();
        true
    }

    /// Pause playback. Live mode is left only by clearing its streams.
    pub fn pause(&mut self) {
        if self.is_playing() {
            self.set_mode(PlaybackMode::Paused);
        }
    }

    pub fn toggle(&mut self) -> bool {
        if self.is_playing() {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    /// Change playback speed without moving the visible position
    pub fn set_speed(&mut self, speed: f64) {
        let Some(speed) = self.settings.clamp_speed(speed) else {
            warn!("Ignoring invalid playback speed {}", speed);
            return;
        };

        if self.is_playing() {
            let now = self.time.now();
            let data_time = self.clock.target_data_time(now, self.state.speed);
            self.clock.reanchor(data_time, now);
        }
        debug!("Speed {} -> {}", self.state.speed, speed);
        self.state.speed = speed;
    }

    /// Jump the shared cursor, clamped to the timeline
    pub fn seek(&mut self, index: i64) {
        self.state.current_index = self.clamp(index);
        debug!("Seek to {}", self.state.current_index);
        if self.is_playing() {
            self.reanchor_at_cursor();
        }
    }

    /// Move the cursor by `delta` frames and pause. Ignored while live.
    pub fn step(&mut self, delta: i64) {
        if self.state.mode == PlaybackMode::Live {
            return;
        }
        let target = (self.state.current_index as i64).saturating_add(delta);
        self.state.current_index = self.clamp(target);
        self.set_mode(PlaybackMode::Paused);
    }

    /// Foreground visibility. Playback pauses when hidden and does not
    /// catch up when shown again.
    pub fn set_visible(&mut self, visible: bool) {
        if !visible && self.is_playing() {
            debug!("Auto-paused on visibility loss");
            self.pause();
        }
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Advance playback to the current wall time. Call once per display
    /// refresh. Returns the cursor after the tick.
    pub fn tick(&mut self) -> usize {
        self.slots.refresh_anchor();

        if self.state.mode != PlaybackMode::Live {
            if let Some(slot) = self.slots.warmed_live_slot(self.settings.live_warmup_frames) {
                info!("Slot {} warmed up, following live stream", slot);
                self.set_mode(PlaybackMode::Live);
                self.emit(PlaybackEvent::EnteredLive { slot });
            }
        }

        match self.state.mode {
            PlaybackMode::Paused => {}
            PlaybackMode::Live => {
                self.state.current_index = self.max_length().saturating_sub(1);
            }
            PlaybackMode::Playing => self.advance(),
        }
        self.state.current_index
    }

    fn advance(&mut self) {
        let max_length = self.max_length();
        if max_length == 0 {
            self.set_mode(PlaybackMode::Paused);
            return;
        }
        let index = self.state.current_index;
        let Some(driver) = self.slots.timing_slot(index) else {
            return;
        };

        let now = self.time.now();
        if self.driver != Some(driver) {
            // the anchor ran out, continue on the longer slot's own time base
            debug!("Timing continues on slot {}", driver);
            self.reanchor_on(driver, index, now);
        }
        let Some(slot) = self.slots.get(driver) else {
            return;
        };

        let speed = self.state.speed;
        let target = self.clock.target_data_time(now, speed);
        let outcome = slot.with_sequence(|seq| self.advancer.advance(seq, index, target, speed));
        let next = outcome.index().max(index);

        if let Advance::GapSkipped { gap, .. } = outcome {
            if let Some(data_time) = slot.timestamp(next) {
                self.clock.reanchor(data_time, now);
            }
            info!("Skipped {:.1}s gap", gap);
            self.emit(PlaybackEvent::GapSkipped { duration: gap });
        }

        self.state.current_index = next;
        if outcome.exhausted() && next >= max_length - 1 {
            self.set_mode(PlaybackMode::Paused);
            self.emit(PlaybackEvent::ReachedEnd);
        }
    }

    /// Anchor the clock at the timing slot's frame under the cursor
    fn reanchor_at_cursor(&mut self) {
        let index = self.state.current_index;
        if let Some(slot) = self.slots.timing_slot(index) {
            self.reanchor_on(slot, index, self.time.now());
        }
    }

    fn reanchor_on(&mut self, slot: usize, index: usize, now: f64) {
        let data_time = self
            .slots
            .get(slot)
            .and_then(|s| s.with_sequence(|seq| seq.clamped(index).map(|f| f.timestamp)));
        if let Some(data_time) = data_time {
            self.clock.reanchor(data_time, now);
        }
        self.driver = Some(slot);
    }

    fn clamp(&self, index: i64) -> usize {
        let last = self.max_length().saturating_sub(1) as i64;
        index.clamp(0, last) as usize
    }

    fn clamp_index(&mut self) {
        self.state.current_index = self.clamp(self.state.current_index as i64);
    }

    fn set_mode(&mut self, mode: PlaybackMode) {
        let from = self.state.mode;
        if from == mode {
            return;
        }
        debug!("Playback {:?} -> {:?}", from, mode);
        self.state.mode = mode;
        self.emit(PlaybackEvent::ModeChanged { from, to: mode });
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::clock::ManualClock;

    fn sequence(ts: &[f64]) -> FrameSequence {
        FrameSequence::replay(ts.iter().map(|t| Frame::at(*t)).collect())
    }

    fn engine() -> (PlaybackEngine, ManualClock) {
        let clock = ManualClock::new(0.0);
        (PlaybackEngine::new(Arc::new(clock.clone())), clock)
    }

    fn drain(rx: &Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_gap_skip_scenario() {
        let (mut engine, clock) = engine();
        engine.occupy_slot(0, "log", sequence(&[0.0, 1.0, 1.2, 4.0, 4.3])).unwrap();
        let rx = engine.subscribe();
        assert!(engine.play());

        clock.set(0.5);
        assert_eq!(engine.tick(), 0);
        clock.set(1.0);
        assert_eq!(engine.tick(), 1);
        clock.set(1.1);
        assert_eq!(engine.tick(), 1);
        clock.set(1.2);
        assert_eq!(engine.tick(), 2);

        // stalled on the dropout
        clock.set(2.5);
        assert_eq!(engine.tick(), 2);
        drain(&rx);

        clock.set(2.75);
        assert_eq!(engine.tick(), 3);
        let anchor = engine.clock().anchor();
        assert_eq!(anchor.data_time, 4.0);
        assert_eq!(anchor.wall_time, 2.75);

        let events = drain(&rx);
        assert_eq!(events.len(), 1);
        match events[0] {
            PlaybackEvent::GapSkipped { duration } => assert!((duration - 2.8).abs() < 1e-9),
            ref other => panic!("unexpected event {:?}", other),
        }

        // continues from the new anchor
        clock.set(3.2);
        assert_eq!(engine.tick(), 4);
        assert_eq!(engine.mode(), PlaybackMode::Paused);
        assert!(drain(&rx).contains(&PlaybackEvent::ReachedEnd));
    }

    #[test]
    fn test_monotonic_replay() {
        let (mut engine, clock) = engine();
        let ts: Vec<f64> = (0..200).map(|i| i as f64 * 0.1 + if i > 100 { 5.0 } else { 0.0 }).collect();
        engine.occupy_slot(0, "log", sequence(&ts)).unwrap();
        engine.set_speed(3.0);
        engine.play();

        let mut last = 0;
        for _ in 0..2000 {
            clock.advance(1.0 / 60.0);
            let index = engine.tick();
            assert!(index >= last);
            last = index;
        }
        assert_eq!(last, 199);
        assert_eq!(engine.mode(), PlaybackMode::Paused);
    }

    #[test]
    fn test_gap_wait_at_speed() {
        for speed in [0.5, 1.0, 2.0] {
            let (mut engine, clock) = engine();
            engine.occupy_slot(0, "log", sequence(&[0.0, 100.0, 101.0])).unwrap();
            engine.set_speed(speed);
            engine.play();

            // data time must pass threshold / speed, which takes that / speed of wall time
            let wait = crate::playback::GAP_THRESHOLD / speed / speed;
            clock.set(wait * 0.98);
            assert_eq!(engine.tick(), 0, "speed {}", speed);
            clock.set(wait * 1.02);
            assert_eq!(engine.tick(), 1, "speed {}", speed);
        }
    }

    #[test]
    fn test_speed_change_is_continuous() {
        let (mut engine, clock) = engine();
        engine.occupy_slot(0, "log", sequence(&(0..100).map(|i| i as f64).collect::<Vec<_>>())).unwrap();
        engine.play();

        clock.set(10.0);
        engine.tick();
        let before = engine.target_data_time();
        engine.set_speed(4.0);
        let after = engine.target_data_time();
        assert!((before - after).abs() < 1e-9);

        clock.set(11.0);
        assert!((engine.target_data_time() - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_seek_clamps() {
        let (mut engine, _clock) = engine();
        engine.seek(5);
        assert_eq!(engine.current_index(), 0);

        engine.occupy_slot(0, "log", sequence(&[0.0, 1.0, 2.0, 3.0])).unwrap();
        engine.seek(-7);
        assert_eq!(engine.current_index(), 0);
        engine.seek(2);
        assert_eq!(engine.current_index(), 2);
        engine.seek(400);
        assert_eq!(engine.current_index(), 3);
    }

    #[test]
    fn test_seek_while_playing_reanchors() {
        let (mut engine, clock) = engine();
        engine.occupy_slot(0, "log", sequence(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        engine.play();
        clock.set(1.5);
        assert_eq!(engine.tick(), 1);

        engine.seek(4);
        assert_eq!(engine.clock().anchor().data_time, 4.0);
        assert_eq!(engine.clock().anchor().wall_time, 1.5);
        clock.set(1.6);
        assert_eq!(engine.tick(), 4);

        // backward seeks are allowed
        engine.seek(1);
        clock.set(1.7);
        assert_eq!(engine.tick(), 1);
    }

    #[test]
    fn test_step_pauses_without_reanchor() {
        let (mut engine, clock) = engine();
        engine.occupy_slot(0, "log", sequence(&[0.0, 1.0, 2.0])).unwrap();
        engine.play();
        let anchor = engine.clock().anchor();

        clock.set(0.2);
        engine.step(1);
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.mode(), PlaybackMode::Paused);
        assert_eq!(engine.clock().anchor(), anchor);

        engine.step(10);
        assert_eq!(engine.current_index(), 2);
        engine.step(-10);
        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn test_play_at_end_restarts() {
        let (mut engine, clock) = engine();
        engine.occupy_slot(0, "log", sequence(&[10.0, 11.0, 12.0])).unwrap();
        engine.seek(2);
        clock.set(5.0);
        assert!(engine.play());
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.clock().anchor().data_time, 10.0);
        assert_eq!(engine.clock().anchor().wall_time, 5.0);
    }

    #[test]
    fn test_play_on_empty_is_noop() {
        let (mut engine, _clock) = engine();
        assert!(!engine.play());
        engine.occupy_slot(1, "empty", FrameSequence::default()).unwrap();
        assert!(!engine.play());
        assert_eq!(engine.mode(), PlaybackMode::Paused);
    }

    #[test]
    fn test_visibility_pause_does_not_catch_up() {
        let (mut engine, clock) = engine();
        engine.occupy_slot(0, "log", sequence(&(0..20).map(|i| i as f64).collect::<Vec<_>>())).unwrap();
        engine.play();
        clock.set(2.0);
        assert_eq!(engine.tick(), 2);

        engine.set_visible(false);
        assert_eq!(engine.mode(), PlaybackMode::Paused);
        clock.set(60.0);
        assert_eq!(engine.tick(), 2);

        engine.set_visible(true);
        engine.play();
        clock.set(61.0);
        assert_eq!(engine.tick(), 3);
    }

    #[test]
    fn test_non_anchor_slots_follow_cursor() {
        let (mut engine, clock) = engine();
        engine.occupy_slot(0, "anchor", sequence(&[0.0, 1.0, 2.0, 3.0, 4.0])).unwrap();
        engine.occupy_slot(1, "short", sequence(&[50.0, 51.0])).unwrap();
        engine.occupy_slot(2, "long", sequence(&(0..8).map(|i| 100.0 + i as f64).collect::<Vec<_>>())).unwrap();
        assert_eq!(engine.anchor_slot(), Some(0));
        assert_eq!(engine.max_length(), 8);

        engine.play();
        clock.set(3.0);
        assert_eq!(engine.tick(), 3);
        assert_eq!(engine.current_frame(0).unwrap().timestamp, 3.0);
        assert_eq!(engine.current_frame(1).unwrap().timestamp, 51.0);
        assert_eq!(engine.current_frame(2).unwrap().timestamp, 103.0);
        assert!(engine.current_frame(3).is_none());

        // the anchor running out does not end playback while a slot has more
        clock.set(10.0);
        assert_eq!(engine.tick(), 4);
        assert_eq!(engine.mode(), PlaybackMode::Playing);

        // the longest slot's timestamps take over from the cursor
        assert_eq!(engine.tick(), 4);
        assert_eq!(engine.clock().anchor().data_time, 104.0);
        clock.set(11.0);
        assert_eq!(engine.tick(), 5);
        assert_eq!(engine.anchor_slot(), Some(0));
        clock.set(13.0);
        assert_eq!(engine.tick(), 7);
        assert_eq!(engine.mode(), PlaybackMode::Paused);
    }

    #[test]
    fn test_short_anchor_plays_to_end_of_longest() {
        let (mut engine, clock) = engine();
        engine.occupy_slot(0, "short", sequence(&[0.0, 1.0])).unwrap();
        engine.occupy_slot(1, "long", sequence(&[10.0, 11.0, 12.0, 13.0, 14.0])).unwrap();
        let rx = engine.subscribe();
        engine.play();

        for i in 1..=1000 {
            clock.set(i as f64);
            engine.tick();
        }
        assert_eq!(engine.current_index(), 4);
        assert_eq!(engine.mode(), PlaybackMode::Paused);
        assert!(drain(&rx).contains(&PlaybackEvent::ReachedEnd));
    }

    #[test]
    fn test_seek_past_short_anchor_uses_longest_timing() {
        let (mut engine, clock) = engine();
        engine.occupy_slot(0, "short", sequence(&[0.0, 1.0])).unwrap();
        engine.occupy_slot(1, "long", sequence(&[10.0, 11.0, 12.0, 13.0, 14.0])).unwrap();
        engine.play();

        clock.set(0.5);
        engine.seek(2);
        assert_eq!(engine.clock().anchor().data_time, 12.0);
        clock.set(1.5);
        assert_eq!(engine.tick(), 3);
    }

    #[test]
    fn test_clearing_non_anchor_keeps_cursor_and_speed() {
        let (mut engine, clock) = engine();
        engine.occupy_slot(0, "a", sequence(&(0..10).map(|i| i as f64).collect::<Vec<_>>())).unwrap();
        engine.occupy_slot(1, "b", sequence(&(0..10).map(|i| i as f64).collect::<Vec<_>>())).unwrap();
        engine.set_speed(2.0);
        engine.play();
        clock.set(2.0);
        assert_eq!(engine.tick(), 4);
        let anchor = engine.clock().anchor();

        engine.clear_slot(1).unwrap();
        assert_eq!(engine.current_index(), 4);
        assert_eq!(engine.speed(), 2.0);
        assert_eq!(engine.anchor_slot(), Some(0));
        assert_eq!(engine.clock().anchor(), anchor);
        assert!(engine.is_playing());

        engine.occupy_slot(3, "c", sequence(&[0.0])).unwrap();
        assert_eq!(engine.clock().anchor(), anchor);
    }

    #[test]
    fn test_slot_out_of_range() {
        let (mut engine, _clock) = engine();
        assert!(engine.occupy_slot(4, "x", sequence(&[1.0])).is_err());
        assert!(engine.clear_slot(9).is_err());
    }

    #[test]
    fn test_live_warmup_and_follow() {
        let (mut engine, _clock) = engine();
        let handle = engine.new_live_handle();
        engine.occupy_live_slot(0, "stream", handle.clone()).unwrap();
        let rx = engine.subscribe();

        for i in 1..=5 {
            handle.append(Frame::at(i as f64));
            engine.tick();
            assert_eq!(engine.mode(), PlaybackMode::Paused);
        }
        // play is refused while a stream is attached
        assert!(!engine.play());

        handle.append(Frame::at(6.0));
        assert_eq!(engine.tick(), 5);
        assert_eq!(engine.mode(), PlaybackMode::Live);
        assert!(drain(&rx).contains(&PlaybackEvent::EnteredLive { slot: 0 }));

        handle.append(Frame::at(7.0));
        assert_eq!(engine.current_index(), 5);
        assert_eq!(engine.tick(), 6);
        assert_eq!(engine.current_frame(0).unwrap().timestamp, 7.0);

        // stepping is ignored and pause does not leave live mode
        engine.step(-1);
        engine.pause();
        assert_eq!(engine.mode(), PlaybackMode::Live);
    }

    #[test]
    fn test_live_follows_longest_live_slot() {
        let (mut engine, _clock) = engine();
        let a = engine.new_live_handle();
        let b = engine.new_live_handle();
        engine.occupy_live_slot(0, "a", a.clone()).unwrap();
        engine.occupy_live_slot(1, "b", b.clone()).unwrap();

        for i in 0..6 {
            a.append(Frame::at(i as f64 + 1.0));
        }
        for i in 0..9 {
            b.append(Frame::at(i as f64 + 1.0));
        }
        assert_eq!(engine.tick(), 8);
        assert_eq!(engine.current_frame(0).unwrap().timestamp, 6.0);
        assert_eq!(engine.current_frame(1).unwrap().timestamp, 9.0);
    }

    #[test]
    fn test_clearing_live_returns_to_paused() {
        let (mut engine, _clock) = engine();
        engine.occupy_slot(0, "log", sequence(&[1.0, 2.0, 3.0])).unwrap();
        let handle = engine.new_live_handle();
        engine.occupy_live_slot(1, "stream", handle.clone()).unwrap();
        for i in 0..10 {
            handle.append(Frame::at(100.0 + i as f64));
        }
        engine.tick();
        assert_eq!(engine.mode(), PlaybackMode::Live);
        assert_eq!(engine.current_index(), 9);

        engine.clear_slot(1).unwrap();
        assert_eq!(engine.mode(), PlaybackMode::Paused);
        assert_eq!(engine.current_index(), 2);
        assert!(!handle.is_connected());

        // nothing streaming any more, so playback is allowed again
        assert!(engine.play());
    }

    #[test]
    fn test_disconnect_keeps_tail_and_leaves_live() {
        let (mut engine, _clock) = engine();
        let handle = engine.new_live_handle();
        engine.occupy_live_slot(0, "stream", handle.clone()).unwrap();
        for i in 0..8 {
            handle.append(Frame::at(i as f64 + 1.0));
        }
        engine.tick();
        assert_eq!(engine.mode(), PlaybackMode::Live);

        handle.set_error("link down");
        assert_eq!(engine.slot(0).unwrap().stream_error().as_deref(), Some("link down"));
        // transport errors alone do not leave live mode
        engine.tick();
        assert_eq!(engine.mode(), PlaybackMode::Live);

        engine.disconnect_slot(0);
        assert_eq!(engine.mode(), PlaybackMode::Paused);
        assert_eq!(engine.max_length(), 8);
        engine.tick();
        assert_eq!(engine.mode(), PlaybackMode::Paused);

        engine.seek(0);
        assert_eq!(engine.current_frame(0).unwrap().timestamp, 1.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut engine, _clock) = engine();
        engine.occupy_slot(0, "log", sequence(&[1.0, 2.0])).unwrap();
        let handle = engine.new_live_handle();
        engine.occupy_live_slot(1, "stream", handle.clone()).unwrap();
        engine.seek(1);

        engine.reset();
        assert_eq!(engine.max_length(), 0);
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.mode(), PlaybackMode::Paused);
        assert!(!handle.is_connected());
    }

    #[test]
    fn test_invalid_speed_ignored() {
        let (mut engine, _clock) = engine();
        engine.set_speed(0.0);
        engine.set_speed(-2.0);
        engine.set_speed(f64::INFINITY);
        assert_eq!(engine.speed(), 1.0);
        engine.set_speed(5.0);
        assert_eq!(engine.speed(), 5.0);
    }

    #[test]
    fn test_progress() {
        let (mut engine, _clock) = engine();
        assert_eq!(engine.progress(), 0.0);
        engine.occupy_slot(0, "log", sequence(&[0.0, 1.0, 2.0, 3.0, 4.0])).unwrap();
        engine.seek(2);
        assert_eq!(engine.progress(), 0.5);
    }
}
