//! Ordered queue of playback actions.

use core::ops::Range;

/// What a scheduled playback event does when it fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackAction {
    Attack { pitch: u8, velocity: f32 },
    Release { pitch: u8 },
}

/// A tone-generator action scheduled at a transport time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackEvent {
    /// Seconds from the playback session's zero
    pub time: f64,
    pub action: PlaybackAction,
}

impl PlaybackEvent {
    /// Sort key: time first, releases before attacks at equal times so a
    /// repeated pitch re-triggers rather than being cut by the previous
    /// instance's release.
    fn key(&self) -> (f64, u8) {
        let rank = match self.action {
            PlaybackAction::Release { .. } => 0,
            PlaybackAction::Attack { .. } => 1,
        };
        (self.time, rank)
    }
}

/// A time-sorted queue of playback events.
///
/// During playback, events are consumed via a cursor that advances forward
/// without removing elements, so the drain path never allocates.
#[derive(Clone, Debug, Default)]
pub struct PlaybackQueue {
    events: Vec<PlaybackEvent>,
    /// Next event index to fire (advances during playback)
    cursor: usize,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event, keeping the queue sorted by (time, action rank).
    /// Equal keys keep insertion order.
    pub fn push(&mut self, event: PlaybackEvent) {
        let key = event.key();
        let pos = self.events.partition_point(|e| {
            let k = e.key();
            k.0 < key.0 || (k.0 == key.0 && k.1 <= key.1)
        });
        self.events.insert(pos, event);
    }

    /// Index range of events due at or before `time`, advancing the cursor
    /// past them. Index into the queue with [`PlaybackQueue::get`].
    pub fn drain_due(&mut self, time: f64) -> Range<usize> {
        let start = self.cursor;
        while self.cursor < self.events.len() && self.events[self.cursor].time <= time {
            self.cursor += 1;
        }
        start..self.cursor
    }

    /// Get an event by index (for use with `drain_due` ranges).
    pub fn get(&self, index: usize) -> Option<&PlaybackEvent> {
        self.events.get(index)
    }

    /// Time of the next unfired event, if any remain.
    pub fn next_due(&self) -> Option<f64> {
        self.events.get(self.cursor).map(|e| e.time)
    }

    /// Returns true once every event has been drained.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.events.len()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
