//! Finalized note events and the recorded timeline.

use alloc::vec::Vec;

/// A finalized note: onset and duration are both known.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteEvent {
    /// MIDI pitch 0-127
    pub pitch: u8,
    /// Normalized velocity in [0, 1]
    pub velocity: f32,
    /// Seconds on the transport clock, relative to the recording's zero
    pub onset: f64,
    /// Seconds the note sounded, >= 0
    pub duration: f64,
}

impl NoteEvent {
    pub fn new(pitch: u8, velocity: f32, onset: f64, duration: f64) -> Self {
        Self { pitch, velocity, onset, duration }
    }

    /// Transport time at which the note ends.
    pub fn end(&self) -> f64 {
        self.onset + self.duration
    }
}

/// One recording session's worth of finalized note events.
///
/// Events are appended in note-off completion order, which is not onset
/// order when notes overlap. Consumers must schedule by each event's own
/// `onset`, never by list position.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    events: Vec<NoteEvent>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append a finalized event.
    pub fn push(&mut self, event: NoteEvent) {
        self.events.push(event);
    }

    /// All events in completion order.
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Number of finalized events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Latest end time over all events, 0 when empty.
    pub fn tail(&self) -> f64 {
        self.events.iter().map(|e| e.end()).fold(0.0, f64::max)
    }
}
