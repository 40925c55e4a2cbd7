//! Performance recording: staging note-ons and finalizing on note-off.

use vk_ir::{NoteEvent, Timeline};

/// A staged note-on awaiting its note-off.
#[derive(Clone, Copy, Debug)]
struct Pending {
    onset: f64,
    velocity: f32,
}

/// Idle → Recording → Idle state machine over the normalized event stream.
///
/// Times are taken on the shared transport clock; each session re-zeros at
/// its own start, so recorded onsets always begin near zero.
#[derive(Debug)]
pub struct Recorder {
    /// Zero reference of the active session, None when idle
    zero: Option<f64>,
    pending: [Option<Pending>; 128],
    timeline: Timeline,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            zero: None,
            pending: [None; 128],
            timeline: Timeline::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.zero.is_some()
    }

    /// Begin a session: the timeline buffer is cleared and `now` becomes the
    /// session's zero reference.
    pub fn start(&mut self, now: f64) {
        self.timeline.clear();
        self.pending = [None; 128];
        self.zero = Some(now);
    }

    /// Stage a note-on. Ignored when idle.
    pub fn note_on(&mut self, pitch: u8, velocity: f32, now: f64) {
        let Some(zero) = self.zero else { return };
        self.pending[pitch as usize] = Some(Pending { onset: now - zero, velocity });
    }

    /// Finalize a staged note into the timeline.
    ///
    /// A note-off with no staged note-on is dropped: the key was already
    /// down before the session started, or the on-message never arrived.
    pub fn note_off(&mut self, pitch: u8, now: f64) {
        let Some(zero) = self.zero else { return };
        let Some(pending) = self.pending[pitch as usize].take() else { return };
        let duration = (now - zero) - pending.onset;
        self.timeline.push(NoteEvent::new(pitch, pending.velocity, pending.onset, duration.max(0.0)));
    }

    /// End the session.
    ///
    /// Notes still held at stop are auto-closed with duration running to the
    /// stop instant, so nothing the performer played is lost.
    pub fn stop(&mut self, now: f64) {
        let Some(zero) = self.zero.take() else { return };
        let stop_time = now - zero;
        for pitch in 0..self.pending.len() {
            if let Some(pending) = self.pending[pitch].take() {
                let duration = (stop_time - pending.onset).max(0.0);
                self.timeline.push(NoteEvent::new(pitch as u8, pending.velocity, pending.onset, duration));
            }
        }
    }

    /// The most recently completed (or in-progress) timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Copy of the timeline for handoff to playback or export.
    pub fn take_snapshot(&self) -> Timeline {
        self.timeline.clone()
    }
}
