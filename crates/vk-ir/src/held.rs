//! The set of currently-sounding pitches.

use arrayvec::ArrayVec;

/// Number of distinct MIDI pitches, and thus the polyphony ceiling.
pub const MAX_PITCHES: usize = 128;

/// Onset data for a pitch that is currently down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeldNote {
    /// Transport time at which the key went down
    pub onset: f64,
    /// Normalized velocity in [0, 1]
    pub velocity: f32,
}

/// Currently-sounding pitches, at most one entry per pitch.
///
/// Pitch-indexed table rather than a map: lookups are constant-time and the
/// structure never allocates after construction.
#[derive(Clone, Debug)]
pub struct HeldNoteSet {
    slots: [Option<HeldNote>; MAX_PITCHES],
    count: usize,
}

impl HeldNoteSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { slots: [None; MAX_PITCHES], count: 0 }
    }

    /// Returns true if `pitch` is currently held.
    pub fn is_held(&self, pitch: u8) -> bool {
        self.slots[pitch as usize].is_some()
    }

    /// Insert or overwrite the entry for `pitch`.
    pub fn press(&mut self, pitch: u8, velocity: f32, onset: f64) {
        let slot = &mut self.slots[pitch as usize];
        if slot.is_none() {
            self.count += 1;
        }
        *slot = Some(HeldNote { onset, velocity });
    }

    /// Remove the entry for `pitch`, returning it if present.
    ///
    /// Releasing a pitch that is not held succeeds silently; out-of-order or
    /// partially-dropped source messages make that a normal occurrence.
    pub fn release(&mut self, pitch: u8) -> Option<HeldNote> {
        let removed = self.slots[pitch as usize].take();
        if removed.is_some() {
            self.count -= 1;
        }
        removed
    }

    /// Number of held pitches.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no pitch is held.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Release everything.
    pub fn clear(&mut self) {
        self.slots = [None; MAX_PITCHES];
        self.count = 0;
    }

    /// Read-only snapshot of held pitches in ascending pitch order.
    pub fn pitches(&self) -> ArrayVec<u8, MAX_PITCHES> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(p, slot)| slot.as_ref().map(|_| p as u8))
            .collect()
    }

    /// Snapshot of held pitches with their onset data, ascending pitch order.
    pub fn entries(&self) -> ArrayVec<(u8, HeldNote), MAX_PITCHES> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(p, slot)| slot.as_ref().map(|h| (p as u8, *h)))
            .collect()
    }
}

impl Default for HeldNoteSet {
    fn default() -> Self {
        Self::new()
    }
}
