//! Input normalization: pointer, MIDI, and detected-pitch sources into one
//! canonical note-on/off stream.

use vk_ir::HeldNoteSet;

/// Fixed velocity for pointer/touch presses, which carry no intrinsic
/// velocity of their own (100 on the MIDI scale).
pub const POINTER_VELOCITY: f32 = 100.0 / 127.0;

/// Where a raw note signal came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Pointer,
    Midi,
    PitchDetector,
}

/// A canonical note message, identical in shape regardless of source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteMessage {
    pub pitch: u8,
    /// Normalized velocity in [0, 1]; meaningful only when `is_on`
    pub velocity: f32,
    pub is_on: bool,
    pub source: InputSource,
}

impl NoteMessage {
    pub fn on(pitch: u8, velocity: f32, source: InputSource) -> Self {
        Self { pitch, velocity, is_on: true, source }
    }

    pub fn off(pitch: u8, source: InputSource) -> Self {
        Self { pitch, velocity: 0.0, is_on: false, source }
    }
}

/// Decode a raw 3-byte MIDI channel-voice message into a canonical note
/// message.
///
/// High nibble 0x9 is Note-On, 0x8 is Note-Off. A Note-On with velocity 0 is
/// a Note-Off per the MIDI protocol. Anything else (aftertouch, CC, pitch
/// bend, short reads) is ignored.
pub fn decode_midi(data: &[u8]) -> Option<NoteMessage> {
    if data.len() < 3 {
        return None;
    }
    let (status, pitch, velocity) = (data[0], data[1], data[2]);
    if pitch > 127 {
        return None;
    }
    match status & 0xF0 {
        0x90 if velocity > 0 => Some(NoteMessage::on(
            pitch,
            (velocity.min(127)) as f32 / 127.0,
            InputSource::Midi,
        )),
        0x90 | 0x80 => Some(NoteMessage::off(pitch, InputSource::Midi)),
        _ => None,
    }
}

/// What a normalized message actually did to the instrument state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyChange {
    /// The pitch went from up to down and sound should be triggered
    Pressed { pitch: u8, velocity: f32 },
    /// The pitch went from down to up and sound should be released
    Released { pitch: u8 },
}

/// Funnel for all note input: owns the held-note set and enforces
/// idempotency.
///
/// A second Note-On for an already-held pitch, from any source, is a no-op
/// with no re-trigger; a Note-Off for an already-released pitch is likewise
/// a no-op. Processing is synchronous and never touches I/O.
#[derive(Debug, Default)]
pub struct InputNormalizer {
    held: HeldNoteSet,
}

impl InputNormalizer {
    pub fn new() -> Self {
        Self { held: HeldNoteSet::new() }
    }

    /// Apply a canonical message at transport time `now`.
    ///
    /// Returns the resulting state change, or `None` when the message was
    /// redundant and nothing should sound.
    pub fn apply(&mut self, msg: NoteMessage, now: f64) -> Option<KeyChange> {
        if msg.is_on {
            if self.held.is_held(msg.pitch) {
                return None;
            }
            self.held.press(msg.pitch, msg.velocity, now);
            Some(KeyChange::Pressed { pitch: msg.pitch, velocity: msg.velocity })
        } else {
            self.held.release(msg.pitch)?;
            Some(KeyChange::Released { pitch: msg.pitch })
        }
    }

    /// The held-note set for analysis and display.
    pub fn held(&self) -> &HeldNoteSet {
        &self.held
    }

    /// Forcibly release everything (panic button, playback stop).
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_note_on_decodes_with_scaled_velocity() {
        let msg = decode_midi(&[0x90, 60, 127]).unwrap();
        assert!(msg.is_on);
        assert_eq!(msg.pitch, 60);
        assert_eq!(msg.velocity, 1.0);
        assert_eq!(msg.source, InputSource::Midi);
    }

    #[test]
    fn midi_note_on_any_channel() {
        assert!(decode_midi(&[0x95, 60, 100]).unwrap().is_on);
        assert!(!decode_midi(&[0x83, 60, 0]).unwrap().is_on);
    }

    #[test]
    fn midi_note_on_velocity_zero_is_note_off() {
        let msg = decode_midi(&[0x90, 60, 0]).unwrap();
        assert!(!msg.is_on);
        assert_eq!(msg.pitch, 60);
    }

    #[test]
    fn non_note_messages_are_ignored() {
        assert_eq!(decode_midi(&[0xB0, 64, 127]), None); // control change
        assert_eq!(decode_midi(&[0xE0, 0, 64]), None); // pitch bend
        assert_eq!(decode_midi(&[0x90, 60]), None); // truncated
    }

    #[test]
    fn double_note_on_is_single_press() {
        let mut norm = InputNormalizer::new();
        let change = norm.apply(NoteMessage::on(60, 0.8, InputSource::Midi), 0.0);
        assert_eq!(change, Some(KeyChange::Pressed { pitch: 60, velocity: 0.8 }));

        // Same pitch again from a different source: no re-trigger
        let change = norm.apply(NoteMessage::on(60, POINTER_VELOCITY, InputSource::Pointer), 0.1);
        assert_eq!(change, None);
        assert_eq!(norm.held().len(), 1);
    }

    #[test]
    fn note_off_without_note_on_is_noop() {
        let mut norm = InputNormalizer::new();
        assert_eq!(norm.apply(NoteMessage::off(60, InputSource::Midi), 0.0), None);
        assert!(norm.held().is_empty());
    }

    #[test]
    fn press_then_release_round_trip() {
        let mut norm = InputNormalizer::new();
        norm.apply(NoteMessage::on(64, 0.5, InputSource::Pointer), 1.0);
        let change = norm.apply(NoteMessage::off(64, InputSource::Pointer), 1.5);
        assert_eq!(change, Some(KeyChange::Released { pitch: 64 }));
        assert!(norm.held().is_empty());
    }
}
