//! Pitch naming, frequency conversion, and keyboard range presets.

use alloc::format;
use alloc::string::String;

/// Pitch-class names in semitone order from C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Reduce a MIDI pitch to its pitch class (0-11).
pub const fn pitch_class(pitch: u8) -> u8 {
    pitch % 12
}

/// Scientific octave number for a MIDI pitch (60 = C4).
pub const fn pitch_octave(pitch: u8) -> i8 {
    (pitch / 12) as i8 - 1
}

/// Display name for a MIDI pitch, e.g. "C4" or "F#3".
pub fn note_name(pitch: u8) -> String {
    format!("{}{}", NOTE_NAMES[pitch_class(pitch) as usize], pitch_octave(pitch))
}

/// Convert a frequency in Hz to the nearest MIDI pitch (A4 = 440 Hz = 69).
///
/// Returns `None` for non-positive frequencies or results outside 0-127.
pub fn frequency_to_pitch(freq: f64) -> Option<u8> {
    if freq <= 0.0 {
        return None;
    }
    let midi = 69.0 + 12.0 * libm::log2(freq / 440.0);
    let rounded = libm::round(midi);
    if (0.0..=127.0).contains(&rounded) {
        Some(rounded as u8)
    } else {
        None
    }
}

/// Convert a MIDI pitch to its equal-temperament frequency in Hz.
pub fn pitch_to_frequency(pitch: u8) -> f64 {
    440.0 * libm::pow(2.0, (pitch as f64 - 69.0) / 12.0)
}

/// Inclusive MIDI pitch range of a keyboard layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyRange {
    /// Lowest playable pitch
    pub low: u8,
    /// Highest playable pitch
    pub high: u8,
}

impl KeyRange {
    /// 37-key layout, C3 to C6.
    pub const KEYS_37: KeyRange = KeyRange { low: 48, high: 84 };
    /// 61-key layout, C2 to C7.
    pub const KEYS_61: KeyRange = KeyRange { low: 36, high: 96 };
    /// 88-key layout, A0 to C8.
    pub const KEYS_88: KeyRange = KeyRange { low: 21, high: 108 };

    /// Returns true if `pitch` falls within the range.
    pub const fn contains(&self, pitch: u8) -> bool {
        pitch >= self.low && pitch <= self.high
    }

    /// Number of keys in the range.
    pub const fn key_count(&self) -> u8 {
        self.high - self.low + 1
    }
}
