//! Core IR types for the virtuoso-keys instrument.
//!
//! This crate defines the note-event representation shared by every layer:
//! input normalization produces held notes, the recorder produces timelines,
//! and the analysis functions (chord naming, scale highlighting) are pure
//! functions over these types.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chord;
mod held;
mod note;
mod scale;
mod timeline;

pub use chord::{detect_chord, ChordLabel, ChordQuality};
pub use held::{HeldNote, HeldNoteSet, MAX_PITCHES};
pub use note::{
    frequency_to_pitch, note_name, pitch_class, pitch_octave, pitch_to_frequency, KeyRange,
    NOTE_NAMES,
};
pub use scale::{scale_pitches, Mode};
pub use timeline::{NoteEvent, Timeline};
