//! Note-event capture, timing, and playback scheduling.
//!
//! Unifies pointer, MIDI, and detected-pitch input into one canonical event
//! stream, records performances against a shared transport clock, and replays
//! them with cooperative cancellation.

mod event_queue;
mod normalizer;
mod recorder;
mod scheduler;
mod tone;
mod transport;

pub use event_queue::{PlaybackAction, PlaybackEvent, PlaybackQueue};
pub use normalizer::{
    decode_midi, InputNormalizer, InputSource, KeyChange, NoteMessage, POINTER_VELOCITY,
};
pub use recorder::Recorder;
pub use scheduler::{build_queue, Playback, COMPLETION_MARGIN};
pub use tone::{control_to_db, CollectingTone, InstrumentKind, NullTone, ToneCall, ToneGenerator};
pub use transport::Transport;
