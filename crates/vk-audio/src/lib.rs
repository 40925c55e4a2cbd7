//! Microphone capture and monophonic pitch detection.
//!
//! The pitch monitor runs as its own cancellable loop: it owns the
//! microphone exclusively while active and publishes a detected MIDI pitch
//! (or nothing) for display, without ever touching the note-input path.

mod cpal_backend;
mod monitor;
mod traits;
mod yin;

pub use cpal_backend::CpalMicInput;
pub use monitor::PitchMonitor;
pub use traits::AudioError;
pub use yin::{YinDetector, WINDOW_SIZE};
