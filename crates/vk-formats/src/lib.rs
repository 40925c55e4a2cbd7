//! Interchange formats for virtuoso-keys.
//!
//! Encodes a recorded timeline as a single-track Standard MIDI File.

mod smf;

pub use smf::{timeline_to_smf, write_smf, TEMPO_USEC_PER_QUARTER, TICKS_PER_QUARTER};
