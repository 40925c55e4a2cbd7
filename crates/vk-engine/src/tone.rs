//! The tone-generator seam.
//!
//! Synthesis itself lives outside this system; components talk to it through
//! the [`ToneGenerator`] trait only. Concrete instrument kinds are plain
//! configuration selected at runtime, not separate code paths.

/// Selectable instrument kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InstrumentKind {
    #[default]
    Default,
    Am,
    Fm,
    Membrane,
    Pluck,
}

impl InstrumentKind {
    pub const ALL: [InstrumentKind; 5] = [
        InstrumentKind::Default,
        InstrumentKind::Am,
        InstrumentKind::Fm,
        InstrumentKind::Membrane,
        InstrumentKind::Pluck,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(InstrumentKind::Default),
            "am" => Some(InstrumentKind::Am),
            "fm" => Some(InstrumentKind::Fm),
            "membrane" => Some(InstrumentKind::Membrane),
            "pluck" => Some(InstrumentKind::Pluck),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            InstrumentKind::Default => "default",
            InstrumentKind::Am => "am",
            InstrumentKind::Fm => "fm",
            InstrumentKind::Membrane => "membrane",
            InstrumentKind::Pluck => "pluck",
        }
    }

    /// Plucked voices decay on their own and accept no explicit release.
    pub const fn has_release(&self) -> bool {
        !matches!(self, InstrumentKind::Pluck)
    }
}

/// Map a 0-100 volume control value to decibels in [-40, 0].
pub fn control_to_db(value: u8) -> f32 {
    let v = value.min(100) as f32;
    -40.0 + (v / 100.0) * 40.0
}

/// Interface every tone generator implements.
///
/// `time` arguments are seconds on the caller's transport so generators with
/// internal lookahead can schedule sample-accurately; immediate-mode
/// generators may ignore them.
pub trait ToneGenerator: Send {
    fn attack(&mut self, pitch: u8, velocity: f32, time: f64);
    fn release(&mut self, pitch: u8, time: f64);
    /// Attack plus a pre-scheduled release `duration` seconds later.
    fn attack_release(&mut self, pitch: u8, duration: f64, time: f64, velocity: f32);
    /// Immediately silence every active voice.
    fn all_notes_off(&mut self);
    fn set_instrument(&mut self, kind: InstrumentKind);
    fn set_sustain_release(&mut self, seconds: f64);
    fn set_volume(&mut self, db: f32);
}

/// A tone generator that does nothing. Placeholder when no audio backend is
/// wired up.
#[derive(Debug, Default)]
pub struct NullTone;

impl ToneGenerator for NullTone {
    fn attack(&mut self, _pitch: u8, _velocity: f32, _time: f64) {}
    fn release(&mut self, _pitch: u8, _time: f64) {}
    fn attack_release(&mut self, _pitch: u8, _duration: f64, _time: f64, _velocity: f32) {}
    fn all_notes_off(&mut self) {}
    fn set_instrument(&mut self, _kind: InstrumentKind) {}
    fn set_sustain_release(&mut self, _seconds: f64) {}
    fn set_volume(&mut self, _db: f32) {}
}

/// One recorded call into a [`CollectingTone`].
#[derive(Clone, Debug, PartialEq)]
pub enum ToneCall {
    Attack { pitch: u8, velocity: f32, time: f64 },
    Release { pitch: u8, time: f64 },
    AttackRelease { pitch: u8, duration: f64, time: f64, velocity: f32 },
    AllNotesOff,
    SetInstrument(InstrumentKind),
    SetSustainRelease(f64),
    SetVolume(f32),
}

/// Records every call made into it. Test double for scheduler and
/// controller tests.
#[derive(Debug, Default)]
pub struct CollectingTone {
    pub calls: Vec<ToneCall>,
}

impl CollectingTone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attacks(&self) -> Vec<(u8, f64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ToneCall::Attack { pitch, time, .. } => Some((*pitch, *time)),
                _ => None,
            })
            .collect()
    }

    pub fn releases(&self) -> Vec<(u8, f64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ToneCall::Release { pitch, time } => Some((*pitch, *time)),
                _ => None,
            })
            .collect()
    }
}

impl ToneGenerator for CollectingTone {
    fn attack(&mut self, pitch: u8, velocity: f32, time: f64) {
        self.calls.push(ToneCall::Attack { pitch, velocity, time });
    }

    fn release(&mut self, pitch: u8, time: f64) {
        self.calls.push(ToneCall::Release { pitch, time });
    }

    fn attack_release(&mut self, pitch: u8, duration: f64, time: f64, velocity: f32) {
        self.calls.push(ToneCall::AttackRelease { pitch, duration, time, velocity });
    }

    fn all_notes_off(&mut self) {
        self.calls.push(ToneCall::AllNotesOff);
    }

    fn set_instrument(&mut self, kind: InstrumentKind) {
        self.calls.push(ToneCall::SetInstrument(kind));
    }

    fn set_sustain_release(&mut self, seconds: f64) {
        self.calls.push(ToneCall::SetSustainRelease(seconds));
    }

    fn set_volume(&mut self, db: f32) {
        self.calls.push(ToneCall::SetVolume(db));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_names_round_trip() {
        for kind in InstrumentKind::ALL {
            assert_eq!(InstrumentKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(InstrumentKind::from_name("theremin"), None);
    }

    #[test]
    fn pluck_has_no_release() {
        assert!(!InstrumentKind::Pluck.has_release());
        assert!(InstrumentKind::Default.has_release());
    }

    #[test]
    fn volume_control_maps_to_db_range() {
        assert_eq!(control_to_db(0), -40.0);
        assert_eq!(control_to_db(100), 0.0);
        assert_eq!(control_to_db(50), -20.0);
        // Clamped above 100
        assert_eq!(control_to_db(200), 0.0);
    }
}
