//! Headless controller for the virtuoso-keys instrument.
//!
//! Provides a unified API over input normalization, recording, playback,
//! analysis, pitch monitoring, and export that any frontend can share.
//! Recording and playback are kept mutually exclusive here, by explicit
//! state checks rather than locks.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use vk_audio::{AudioError, PitchMonitor};
use vk_engine::{
    control_to_db, decode_midi, InputNormalizer, InputSource, InstrumentKind, KeyChange,
    NoteMessage, Playback, Recorder, ToneGenerator, Transport, POINTER_VELOCITY,
};
use vk_ir::{detect_chord, scale_pitches, ChordLabel, KeyRange, Mode, Timeline};

// Re-export common types so frontends don't need the leaf crates directly.
pub use vk_engine::{CollectingTone, NullTone};
pub use vk_ir::{note_name, NoteEvent};

/// User-facing operation failures. All are locally recoverable; none
/// disturb existing state.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("cannot start {attempted} while {active} is active")]
    ConflictingOperation {
        attempted: &'static str,
        active: &'static str,
    },
    #[error("nothing recorded yet")]
    EmptyTimeline,
    #[error("device unavailable: {0}")]
    DeviceUnavailable(#[from] AudioError),
}

/// The instrument's single point of control.
pub struct Controller {
    transport: Arc<Transport>,
    normalizer: InputNormalizer,
    recorder: Recorder,
    tone: Arc<Mutex<dyn ToneGenerator>>,
    instrument: InstrumentKind,
    playback: Option<Playback>,
    monitor: Option<PitchMonitor>,
}

impl Controller {
    pub fn new(tone: Arc<Mutex<dyn ToneGenerator>>) -> Self {
        Self {
            transport: Arc::new(Transport::new()),
            normalizer: InputNormalizer::new(),
            recorder: Recorder::new(),
            tone,
            instrument: InstrumentKind::Default,
            playback: None,
            monitor: None,
        }
    }

    // --- Note input (all sources funnel through here) ---

    /// Canonical note-on from any source.
    pub fn note_on(&mut self, pitch: u8, velocity: f32, source: InputSource) {
        self.handle(NoteMessage::on(pitch, velocity, source));
    }

    /// Canonical note-off from any source.
    pub fn note_off(&mut self, pitch: u8, source: InputSource) {
        self.handle(NoteMessage::off(pitch, source));
    }

    /// Pointer/touch press, which carries no velocity of its own.
    pub fn press_key(&mut self, pitch: u8) {
        self.note_on(pitch, POINTER_VELOCITY, InputSource::Pointer);
    }

    pub fn release_key(&mut self, pitch: u8) {
        self.note_off(pitch, InputSource::Pointer);
    }

    /// Raw 3-byte MIDI channel-voice message from a controller device.
    /// Non-note messages are ignored.
    pub fn midi_message(&mut self, data: &[u8]) {
        if let Some(msg) = decode_midi(data) {
            self.handle(msg);
        }
    }

    fn handle(&mut self, msg: NoteMessage) {
        let now = self.transport.now();
        match self.normalizer.apply(msg, now) {
            Some(KeyChange::Pressed { pitch, velocity }) => {
                if let Ok(mut tone) = self.tone.lock() {
                    tone.attack(pitch, velocity, now);
                }
                self.recorder.note_on(pitch, velocity, now);
            }
            Some(KeyChange::Released { pitch }) => {
                if self.instrument.has_release() {
                    if let Ok(mut tone) = self.tone.lock() {
                        tone.release(pitch, now);
                    }
                }
                self.recorder.note_off(pitch, now);
            }
            // Redundant message; sound untouched, nothing recorded
            None => {}
        }
    }

    /// Pitches currently sounding, ascending.
    pub fn held_pitches(&self) -> Vec<u8> {
        self.normalizer.held().pitches().to_vec()
    }

    // --- Analysis ---

    /// Name the chord formed by the held notes, if any.
    pub fn chord(&self) -> Option<ChordLabel> {
        detect_chord(&self.normalizer.held().pitches())
    }

    /// Scale-degree pitches to highlight for the given root and mode.
    pub fn scale_highlight(&self, root_class: u8, mode: Mode, range: KeyRange) -> Vec<u8> {
        scale_pitches(root_class, mode, range)
    }

    // --- Recording ---

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Begin a recording session on a fresh zero reference.
    pub fn start_recording(&mut self) -> Result<(), ControlError> {
        self.reap_playback();
        if self.is_playing() {
            return Err(ControlError::ConflictingOperation {
                attempted: "recording",
                active: "playback",
            });
        }
        if self.recorder.is_recording() {
            return Err(ControlError::ConflictingOperation {
                attempted: "recording",
                active: "recording",
            });
        }
        self.transport.retain();
        self.recorder.start(self.transport.now());
        log::info!("recording started");
        Ok(())
    }

    /// End the session, returning how many notes it captured.
    pub fn stop_recording(&mut self) -> usize {
        if !self.recorder.is_recording() {
            return self.recorder.timeline().len();
        }
        self.recorder.stop(self.transport.now());
        self.transport.release();
        let count = self.recorder.timeline().len();
        log::info!("recording stopped, {} notes", count);
        count
    }

    /// Copy of the last completed (or in-progress) timeline.
    pub fn timeline(&self) -> Timeline {
        self.recorder.take_snapshot()
    }

    // --- Playback ---

    pub fn is_playing(&self) -> bool {
        self.playback.as_ref().is_some_and(|p| p.is_active())
    }

    /// Replay the recorded timeline. `on_done` fires exactly once on normal
    /// completion and never after an explicit stop.
    pub fn play(&mut self, on_done: Box<dyn FnOnce() + Send>) -> Result<(), ControlError> {
        self.reap_playback();
        if self.recorder.is_recording() {
            return Err(ControlError::ConflictingOperation {
                attempted: "playback",
                active: "recording",
            });
        }
        if self.is_playing() {
            return Err(ControlError::ConflictingOperation {
                attempted: "playback",
                active: "playback",
            });
        }
        let timeline = self.recorder.take_snapshot();
        if timeline.is_empty() {
            return Err(ControlError::EmptyTimeline);
        }

        self.transport.retain();
        self.playback = Some(Playback::start(
            &timeline,
            self.transport.clone(),
            self.tone.clone(),
            on_done,
        ));
        log::info!("playback started, {} notes", timeline.len());
        Ok(())
    }

    /// Cancel playback: silence everything, fire no further callback.
    pub fn stop_playback(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            playback.stop();
            self.transport.release();
            log::info!("playback stopped");
        }
    }

    /// Drop a playback handle whose session already ran to completion.
    fn reap_playback(&mut self) {
        if self.playback.as_ref().is_some_and(|p| !p.is_active()) {
            self.playback = None;
            self.transport.release();
        }
    }

    // --- Export ---

    /// Encode the recorded timeline as Standard MIDI File bytes.
    pub fn export_midi(&self) -> Result<Vec<u8>, ControlError> {
        let timeline = self.recorder.timeline();
        if timeline.is_empty() {
            return Err(ControlError::EmptyTimeline);
        }
        Ok(vk_formats::timeline_to_smf(timeline))
    }

    // --- Pitch monitor ---

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_some()
    }

    /// Acquire the microphone and start publishing detected pitches.
    pub fn start_pitch_monitor(&mut self) -> Result<(), ControlError> {
        if self.monitor.is_some() {
            return Err(ControlError::DeviceUnavailable(AudioError::Busy));
        }
        match PitchMonitor::start() {
            Ok(monitor) => {
                self.monitor = Some(monitor);
                log::info!("pitch monitor enabled");
                Ok(())
            }
            Err(err) => {
                log::warn!("pitch monitor unavailable: {}", err);
                Err(err.into())
            }
        }
    }

    /// Cancel the monitor loop and release the microphone.
    pub fn stop_pitch_monitor(&mut self) {
        if let Some(mut monitor) = self.monitor.take() {
            monitor.stop();
            log::info!("pitch monitor disabled");
        }
    }

    /// Most recently detected MIDI pitch, if the monitor is running and
    /// confident.
    pub fn detected_pitch(&self) -> Option<u8> {
        self.monitor.as_ref().and_then(|m| m.detected())
    }

    // --- Configuration ---

    pub fn instrument(&self) -> InstrumentKind {
        self.instrument
    }

    pub fn set_instrument(&mut self, kind: InstrumentKind) {
        self.instrument = kind;
        if let Ok(mut tone) = self.tone.lock() {
            tone.set_instrument(kind);
        }
    }

    /// Volume from a 0-100 control value, mapped to -40..0 dB at the seam.
    pub fn set_volume(&mut self, control: u8) {
        if let Ok(mut tone) = self.tone.lock() {
            tone.set_volume(control_to_db(control));
        }
    }

    pub fn set_sustain(&mut self, seconds: f64) {
        if let Ok(mut tone) = self.tone.lock() {
            tone.set_sustain_release(seconds);
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(NullTone)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    use vk_engine::ToneCall;

    fn collecting_controller() -> (Controller, Arc<Mutex<CollectingTone>>) {
        let tone = Arc::new(Mutex::new(CollectingTone::new()));
        let ctrl = Controller::new(tone.clone() as Arc<Mutex<dyn ToneGenerator>>);
        (ctrl, tone)
    }

    #[test]
    fn duplicate_note_on_triggers_sound_once() {
        let (mut ctrl, tone) = collecting_controller();
        ctrl.note_on(60, 0.8, InputSource::Midi);
        ctrl.press_key(60); // same pitch from the pointer
        assert_eq!(ctrl.held_pitches(), vec![60]);

        let attacks = tone.lock().unwrap().attacks();
        assert_eq!(attacks.len(), 1);
    }

    #[test]
    fn pluck_instrument_skips_release_calls() {
        let (mut ctrl, tone) = collecting_controller();
        ctrl.set_instrument(InstrumentKind::Pluck);
        ctrl.press_key(60);
        ctrl.release_key(60);

        let tone = tone.lock().unwrap();
        assert_eq!(tone.attacks().len(), 1);
        assert!(tone.releases().is_empty());
        assert!(!ctrl.held_pitches().contains(&60));
    }

    #[test]
    fn chord_follows_held_notes() {
        let (mut ctrl, _) = collecting_controller();
        ctrl.press_key(60);
        ctrl.press_key(64);
        assert_eq!(ctrl.chord(), None);
        ctrl.press_key(67);
        assert_eq!(ctrl.chord().unwrap().to_string(), "C major");
        ctrl.release_key(64);
        assert_eq!(ctrl.chord(), None);
    }

    #[test]
    fn record_then_export_round_trip() {
        let (mut ctrl, _) = collecting_controller();
        ctrl.start_recording().unwrap();
        ctrl.press_key(60);
        thread::sleep(Duration::from_millis(30));
        ctrl.release_key(60);
        let count = ctrl.stop_recording();
        assert_eq!(count, 1);

        let bytes = ctrl.export_midi().unwrap();
        assert_eq!(&bytes[0..4], b"MThd");
    }

    #[test]
    fn export_with_nothing_recorded_is_rejected() {
        let (ctrl, _) = collecting_controller();
        assert!(matches!(ctrl.export_midi(), Err(ControlError::EmptyTimeline)));
    }

    #[test]
    fn play_with_nothing_recorded_is_rejected() {
        let (mut ctrl, _) = collecting_controller();
        let result = ctrl.play(Box::new(|| {}));
        assert!(matches!(result, Err(ControlError::EmptyTimeline)));
        assert!(!ctrl.is_playing());
    }

    #[test]
    fn recording_during_playback_is_rejected() {
        let (mut ctrl, _) = collecting_controller();
        ctrl.start_recording().unwrap();
        ctrl.press_key(60);
        thread::sleep(Duration::from_millis(20));
        ctrl.release_key(60);
        ctrl.stop_recording();

        ctrl.play(Box::new(|| {})).unwrap();
        assert!(ctrl.is_playing());
        let result = ctrl.start_recording();
        assert!(matches!(
            result,
            Err(ControlError::ConflictingOperation { attempted: "recording", active: "playback" })
        ));
        assert!(!ctrl.is_recording());
        ctrl.stop_playback();
    }

    #[test]
    fn playback_during_recording_is_rejected() {
        let (mut ctrl, _) = collecting_controller();
        ctrl.start_recording().unwrap();
        let result = ctrl.play(Box::new(|| {}));
        assert!(matches!(
            result,
            Err(ControlError::ConflictingOperation { attempted: "playback", active: "recording" })
        ));
        assert!(ctrl.is_recording());
    }

    #[test]
    fn stop_playback_silences_voices() {
        let (mut ctrl, tone) = collecting_controller();
        ctrl.start_recording().unwrap();
        ctrl.press_key(60);
        thread::sleep(Duration::from_millis(20));
        ctrl.release_key(60);
        ctrl.stop_recording();

        ctrl.play(Box::new(|| {})).unwrap();
        ctrl.stop_playback();
        assert!(!ctrl.is_playing());
        let calls = &tone.lock().unwrap().calls;
        assert!(calls.contains(&ToneCall::AllNotesOff));
    }

    #[test]
    fn volume_and_sustain_reach_the_tone_generator() {
        let (mut ctrl, tone) = collecting_controller();
        ctrl.set_volume(50);
        ctrl.set_sustain(1.5);
        let calls = &tone.lock().unwrap().calls;
        assert!(calls.contains(&ToneCall::SetVolume(-20.0)));
        assert!(calls.contains(&ToneCall::SetSustainRelease(1.5)));
    }
}
