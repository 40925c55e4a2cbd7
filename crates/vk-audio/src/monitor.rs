//! The pitch-monitor loop.

use std::sync::atomic::{AtomicBool, AtomicI16, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::cpal_backend::CpalMicInput;
use crate::traits::AudioError;
use crate::yin::YinDetector;

/// Published when no pitch is confidently detected.
const NO_PITCH: i16 = -1;

/// One iteration per display refresh.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Continuous monophonic pitch monitor.
///
/// Runs as its own cancellable loop on a dedicated thread: each frame it
/// reads the latest microphone window, estimates a fundamental, and
/// publishes the nearest MIDI pitch for display. The microphone is acquired
/// exclusively on start and released on every exit path, acquisition
/// failure included.
pub struct PitchMonitor {
    stop: Arc<AtomicBool>,
    reading: Arc<AtomicI16>,
    thread: Option<JoinHandle<()>>,
}

impl PitchMonitor {
    /// Acquire the microphone and start monitoring.
    ///
    /// The input stream is thread-bound, so it is opened on the monitor
    /// thread itself; the open result is relayed back before this returns.
    pub fn start() -> Result<Self, AudioError> {
        let stop = Arc::new(AtomicBool::new(false));
        let reading = Arc::new(AtomicI16::new(NO_PITCH));
        let (ready_tx, ready_rx) = mpsc::channel();

        let stop_flag = stop.clone();
        let cell = reading.clone();
        let thread = thread::spawn(move || {
            let mut mic = match CpalMicInput::open() {
                Ok(mic) => {
                    let _ = ready_tx.send(Ok(()));
                    mic
                }
                Err(err) => {
                    // Claim already released; nothing held past this point
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };

            let detector = YinDetector::new(mic.sample_rate() as f32);
            while !stop_flag.load(Ordering::Relaxed) {
                let pitch = mic
                    .latest_window()
                    .and_then(|window| detector.detect(window))
                    .and_then(|freq| vk_ir::frequency_to_pitch(freq as f64));
                cell.store(pitch.map(i16::from).unwrap_or(NO_PITCH), Ordering::Relaxed);
                thread::sleep(FRAME_INTERVAL);
            }
            // Dropping the mic closes the stream and releases the claim
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { stop, reading, thread: Some(thread) }),
            Ok(Err(err)) => {
                let _ = thread.join();
                Err(err)
            }
            Err(_) => {
                let _ = thread.join();
                Err(AudioError::DeviceInit("monitor thread exited early".into()))
            }
        }
    }

    /// The most recently published pitch, if any.
    pub fn detected(&self) -> Option<u8> {
        match self.reading.load(Ordering::Relaxed) {
            p @ 0..=127 => Some(p as u8),
            _ => None,
        }
    }

    /// Cancel the loop and release the microphone.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        self.reading.store(NO_PITCH, Ordering::Relaxed);
    }
}

impl Drop for PitchMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
