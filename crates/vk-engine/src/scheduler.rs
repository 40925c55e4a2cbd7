//! Timeline playback against the tone generator.
//!
//! A pure scheduling pass expands the timeline into a sorted queue of
//! attack/release actions; a runner thread then fires them at their
//! transport offsets. Cancellation is cooperative: the stop flag is checked
//! before every dispatch and before re-arming the next sleep, so no action
//! fires after a stop has been observed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use vk_ir::Timeline;

use crate::event_queue::{PlaybackAction, PlaybackEvent, PlaybackQueue};
use crate::tone::ToneGenerator;
use crate::transport::Transport;

/// Seconds past the timeline tail before auto-stop declares completion.
pub const COMPLETION_MARGIN: f64 = 0.5;

/// Longest single sleep in the runner loop; bounds cancellation latency.
const POLL_SLICE: Duration = Duration::from_millis(2);

/// Expand a timeline into a time-sorted queue of playback actions.
///
/// Scheduling uses each event's own onset, never its list position; the
/// timeline arrives in completion order, not onset order.
pub fn build_queue(timeline: &Timeline) -> PlaybackQueue {
    let mut queue = PlaybackQueue::new();
    for event in timeline.events() {
        queue.push(PlaybackEvent {
            time: event.onset,
            action: PlaybackAction::Attack { pitch: event.pitch, velocity: event.velocity },
        });
        queue.push(PlaybackEvent {
            time: event.end(),
            action: PlaybackAction::Release { pitch: event.pitch },
        });
    }
    queue
}

/// An in-flight playback session.
///
/// Dropping the handle cancels the session and joins the runner thread.
pub struct Playback {
    cancel: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Playback {
    /// Start replaying `timeline` through `tone`, timed on `transport` with
    /// a fresh zero reference.
    ///
    /// `on_done` fires exactly once on normal completion (after the
    /// timeline tail plus [`COMPLETION_MARGIN`]) and never after a cancel.
    pub fn start(
        timeline: &Timeline,
        transport: Arc<Transport>,
        tone: Arc<Mutex<dyn ToneGenerator>>,
        on_done: Box<dyn FnOnce() + Send>,
    ) -> Self {
        let queue = build_queue(timeline);
        let tail = timeline.tail();
        log::debug!("playback runner starting: {} actions, tail {:.3}s", queue.len(), tail);
        let cancel = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let cancel_flag = cancel.clone();
        let finished_flag = finished.clone();
        let thread = thread::spawn(move || {
            run(queue, tail, transport, tone, cancel_flag, finished_flag, on_done);
        });

        Self { cancel, finished, thread: Some(thread) }
    }

    /// Cancel the session: silence all voices, fire no further action.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// Returns true while the session is still running.
    pub fn is_active(&self) -> bool {
        !self.finished.load(Ordering::Relaxed)
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    mut queue: PlaybackQueue,
    tail: f64,
    transport: Arc<Transport>,
    tone: Arc<Mutex<dyn ToneGenerator>>,
    cancel: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    on_done: Box<dyn FnOnce() + Send>,
) {
    // Session zero on the shared clock; all scheduling below is relative
    let zero = transport.now();
    let deadline = tail + COMPLETION_MARGIN;

    loop {
        if cancel.load(Ordering::Relaxed) {
            silence(&tone);
            finished.store(true, Ordering::Relaxed);
            return;
        }

        let now = transport.now() - zero;
        for index in queue.drain_due(now) {
            // An already-drained action still re-checks validity before it
            // touches the tone generator.
            if cancel.load(Ordering::Relaxed) {
                silence(&tone);
                finished.store(true, Ordering::Relaxed);
                return;
            }
            if let Some(event) = queue.get(index) {
                dispatch(&tone, event);
            }
        }

        let now = transport.now() - zero;
        if queue.is_exhausted() && now >= deadline {
            break;
        }

        // Sleep toward the next event (or the completion deadline), in
        // slices short enough that a stop request lands promptly.
        let until = queue.next_due().unwrap_or(deadline);
        let remaining = (until - now).max(0.0);
        thread::sleep(POLL_SLICE.min(Duration::from_secs_f64(remaining.max(1e-4))));
    }

    log::debug!("playback ran to completion");
    finished.store(true, Ordering::Relaxed);
    on_done();
}

fn dispatch(tone: &Arc<Mutex<dyn ToneGenerator>>, event: &PlaybackEvent) {
    let Ok(mut tone) = tone.lock() else { return };
    match event.action {
        PlaybackAction::Attack { pitch, velocity } => tone.attack(pitch, velocity, event.time),
        PlaybackAction::Release { pitch } => tone.release(pitch, event.time),
    }
}

fn silence(tone: &Arc<Mutex<dyn ToneGenerator>>) {
    log::debug!("playback cancelled, silencing voices");
    if let Ok(mut tone) = tone.lock() {
        tone.all_notes_off();
    }
}
