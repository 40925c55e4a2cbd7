//! CPAL-based microphone input backend.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::traits::AudioError;
use crate::yin::WINDOW_SIZE;

/// Process-wide claim on the microphone. A second open while one session
/// holds it fails with [`AudioError::Busy`] instead of silently detaching
/// the first.
static MIC_CLAIMED: AtomicBool = AtomicBool::new(false);

struct MicClaim;

impl MicClaim {
    fn acquire() -> Result<Self, AudioError> {
        if MIC_CLAIMED
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(AudioError::Busy);
        }
        Ok(Self)
    }
}

impl Drop for MicClaim {
    fn drop(&mut self) {
        MIC_CLAIMED.store(false, Ordering::Release);
    }
}

/// Exclusive microphone session streaming mono samples into a ring buffer.
///
/// Not `Send` (the underlying stream is thread-bound); open it on the thread
/// that reads it. Dropping the session closes the stream and releases the
/// microphone claim on every exit path.
pub struct CpalMicInput {
    _claim: MicClaim,
    _stream: Stream,
    consumer: HeapCons<f32>,
    sample_rate: u32,
    /// Rolling window of the most recent samples
    window: Vec<f32>,
}

impl CpalMicInput {
    /// Open the default input device and start capturing.
    pub fn open() -> Result<Self, AudioError> {
        let claim = MicClaim::acquire()?;

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(AudioError::NoDevice)?;
        let config = device
            .default_input_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;
        let config: StreamConfig = config.into();

        let (stream, consumer) = Self::build_stream(&device, &config)?;
        stream
            .play()
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        Ok(Self {
            _claim: claim,
            _stream: stream,
            consumer,
            sample_rate: config.sample_rate.0,
            window: Vec::with_capacity(WINDOW_SIZE),
        })
    }

    fn build_stream(
        device: &Device,
        config: &StreamConfig,
    ) -> Result<(Stream, HeapCons<f32>), AudioError> {
        // Ring buffer roughly 250ms deep; the monitor drains it every frame
        let rb = HeapRb::<f32>::new((config.sample_rate.0 as usize) / 4);
        let (mut producer, consumer) = rb.split();
        let channels = config.channels as usize;

        let stream = device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // First channel only; pitch detection is monophonic.
                    // Overflow drops samples rather than blocking the
                    // device callback.
                    for frame in data.chunks(channels) {
                        let _ = producer.try_push(frame[0]);
                    }
                },
                |err| log::warn!("microphone stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        Ok((stream, consumer))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Drain captured samples into the rolling window and return it once
    /// full. `None` until [`WINDOW_SIZE`] samples have arrived.
    pub fn latest_window(&mut self) -> Option<&[f32]> {
        while let Some(sample) = self.consumer.try_pop() {
            self.window.push(sample);
        }
        let excess = self.window.len().saturating_sub(WINDOW_SIZE);
        if excess > 0 {
            self.window.drain(..excess);
        }
        if self.window.len() == WINDOW_SIZE {
            Some(&self.window)
        } else {
            None
        }
    }
}
