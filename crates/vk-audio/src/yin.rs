//! YIN monophonic fundamental-frequency estimation.
//!
//! Difference function over a fixed window, cumulative mean normalization,
//! absolute threshold, and parabolic refinement of the chosen lag. Good for
//! one voice or instrument; polyphonic input yields no confident detection.

/// Fixed analysis window in samples.
pub const WINDOW_SIZE: usize = 2048;

/// YIN pitch detector for a fixed sample rate.
#[derive(Clone, Debug)]
pub struct YinDetector {
    sample_rate: f32,
    /// Normalized-difference threshold below which a lag counts as periodic
    threshold: f32,
    /// RMS gate; windows quieter than this report no pitch
    silence_rms: f32,
}

impl YinDetector {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            threshold: 0.15,
            silence_rms: 0.01,
        }
    }

    /// Estimate the fundamental frequency of `window` in Hz.
    ///
    /// Returns `None` when the window is too quiet or no lag is confidently
    /// periodic.
    pub fn detect(&self, window: &[f32]) -> Option<f32> {
        let half = window.len() / 2;
        if half < 2 || rms(window) < self.silence_rms {
            return None;
        }

        // Difference function d(tau)
        let mut diff = vec![0.0f32; half];
        for tau in 1..half {
            let mut sum = 0.0f32;
            for i in 0..half {
                let d = window[i] - window[i + tau];
                sum += d * d;
            }
            diff[tau] = sum;
        }

        // Cumulative mean normalized difference d'(tau)
        let mut cmndf = vec![1.0f32; half];
        let mut running = 0.0f32;
        for tau in 1..half {
            running += diff[tau];
            cmndf[tau] = if running > 0.0 {
                diff[tau] * tau as f32 / running
            } else {
                1.0
            };
        }

        // First lag under the absolute threshold, walked down to its local
        // minimum before refinement
        let mut tau = 2;
        while tau < half {
            if cmndf[tau] < self.threshold {
                while tau + 1 < half && cmndf[tau + 1] < cmndf[tau] {
                    tau += 1;
                }
                return Some(self.sample_rate / parabolic_lag(&cmndf, tau));
            }
            tau += 1;
        }

        None
    }
}

/// Refine an integer lag to sub-sample precision by fitting a parabola
/// through its neighborhood in the normalized difference curve.
fn parabolic_lag(cmndf: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= cmndf.len() {
        return tau as f32;
    }
    let (a, b, c) = (cmndf[tau - 1], cmndf[tau], cmndf[tau + 1]);
    let denom = a + c - 2.0 * b;
    if denom.abs() < 1e-12 {
        tau as f32
    } else {
        tau as f32 + 0.5 * (a - c) / denom
    }
}

fn rms(window: &[f32]) -> f32 {
    let sum: f32 = window.iter().map(|s| s * s).sum();
    (sum / window.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn sine(freq: f32, sample_rate: f32, amplitude: f32) -> Vec<f32> {
        (0..WINDOW_SIZE)
            .map(|i| amplitude * (TAU * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn detects_a4() {
        let detector = YinDetector::new(44100.0);
        let freq = detector.detect(&sine(440.0, 44100.0, 0.5)).unwrap();
        assert!((freq - 440.0).abs() < 3.0, "detected {}", freq);
    }

    #[test]
    fn detects_a3() {
        let detector = YinDetector::new(44100.0);
        let freq = detector.detect(&sine(220.0, 44100.0, 0.5)).unwrap();
        assert!((freq - 220.0).abs() < 2.0, "detected {}", freq);
    }

    #[test]
    fn silence_yields_nothing() {
        let detector = YinDetector::new(44100.0);
        assert_eq!(detector.detect(&vec![0.0; WINDOW_SIZE]), None);
        // Quiet hum below the gate
        assert_eq!(detector.detect(&sine(440.0, 44100.0, 0.001)), None);
    }

    #[test]
    fn detected_frequency_maps_to_midi_pitch() {
        let detector = YinDetector::new(44100.0);
        let freq = detector.detect(&sine(261.63, 44100.0, 0.5)).unwrap();
        assert_eq!(vk_ir::frequency_to_pitch(freq as f64), Some(60));
    }
}
