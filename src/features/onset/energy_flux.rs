//! Energy envelope
//!
//! Frame-wise RMS energy used by the energy-peak tempo strategy.
//!
//! Algorithm:
//! 1. Window length = `window_secs × sample_rate` samples
//! 2. Hop = window × `hop_fraction` (25% by default, so 75% overlap)
//! 3. RMS per frame: sqrt(mean(x²))
//!
//! # Example
//!
//! ```no_run
//! use segue_dsp::features::onset::energy_flux::compute_energy_envelope;
//!
//! let samples = vec![0.0f32; 44100 * 30];
//! let envelope = compute_energy_envelope(&samples, 44100, 0.1, 0.25)?;
//! println!("{} frames, hop {} samples", envelope.values.len(), envelope.hop_size);
//! # Ok::<(), segue_dsp::AnalysisError>(())
//! ```

use crate::error::AnalysisError;

/// RMS energy envelope with its framing parameters
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyEnvelope {
    /// RMS value per frame
    pub values: Vec<f32>,
    /// Window length in samples
    pub window_size: usize,
    /// Hop between frames in samples
    pub hop_size: usize,
    /// Sample rate of the source audio
    pub sample_rate: u32,
}

impl EnergyEnvelope {
    /// Duration of one hop in seconds
    pub fn hop_seconds(&self) -> f32 {
        self.hop_size as f32 / self.sample_rate as f32
    }

    /// Arithmetic mean of the envelope (0.0 when empty)
    pub fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }
}

/// Compute the RMS energy envelope
///
/// # Arguments
///
/// * `samples` - Mono samples
/// * `sample_rate` - Sample rate in Hz
/// * `window_secs` - Window length in seconds (typically 0.1)
/// * `hop_fraction` - Hop as a fraction of the window (typically 0.25)
///
/// # Returns
///
/// The envelope; empty when the audio is shorter than one window
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate or a window
/// that rounds to zero samples
pub fn compute_energy_envelope(
    samples: &[f32],
    sample_rate: u32,
    window_secs: f32,
    hop_fraction: f32,
) -> Result<EnergyEnvelope, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }

    let window_size = (sample_rate as f32 * window_secs).floor() as usize;
    if window_size == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Envelope window of {} s is shorter than one sample",
            window_secs
        )));
    }
    let hop_size = ((window_size as f32 * hop_fraction).floor() as usize).max(1);

    let mut values = Vec::new();
    if samples.len() >= window_size {
        let num_frames = (samples.len() - window_size) / hop_size + 1;
        values.reserve(num_frames);
        for i in 0..num_frames {
            let start = i * hop_size;
            let frame = &samples[start..start + window_size];
            let sum_sq: f32 = frame.iter().map(|&x| x * x).sum();
            values.push((sum_sq / window_size as f32).sqrt());
        }
    }

    log::debug!(
        "Energy envelope: {} frames (window={}, hop={}) from {} samples",
        values.len(),
        window_size,
        hop_size,
        samples.len()
    );

    Ok(EnergyEnvelope {
        values,
        window_size,
        hop_size,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_matches_window_and_hop() {
        let samples = vec![0.5f32; 44100];
        let env = compute_energy_envelope(&samples, 44100, 0.1, 0.25).unwrap();
        assert_eq!(env.window_size, 4410);
        assert_eq!(env.hop_size, 1102);
        assert_eq!(env.values.len(), (44100 - 4410) / 1102 + 1);
        for &v in &env.values {
            assert!((v - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_short_audio_gives_empty_envelope() {
        let env = compute_energy_envelope(&[0.1; 100], 44100, 0.1, 0.25).unwrap();
        assert!(env.values.is_empty());
        assert_eq!(env.mean(), 0.0);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        assert!(compute_energy_envelope(&[0.0; 10], 0, 0.1, 0.25).is_err());
    }

    #[test]
    fn test_burst_raises_envelope() {
        let mut samples = vec![0.0f32; 44100];
        for s in samples[22050..22491].iter_mut() {
            *s = 1.0;
        }
        let env = compute_energy_envelope(&samples, 44100, 0.1, 0.25).unwrap();
        let max = env.values.iter().cloned().fold(0.0f32, f32::max);
        assert!(max > 0.0);
        assert_eq!(env.values[0], 0.0);
    }
}
