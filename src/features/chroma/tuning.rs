//! Tuning offset estimate
//!
//! Locates the dominant peak of the reference band in a handful of frames
//! and measures how far it sits from the nearest equal-tempered semitone.
//! The result is informational; pitch-class mapping is not shifted by it.

use super::extractor::SpectralFrames;
use super::C0_HZ;
use crate::config::KeyConfig;

/// Mean semitone deviation of the dominant reference-band peaks
///
/// # Returns
///
/// Offset in semitones within [−0.5, 0.5], or `None` when no inspected
/// frame has a peak above the quiet threshold
pub fn estimate_tuning_offset(frames: &SpectralFrames, config: &KeyConfig) -> Option<f32> {
    let (low, high) = config.tuning_band;
    let mut offsets = Vec::new();

    for magnitudes in frames.magnitudes.iter().take(config.tuning_frames) {
        if magnitudes.len() < 3 {
            continue;
        }
        let first = ((low / frames.bin_hz).ceil() as usize).max(1);
        let last = ((high / frames.bin_hz).floor() as usize).min(magnitudes.len() - 2);
        if first > last {
            continue;
        }

        let mut peak = first;
        for k in first..=last {
            if magnitudes[k] > magnitudes[peak] {
                peak = k;
            }
        }
        if magnitudes[peak] <= config.quiet_threshold {
            continue;
        }

        // Parabolic interpolation around the peak bin
        let (a, b, c) = (magnitudes[peak - 1], magnitudes[peak], magnitudes[peak + 1]);
        let denom = a - 2.0 * b + c;
        let shift = if denom.abs() > 1e-10 {
            (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        };
        let frequency = (peak as f32 + shift) * frames.bin_hz;
        let semitones = 12.0 * (frequency / C0_HZ).log2();
        offsets.push(semitones - semitones.round());
    }

    if offsets.is_empty() {
        return None;
    }
    let offset = offsets.iter().sum::<f32>() / offsets.len() as f32;
    log::debug!("Tuning offset {:+.3} semitones over {} frames", offset, offsets.len());
    Some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::chroma::extractor::compute_spectral_frames;

    fn sine(freq: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        (0..(seconds * sample_rate as f32) as usize)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_concert_pitch_is_near_zero() {
        let config = KeyConfig::default();
        let frames = compute_spectral_frames(&sine(440.0, 3.0, 44100), 44100, &config).unwrap();
        let offset = estimate_tuning_offset(&frames, &config).unwrap();
        assert!(offset.abs() < 0.1, "offset {}", offset);
    }

    #[test]
    fn test_sharp_tuning_detected() {
        // A quarter tone above A4
        let freq = 440.0 * 2f32.powf(0.25 / 12.0);
        let config = KeyConfig::default();
        let frames = compute_spectral_frames(&sine(freq, 3.0, 44100), 44100, &config).unwrap();
        let offset = estimate_tuning_offset(&frames, &config).unwrap();
        assert!(offset > 0.1 && offset < 0.4, "offset {}", offset);
    }

    #[test]
    fn test_silence_has_no_tuning() {
        let config = KeyConfig::default();
        let frames = compute_spectral_frames(&vec![0.0; 44100 * 2], 44100, &config).unwrap();
        assert!(estimate_tuning_offset(&frames, &config).is_none());
    }
}
