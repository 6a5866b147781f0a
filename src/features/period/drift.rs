//! Tempo drift between the opening and closing sections of a track

use super::TempoEstimator;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Tempo at the start and end of a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoDrift {
    /// BPM over the opening window
    pub start_bpm: f32,
    /// BPM over the closing window
    pub end_bpm: f32,
    /// `end_bpm − start_bpm`
    pub drift: f32,
}

/// Estimate the tempo of the first and last `window_secs` independently
///
/// # Returns
///
/// `None` when the track is shorter than two windows or either window has
/// no detectable periodicity
pub fn measure_tempo_drift(
    samples: &[f32],
    sample_rate: u32,
    window_secs: f32,
    estimator: &dyn TempoEstimator,
) -> Result<Option<TempoDrift>, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }
    let window = (window_secs * sample_rate as f32) as usize;
    if window == 0 || samples.len() < window * 2 {
        return Ok(None);
    }

    let head = estimator.estimate(&samples[..window], sample_rate)?;
    let tail = estimator.estimate(&samples[samples.len() - window..], sample_rate)?;
    if head.is_fallback || tail.is_fallback {
        return Ok(None);
    }

    let drift = TempoDrift {
        start_bpm: head.primary,
        end_bpm: tail.primary,
        drift: tail.primary - head.primary,
    };
    log::debug!(
        "Tempo drift over {} s windows: {} -> {} BPM",
        window_secs,
        drift.start_bpm,
        drift.end_bpm
    );
    Ok(Some(drift))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::period::energy_peaks::EnergyPeakTempo;

    fn clicks(period: usize, len: usize) -> Vec<f32> {
        let mut samples = vec![0.0f32; len];
        let mut pos = 0;
        while pos + 200 < len {
            for i in 0..200 {
                samples[pos + i] = 1.0 - i as f32 / 200.0;
            }
            pos += period;
        }
        samples
    }

    #[test]
    fn test_short_track_has_no_drift() {
        let samples = clicks(22050, 44100 * 40);
        let drift = measure_tempo_drift(&samples, 44100, 30.0, &EnergyPeakTempo::default()).unwrap();
        assert!(drift.is_none());
    }

    #[test]
    fn test_steady_track_has_zero_drift() {
        let samples = clicks(26448, 44100 * 65);
        let drift = measure_tempo_drift(&samples, 44100, 30.0, &EnergyPeakTempo::default())
            .unwrap()
            .unwrap();
        assert_eq!(drift.drift, 0.0);
        assert_eq!(drift.start_bpm, drift.end_bpm);
    }
}
