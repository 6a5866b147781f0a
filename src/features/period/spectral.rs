//! Spectral-onset tempo strategy
//!
//! Algorithm:
//! 1. Weighted spectral onset function (2048-sample frames, 512 hop)
//! 2. Onsets: peaks above `mean × 1.5`, at least 300 ms apart
//! 3. Two periodicity estimates over [60, 200] BPM:
//!    - autocorrelation of the onset train
//!    - dynamic-programming beat tracking (20% tolerance window)
//! 4. Estimates within 10% of each other are averaged; otherwise the beat
//!    tracker wins
//! 5. Folded into the reporting range, then the same octave policy and
//!    candidate shape as the energy-peak strategy
//!
//! Confidence is the share of inter-onset intervals that land within the
//! tolerance window of a whole number of beats, measured against the folded
//! tempo before any octave correction.

use super::autocorrelation::onset_autocorrelation_tempo;
use super::candidate_filter::{build_candidates, fold_into_range, intervals_to_bpm, restrict_to_range};
use super::octave::apply_octave_policy;
use super::peak_picking::pick_peaks_in_order;
use super::{TempoEstimate, TempoEstimator};
use crate::config::TempoConfig;
use crate::error::AnalysisError;
use crate::features::beat_tracking::track_beats;
use crate::features::onset::spectral_flux::compute_onset_function;

/// Relative distance under which the two periodicity estimates are averaged
const AGREEMENT: f32 = 0.1;

/// Onset + autocorrelation + beat tracking tempo estimator
#[derive(Debug, Clone)]
pub struct SpectralOnsetTempo {
    config: TempoConfig,
}

impl SpectralOnsetTempo {
    /// Create the strategy with the given parameters
    pub fn new(config: TempoConfig) -> Self {
        Self { config }
    }
}

impl Default for SpectralOnsetTempo {
    fn default() -> Self {
        Self::new(TempoConfig::default())
    }
}

impl TempoEstimator for SpectralOnsetTempo {
    fn name(&self) -> &'static str {
        "spectral_onsets"
    }

    fn estimate(&self, samples: &[f32], sample_rate: u32) -> Result<TempoEstimate, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
        }
        let cfg = &self.config;
        let odf = compute_onset_function(samples, cfg.frame_size, cfg.hop_size)?;
        let frame_seconds = cfg.hop_size as f32 / sample_rate as f32;

        let mean = if odf.is_empty() {
            0.0
        } else {
            odf.iter().sum::<f32>() / odf.len() as f32
        };
        let min_distance = (cfg.min_peak_distance_secs / frame_seconds).floor() as usize;
        let onsets = pick_peaks_in_order(&odf, mean * cfg.peak_threshold_factor, min_distance);

        if onsets.len() < 2 {
            log::warn!("Only {} spectral onsets found, using fallback tempo", onsets.len());
            return Ok(TempoEstimate::fallback());
        }

        let strengths: Vec<f32> = onsets.iter().map(|&i| odf[i]).collect();
        let times: Vec<f32> = onsets.iter().map(|&i| i as f32 * frame_seconds).collect();

        let acf = onset_autocorrelation_tempo(
            &onsets,
            &strengths,
            frame_seconds,
            cfg.tracker_min_bpm,
            cfg.tracker_max_bpm,
        )?;
        let tracked = track_beats(
            &times,
            &strengths,
            cfg.tracker_min_bpm,
            cfg.tracker_max_bpm,
            cfg.tracker_tolerance,
        )?;

        let combined = match (&acf, &tracked) {
            (Some(a), Some(t)) if (a.bpm - t.bpm).abs() / t.bpm <= AGREEMENT => (a.bpm + t.bpm) / 2.0,
            (Some(a), Some(t)) => {
                log::debug!(
                    "Autocorrelation ({:.1}) and beat tracker ({:.1}) disagree; using tracker",
                    a.bpm,
                    t.bpm
                );
                t.bpm
            }
            (Some(a), None) => a.bpm,
            (None, Some(t)) => t.bpm,
            (None, None) => {
                log::warn!("No periodicity in {} onsets, using fallback tempo", onsets.len());
                return Ok(TempoEstimate::fallback());
            }
        };

        let folded = fold_into_range(combined, cfg.min_bpm, cfg.max_bpm);
        let raw = intervals_to_bpm(&onsets, frame_seconds);
        let selection = restrict_to_range(&raw, cfg.min_bpm, cfg.max_bpm);
        let spread_source = if selection.values.is_empty() {
            vec![folded]
        } else {
            selection.values
        };
        let decision = apply_octave_policy(folded, &spread_source, &cfg.octave);
        // Onsets follow the detected pulse, not the octave-corrected one
        let confidence = interval_consistency(&times, 60.0 / folded, cfg.tracker_tolerance);

        log::debug!(
            "Spectral tempo: {} onsets, combined {:.2}, folded {:.2} -> {:.2} ({:?}), confidence {:.2}",
            onsets.len(),
            combined,
            folded,
            decision.bpm,
            decision.correction,
            confidence
        );

        Ok(TempoEstimate {
            primary: decision.bpm.round(),
            confidence,
            candidates: build_candidates(decision.bpm),
            beats: tracked.map(|t| t.beats).unwrap_or_default(),
            is_fallback: false,
        })
    }
}

/// Share of inter-onset intervals within `tolerance × beat` of 1–4 beats
fn interval_consistency(times: &[f32], beat: f32, tolerance: f32) -> f32 {
    let intervals: Vec<f32> = times.windows(2).map(|w| w[1] - w[0]).collect();
    if intervals.is_empty() || beat <= 0.0 {
        return 0.0;
    }
    let consistent = intervals
        .iter()
        .filter(|&&gap| {
            let k = (gap / beat).round().clamp(1.0, 4.0);
            (gap - k * beat).abs() < beat * tolerance
        })
        .count();
    consistent as f32 / intervals.len() as f32
}
