//! Energy-peak tempo strategy
//!
//! Algorithm:
//! 1. RMS energy envelope (100 ms window, 25% hop)
//! 2. Peaks above `mean × 1.5`, at least 300 ms apart
//! 3. Inter-peak intervals → BPM, restricted to [60, 180] with one octave
//!    adjustment when nothing fits
//! 4. Histogram mode (3 BPM buckets) as the central estimate
//! 5. Half/double-time policy, then ×0.5/×1/×1.5/×2 candidates
//!
//! # Example
//!
//! ```no_run
//! use segue_dsp::config::TempoConfig;
//! use segue_dsp::features::period::energy_peaks::EnergyPeakTempo;
//! use segue_dsp::features::period::TempoEstimator;
//!
//! let samples = vec![0.0f32; 44100 * 30];
//! let estimate = EnergyPeakTempo::new(TempoConfig::default()).estimate(&samples, 44100)?;
//! println!("{} BPM", estimate.primary);
//! # Ok::<(), segue_dsp::AnalysisError>(())
//! ```

use super::candidate_filter::{build_candidates, histogram_mode, intervals_to_bpm, restrict_to_range};
use super::octave::apply_octave_policy;
use super::peak_picking::pick_peaks_in_order;
use super::{TempoEstimate, TempoEstimator};
use crate::config::TempoConfig;
use crate::error::AnalysisError;
use crate::features::onset::energy_flux::compute_energy_envelope;

/// Envelope-peak tempo estimator
#[derive(Debug, Clone)]
pub struct EnergyPeakTempo {
    config: TempoConfig,
}

impl EnergyPeakTempo {
    /// Create the strategy with the given parameters
    pub fn new(config: TempoConfig) -> Self {
        Self { config }
    }

    /// Parameters in use
    pub fn config(&self) -> &TempoConfig {
        &self.config
    }
}

impl Default for EnergyPeakTempo {
    fn default() -> Self {
        Self::new(TempoConfig::default())
    }
}

/// Central estimate before octave correction
#[derive(Debug, Clone, PartialEq)]
pub struct RawTempo {
    /// Histogram mode center in BPM
    pub center: f32,
    /// Share of in-range intervals supporting the mode
    pub support: f32,
    /// In-range BPM values the mode was taken from
    pub values: Vec<f32>,
    /// Peak times in seconds
    pub beats: Vec<f32>,
}

impl EnergyPeakTempo {
    /// Run steps 1-4 and stop before the octave policy
    ///
    /// # Returns
    ///
    /// `None` when fewer than two peaks are found or no interval maps into
    /// the tempo range
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero sample rate
    pub fn raw_tempo(&self, samples: &[f32], sample_rate: u32) -> Result<Option<RawTempo>, AnalysisError> {
        let cfg = &self.config;
        let envelope = compute_energy_envelope(samples, sample_rate, cfg.window_secs, cfg.hop_fraction)?;

        let hop_seconds = envelope.hop_seconds();
        let threshold = envelope.mean() * cfg.peak_threshold_factor;
        let min_distance = (cfg.min_peak_distance_secs / hop_seconds).floor() as usize;
        let peaks = pick_peaks_in_order(&envelope.values, threshold, min_distance);

        if peaks.len() < 2 {
            log::warn!("Only {} energy peaks found, using fallback tempo", peaks.len());
            return Ok(None);
        }

        let raw = intervals_to_bpm(&peaks, hop_seconds);
        let selection = restrict_to_range(&raw, cfg.min_bpm, cfg.max_bpm);
        let mode = match histogram_mode(&selection.values, cfg.bucket_width) {
            Some(mode) => mode,
            None => {
                log::warn!(
                    "No inter-peak interval maps into [{}, {}] BPM, using fallback tempo",
                    cfg.min_bpm,
                    cfg.max_bpm
                );
                return Ok(None);
            }
        };

        log::debug!(
            "Energy-peak tempo: {} peaks, {} intervals ({} in range, adjusted={}), mode {:.2}",
            peaks.len(),
            raw.len(),
            selection.values.len(),
            selection.octave_adjusted,
            mode.center
        );

        Ok(Some(RawTempo {
            center: mode.center,
            support: mode.support,
            values: selection.values,
            beats: peaks.iter().map(|&p| p as f32 * hop_seconds).collect(),
        }))
    }
}

impl TempoEstimator for EnergyPeakTempo {
    fn name(&self) -> &'static str {
        "energy_peaks"
    }

    fn estimate(&self, samples: &[f32], sample_rate: u32) -> Result<TempoEstimate, AnalysisError> {
        let raw = match self.raw_tempo(samples, sample_rate)? {
            Some(raw) => raw,
            None => return Ok(TempoEstimate::fallback()),
        };

        let decision = apply_octave_policy(raw.center, &raw.values, &self.config.octave);
        let primary = decision.bpm.round();
        log::debug!("Energy-peak tempo: {:.2} -> {} BPM ({:?})", raw.center, primary, decision.correction);

        Ok(TempoEstimate {
            primary,
            confidence: raw.support.clamp(0.0, 1.0),
            candidates: build_candidates(decision.bpm),
            beats: raw.beats,
            is_fallback: false,
        })
    }
}
