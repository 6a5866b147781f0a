//! Multi-factor compatibility scoring
//!
//! Six independent sub-scores in [0, 1], combined with a weight vector that
//! sums to 1.0:
//!
//! | Factor    | Weight | Basis                                      |
//! |-----------|--------|--------------------------------------------|
//! | harmonic  | 0.25   | Camelot relationship                       |
//! | energy    | 0.20   | energy flow against the context target     |
//! | bpm       | 0.20   | best match over common tempo ratios        |
//! | structure | 0.15   | clean intro/outro and track length         |
//! | genre     | 0.10   | genre bucket compatibility                 |
//! | context   | 0.10   | hour of day and set position               |
//!
//! Scoring never fails: missing BPM or energy is replaced by 120 BPM and
//! 0.5 and the sub-score is still computed.

use super::genre::genre_score;
use super::harmonic::harmonic_score;
use super::track::{EnergyTarget, MixContext, SetPosition, Track};
use crate::error::AnalysisError;
use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// Tempo ratios considered mixable (straight, half/double, 3:4, 4:3, 2:3, 3:2)
pub const BPM_RATIOS: [f32; 7] = [1.0, 0.5, 2.0, 0.75, 1.33, 0.66, 1.5];

/// Fade length above which an intro/outro counts as clean
pub const CLEAN_FADE_SECS: f32 = 8.0;

/// Minimum length for both tracks to earn the duration bonus
pub const MIN_MIXABLE_DURATION_SECS: f32 = 180.0;

/// Weight vector for the six sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Harmonic (default: 0.25)
    pub harmonic: f32,
    /// Energy flow (default: 0.20)
    pub energy: f32,
    /// Tempo (default: 0.20)
    pub bpm: f32,
    /// Structure (default: 0.15)
    pub structure: f32,
    /// Genre (default: 0.10)
    pub genre: f32,
    /// Time and set context (default: 0.10)
    pub context: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            harmonic: 0.25,
            energy: 0.20,
            bpm: 0.20,
            structure: 0.15,
            genre: 0.10,
            context: 0.10,
        }
    }
}

impl ScoreWeights {
    /// Weights in factor order
    pub fn as_array(&self) -> [f32; 6] {
        [
            self.harmonic,
            self.energy,
            self.bpm,
            self.structure,
            self.genre,
            self.context,
        ]
    }

    /// Check every weight is non-negative and the sum is 1.0 (±1e-3)
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let weights = self.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Score weights must be non-negative: {:?}",
                weights
            )));
        }
        let sum: f32 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-3 {
            return Err(AnalysisError::InvalidInput(format!(
                "Score weights must sum to 1.0, got {:.4}",
                sum
            )));
        }
        Ok(())
    }
}

/// Result of one scoring call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityScore {
    /// Camelot relationship
    pub harmonic: f32,
    /// Energy flow
    pub energy: f32,
    /// Tempo
    pub bpm: f32,
    /// Structure
    pub structure: f32,
    /// Genre
    pub genre: f32,
    /// Context
    pub context: f32,
    /// Weighted sum, clipped to [0, 1]
    pub total: f32,
    /// Weights used
    pub weights: ScoreWeights,
}

/// Energy sub-score for the move from `a` to `b`
///
/// - `Build`: 1.0 if B is louder, else B/A
/// - `WindDown`: 1.0 if B is quieter, else A/B
/// - `Maintain`: 1 − |A − B|
pub fn energy_score(energy_a: f32, energy_b: f32, target: EnergyTarget) -> f32 {
    let score = match target {
        EnergyTarget::Build if energy_b > energy_a => 1.0,
        EnergyTarget::Build if energy_a > 0.0 => energy_b / energy_a,
        EnergyTarget::WindDown if energy_b < energy_a => 1.0,
        EnergyTarget::WindDown if energy_b > 0.0 => energy_a / energy_b,
        // Both silent
        EnergyTarget::Build | EnergyTarget::WindDown => 1.0,
        EnergyTarget::Maintain => 1.0 - (energy_a - energy_b).abs(),
    };
    score.clamp(0.0, 1.0)
}

/// Tempo sub-score
///
/// For each ratio r in [`BPM_RATIOS`], target = A·r and tolerance =
/// max(2, 2% of target). A ratio contributes 1 − |target − B| / tolerance
/// when B is within tolerance; the best contribution wins.
pub fn bpm_score(bpm_a: f32, bpm_b: f32) -> f32 {
    BPM_RATIOS
        .iter()
        .map(|ratio| {
            let target = bpm_a * ratio;
            let tolerance = (target * 0.02).max(2.0);
            let diff = (target - bpm_b).abs();
            if diff <= tolerance {
                1.0 - diff / tolerance
            } else {
                0.0
            }
        })
        .fold(0.0f32, f32::max)
}

/// Structure sub-score
///
/// Base 0.5, +0.2 each for a clean intro on B, a clean outro on A and both
/// tracks longer than three minutes; capped at 1.0.
pub fn structure_score(a: &Track, b: &Track) -> f32 {
    let clean_intro = b.fade_in_secs.is_some_and(|f| f > CLEAN_FADE_SECS);
    let clean_outro = a.fade_out_secs.is_some_and(|f| f > CLEAN_FADE_SECS);
    let long_enough = a.duration.is_some_and(|d| d > MIN_MIXABLE_DURATION_SECS)
        && b.duration.is_some_and(|d| d > MIN_MIXABLE_DURATION_SECS);

    let bonus = [clean_intro, clean_outro, long_enough]
        .iter()
        .filter(|&&ok| ok)
        .count() as f32
        * 0.2;
    (0.5 + bonus).min(1.0)
}

/// Context sub-score for the incoming track's energy
///
/// Base 0.5; +0.3 for a high-energy track (> 0.7) between 22:00 and 02:00;
/// +0.3 for a low-energy track (< 0.6) between 06:00 and 10:00; +0.2 for
/// low energy (< 0.6) when opening, +0.3 for high energy (> 0.8) at the
/// peak, +0.2 for low energy (< 0.5) when closing. Capped at 1.0.
pub fn context_score(energy_b: f32, position: SetPosition, hour: u32) -> f32 {
    let mut score = 0.5;

    if hour >= 22 || hour <= 2 {
        if energy_b > 0.7 {
            score += 0.3;
        }
    } else if (6..=10).contains(&hour) && energy_b < 0.6 {
        score += 0.3;
    }

    match position {
        SetPosition::Opening if energy_b < 0.6 => score += 0.2,
        SetPosition::Peak if energy_b > 0.8 => score += 0.3,
        SetPosition::Closing if energy_b < 0.5 => score += 0.2,
        _ => {}
    }

    f32::min(score, 1.0)
}

/// Local hour of day
pub fn current_hour() -> u32 {
    chrono::Local::now().hour()
}

/// Weighted compatibility scorer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompatibilityScorer {
    weights: ScoreWeights,
}

impl CompatibilityScorer {
    /// Scorer with custom weights
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the weights are negative or
    /// do not sum to 1.0
    pub fn new(weights: ScoreWeights) -> Result<Self, AnalysisError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    /// Weights in use
    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Score the transition from `a` to `b`
    pub fn score(&self, a: &Track, b: &Track, context: &MixContext) -> CompatibilityScore {
        let energy_a = a.energy_or_default();
        let energy_b = b.energy_or_default();
        let hour = context.current_hour.unwrap_or_else(current_hour);

        let harmonic = harmonic_score(a.camelot(), b.camelot());
        let energy = energy_score(energy_a, energy_b, context.energy_target);
        let bpm = bpm_score(a.bpm_or_default(), b.bpm_or_default());
        let structure = structure_score(a, b);
        let genre = genre_score(a.genre.as_deref(), b.genre.as_deref());
        let context_value = context_score(energy_b, context.set_position, hour);

        let w = &self.weights;
        let total = (harmonic * w.harmonic
            + energy * w.energy
            + bpm * w.bpm
            + structure * w.structure
            + genre * w.genre
            + context_value * w.context)
            .clamp(0.0, 1.0);

        log::debug!(
            "Score {} -> {}: harmonic={:.2} energy={:.2} bpm={:.2} structure={:.2} genre={:.2} context={:.2} total={:.3}",
            a.id,
            b.id,
            harmonic,
            energy,
            bpm,
            structure,
            genre,
            context_value,
            total
        );

        CompatibilityScore {
            harmonic,
            energy,
            bpm,
            structure,
            genre,
            context: context_value,
            total,
            weights: self.weights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_weights_valid() {
        assert!(ScoreWeights::default().validate().is_ok());
        let mut w = ScoreWeights::default();
        w.genre = 0.5;
        assert!(CompatibilityScorer::new(w).is_err());
        w.genre = -0.1;
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_energy_targets() {
        assert_eq!(energy_score(0.4, 0.8, EnergyTarget::Build), 1.0);
        assert_relative_eq!(energy_score(0.8, 0.4, EnergyTarget::Build), 0.5);
        assert_eq!(energy_score(0.8, 0.4, EnergyTarget::WindDown), 1.0);
        assert_relative_eq!(energy_score(0.4, 0.8, EnergyTarget::WindDown), 0.5);
        assert_relative_eq!(energy_score(0.3, 0.5, EnergyTarget::Maintain), 0.8);
        assert_eq!(energy_score(0.0, 0.0, EnergyTarget::Build), 1.0);
        assert_eq!(energy_score(0.0, 0.0, EnergyTarget::WindDown), 1.0);
    }

    #[test]
    fn test_bpm_ratios() {
        assert_eq!(bpm_score(128.0, 128.0), 1.0);
        assert_eq!(bpm_score(128.0, 64.0), 1.0);
        assert_eq!(bpm_score(70.0, 140.0), 1.0);
        assert_relative_eq!(bpm_score(100.0, 101.0), 0.5);
        assert_eq!(bpm_score(120.0, 100.0), 0.0);
    }

    #[test]
    fn test_structure() {
        let mut a = Track::new("a", "", "");
        let mut b = Track::new("b", "", "");
        assert_eq!(structure_score(&a, &b), 0.5);
        b.fade_in_secs = Some(10.0);
        assert_relative_eq!(structure_score(&a, &b), 0.7);
        a.fade_out_secs = Some(12.0);
        a.duration = Some(240.0);
        b.duration = Some(200.0);
        assert_eq!(structure_score(&a, &b), 1.0);
    }

    #[test]
    fn test_context() {
        assert_relative_eq!(context_score(0.9, SetPosition::Peak, 23), 1.0);
        assert_relative_eq!(context_score(0.5, SetPosition::Opening, 8), 1.0);
        assert_relative_eq!(context_score(0.5, SetPosition::Middle, 15), 0.5);
        assert_relative_eq!(context_score(0.4, SetPosition::Closing, 15), 0.7);
        assert_relative_eq!(context_score(0.75, SetPosition::Middle, 1), 0.8);
    }

    #[test]
    fn test_identical_tracks_score_high() {
        let mut track = Track::new("a", "A", "X").with_genre("house").with_duration(300.0);
        track.bpm = Some(126.0);
        track.energy = Some(0.6);
        track.camelot_key = Some("8A".parse().unwrap());
        let ctx = MixContext {
            current_hour: Some(15),
            ..MixContext::default()
        };
        let score = CompatibilityScorer::default().score(&track, &track, &ctx);
        assert_eq!(score.harmonic, 1.0);
        assert_eq!(score.bpm, 1.0);
        assert_eq!(score.energy, 1.0);
        assert!(score.total > 0.8 && score.total <= 1.0);
    }

    #[test]
    fn test_missing_data_uses_defaults() {
        let a = Track::new("a", "", "");
        let b = Track::new("b", "", "");
        let ctx = MixContext {
            current_hour: Some(12),
            ..MixContext::default()
        };
        let score = CompatibilityScorer::default().score(&a, &b, &ctx);
        assert_eq!(score.harmonic, 0.5);
        assert_eq!(score.bpm, 1.0);
        assert_eq!(score.energy, 1.0);
        assert!((0.0..=1.0).contains(&score.total));
    }
}
