//! Key detection algorithm
//!
//! Scores an L2-normalized chroma profile against 24 scale templates
//! (see [`super::templates`]), ranks the hypotheses and maps the winner to
//! Camelot notation.
//!
//! Ranking confidence of each candidate is `(score − min) / (max − min)`
//! (1.0 for every candidate when all scores are equal). The primary key's
//! confidence is the normalized gap between the winner and the runner-up.

use super::camelot::CamelotKey;
use super::templates::{template_score, KeyTemplates};
use super::{KeyCandidate, KeyDetectionResult, KeyEstimate};
use crate::analysis::result::Key;
use crate::config::KeyConfig;
use crate::error::AnalysisError;
use crate::features::chroma::extractor::{build_chroma_profile, compute_spectral_frames};
use crate::features::chroma::tuning::estimate_tuning_offset;

const EPSILON: f32 = 1e-10;

/// Detect the key of a chroma profile
///
/// # Arguments
///
/// * `chroma` - 12-element profile, C first (normalization does not change the ranking)
/// * `templates` - The 24 key templates
/// * `penalty` - Out-of-scale penalty factor (typically 0.5)
/// * `max_candidates` - Number of ranked candidates to keep (typically 5)
///
/// # Errors
///
/// Returns `AnalysisError::NumericalError` for an all-zero or non-finite profile
///
/// # Example
///
/// ```
/// use segue_dsp::analysis::result::Key;
/// use segue_dsp::features::key::{detect_key, KeyTemplates};
/// use segue_dsp::features::key::templates::MAJOR_BASE;
///
/// let result = detect_key(&MAJOR_BASE, &KeyTemplates::new(), 0.5, 5)?;
/// assert_eq!(result.key, Key::Major(0));
/// # Ok::<(), segue_dsp::AnalysisError>(())
/// ```
pub fn detect_key(
    chroma: &[f32; 12],
    templates: &KeyTemplates,
    penalty: f32,
    max_candidates: usize,
) -> Result<KeyDetectionResult, AnalysisError> {
    if chroma.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::NumericalError("Chroma profile contains NaN/inf".to_string()));
    }
    if chroma.iter().map(|v| v.abs()).sum::<f32>() < EPSILON {
        return Err(AnalysisError::NumericalError("Chroma profile is all zeros".to_string()));
    }

    let mut scored: Vec<(Key, f32)> = Vec::with_capacity(24);
    for tonic in 0..12u32 {
        scored.push((Key::Major(tonic), template_score(chroma, &templates.major[tonic as usize], penalty)));
    }
    for tonic in 0..12u32 {
        scored.push((Key::Minor(tonic), template_score(chroma, &templates.minor[tonic as usize], penalty)));
    }

    // Stable sort: equal scores keep major-before-minor, C-first order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let max = scored[0].1;
    let min = scored[scored.len() - 1].1;
    let range = max - min;
    let normalize = |score: f32| if range > EPSILON { (score - min) / range } else { 1.0 };

    let candidates: Vec<KeyCandidate> = scored
        .iter()
        .take(max_candidates.max(1))
        .map(|&(key, score)| KeyCandidate {
            key,
            score,
            confidence: normalize(score),
        })
        .collect();

    let confidence = if range > EPSILON {
        (scored[0].1 - scored[1].1) / range
    } else {
        0.0
    };

    log::debug!(
        "Key: {} (score {:.3}, runner-up {} {:.3}, confidence {:.3})",
        scored[0].0.name(),
        scored[0].1,
        scored[1].0.name(),
        scored[1].1,
        confidence
    );

    Ok(KeyDetectionResult {
        key: scored[0].0,
        confidence,
        candidates,
    })
}

/// Chroma-based key estimator
#[derive(Debug, Clone)]
pub struct KeyEstimator {
    config: KeyConfig,
    templates: KeyTemplates,
}

impl KeyEstimator {
    /// Create an estimator with the given parameters
    pub fn new(config: KeyConfig) -> Self {
        Self {
            config,
            templates: KeyTemplates::new(),
        }
    }

    /// Estimate the key of mono samples
    ///
    /// A degenerate chroma profile (silence, no energy in the melodic band)
    /// yields [`KeyEstimate::fallback`] rather than an error.
    ///
    /// # Errors
    ///
    /// Only for invalid input such as a zero sample rate
    pub fn estimate(&self, samples: &[f32], sample_rate: u32) -> Result<KeyEstimate, AnalysisError> {
        let frames = compute_spectral_frames(samples, sample_rate, &self.config)?;

        let profile = match build_chroma_profile(&frames, &self.config) {
            Ok(profile) => profile,
            Err(AnalysisError::NumericalError(msg)) => {
                log::warn!("Key detection skipped: {}", msg);
                return Ok(KeyEstimate::fallback(msg));
            }
            Err(e) => return Err(e),
        };

        let detection = match detect_key(
            &profile.values,
            &self.templates,
            self.config.out_of_scale_penalty,
            self.config.max_candidates,
        ) {
            Ok(detection) => detection,
            Err(AnalysisError::NumericalError(msg)) => {
                log::warn!("Key detection skipped: {}", msg);
                return Ok(KeyEstimate::fallback(msg));
            }
            Err(e) => return Err(e),
        };

        let tuning_offset = if self.config.estimate_tuning {
            estimate_tuning_offset(&frames, &self.config)
        } else {
            None
        };

        Ok(KeyEstimate {
            primary: Some(detection.key),
            confidence: detection.confidence,
            camelot: Some(CamelotKey::from_key(detection.key)),
            candidates: detection.candidates,
            tuning_offset,
            error: None,
        })
    }
}

impl Default for KeyEstimator {
    fn default() -> Self {
        Self::new(KeyConfig::default())
    }
}
