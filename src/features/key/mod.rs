//! Key detection
//!
//! Chroma profile → 24 scale templates → ranked keys → Camelot code.

pub mod camelot;
pub mod detector;
pub mod templates;

pub use camelot::{CamelotKey, CamelotLetter};
pub use detector::{detect_key, KeyEstimator};
pub use templates::KeyTemplates;

use crate::analysis::result::Key;
use serde::{Deserialize, Serialize};

/// One ranked key hypothesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyCandidate {
    /// Key hypothesis
    pub key: Key,

    /// Raw template match score
    pub score: f32,

    /// `(score − min) / (max − min)` over all 24 hypotheses
    pub confidence: f32,
}

/// Key detection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDetectionResult {
    /// Best-matching key
    pub key: Key,

    /// Separation of the winner from the runner-up (0.0-1.0)
    pub confidence: f32,

    /// Top-ranked hypotheses, best first
    pub candidates: Vec<KeyCandidate>,
}

/// Output of the key estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    /// Primary key, `None` when the chroma profile was degenerate
    pub primary: Option<Key>,

    /// Confidence in the primary key (0.0 when absent)
    pub confidence: f32,

    /// Ranked candidates (empty when absent)
    pub candidates: Vec<KeyCandidate>,

    /// Camelot code of the primary key
    pub camelot: Option<CamelotKey>,

    /// Informational tuning offset in semitones
    pub tuning_offset: Option<f32>,

    /// Why no key was produced
    pub error: Option<String>,
}

impl KeyEstimate {
    /// Result for audio without usable tonal content
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            primary: None,
            confidence: 0.0,
            candidates: Vec::new(),
            camelot: None,
            tuning_offset: None,
            error: Some(reason.into()),
        }
    }
}
