//! Tempo (period) estimation
//!
//! Two strategies share one output contract and the same helpers:
//! - [`energy_peaks::EnergyPeakTempo`]: RMS envelope peaks → interval histogram
//! - [`spectral::SpectralOnsetTempo`]: spectral onsets → autocorrelation +
//!   dynamic-programming beat tracking
//!
//! Both fall back to [`TempoEstimate::fallback`] when fewer than two peaks or
//! onsets are found.

pub mod autocorrelation;
pub mod candidate_filter;
pub mod drift;
pub mod energy_peaks;
pub mod octave;
pub mod peak_picking;
pub mod spectral;

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Tempo used whenever no periodicity can be found
pub const FALLBACK_BPM: f32 = 120.0;

/// Candidate confidence attached to the fallback tempo
pub const FALLBACK_CANDIDATE_CONFIDENCE: f32 = 0.5;

/// Metrical interpretation of a tempo candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateLabel {
    /// Half of the central estimate
    HalfTime,
    /// The central estimate itself
    Detected,
    /// 1.5× the central estimate
    OneAndHalf,
    /// Twice the central estimate
    DoubleTime,
}

impl CandidateLabel {
    /// Short label used in reports and persisted records
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateLabel::HalfTime => "half-time",
            CandidateLabel::Detected => "detected",
            CandidateLabel::OneAndHalf => "1.5x",
            CandidateLabel::DoubleTime => "double-time",
        }
    }
}

/// BPM candidate with confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpmCandidate {
    /// BPM value
    pub value: f32,

    /// Heuristic confidence (0.0-1.0)
    pub confidence: f32,

    /// Interpretation relative to the central estimate
    pub label: CandidateLabel,
}

/// Output of a tempo strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Primary BPM
    pub primary: f32,

    /// Confidence in the primary BPM (0.0 for the fallback)
    pub confidence: f32,

    /// Alternate interpretations, highest confidence first
    pub candidates: Vec<BpmCandidate>,

    /// Beat times in seconds, when the strategy tracks beats
    pub beats: Vec<f32>,

    /// True when no periodicity was found
    pub is_fallback: bool,
}

impl TempoEstimate {
    /// The fixed result for silent or onset-poor audio
    pub fn fallback() -> Self {
        Self {
            primary: FALLBACK_BPM,
            confidence: 0.0,
            candidates: vec![BpmCandidate {
                value: FALLBACK_BPM,
                confidence: FALLBACK_CANDIDATE_CONFIDENCE,
                label: CandidateLabel::Detected,
            }],
            beats: Vec::new(),
            is_fallback: true,
        }
    }
}

/// A tempo estimation strategy
///
/// Implementations must honour the common contract: the primary BPM lies in
/// the configured range after octave correction, and sparse input yields
/// [`TempoEstimate::fallback`] rather than an error.
pub trait TempoEstimator: Send + Sync {
    /// Strategy name for logs and metadata
    fn name(&self) -> &'static str;

    /// Estimate the tempo of mono samples
    ///
    /// # Errors
    ///
    /// Only for invalid input (e.g. zero sample rate); sparse or silent
    /// audio returns the fallback estimate.
    fn estimate(&self, samples: &[f32], sample_rate: u32) -> Result<TempoEstimate, AnalysisError>;
}
