//! Confidence assessment
//!
//! Turns the raw tempo and key confidences of a finished analysis into an
//! overall score plus flags and human-readable warnings.
//!
//! # Components
//!
//! 1. **BPM confidence**: the strategy's own confidence, zero for the fallback
//! 2. **Key confidence**: winner/runner-up separation, zero without a key
//! 3. **Overall**: 60% BPM, 40% key; a missing component halves the other
//!
//! # Example
//!
//! ```no_run
//! use segue_dsp::{analyze_audio, AnalysisConfig};
//! use segue_dsp::analysis::confidence::compute_confidence;
//!
//! let samples = vec![0.0f32; 44100 * 30];
//! let result = analyze_audio(&samples, 44100, &AnalysisConfig::default());
//! let confidence = compute_confidence(&result);
//!
//! println!("Overall confidence: {:.2}", confidence.overall_confidence);
//! ```

use super::metadata::AnalysisFlag;
use super::result::AnalysisResult;
use serde::{Deserialize, Serialize};

/// BPM confidence under which the tempo is flagged ambiguous
pub const LOW_BPM_CONFIDENCE: f32 = 0.3;

/// Key confidence under which the tonality is flagged weak
pub const LOW_KEY_CONFIDENCE: f32 = 0.2;

/// Absolute drift in BPM that is worth flagging
pub const NOTABLE_DRIFT_BPM: f32 = 2.0;

/// Analysis confidence scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfidence {
    /// BPM confidence (0.0-1.0)
    pub bpm_confidence: f32,

    /// Key confidence (0.0-1.0)
    pub key_confidence: f32,

    /// Weighted combination of the two
    pub overall_confidence: f32,

    /// Flags raised by the assessment
    pub flags: Vec<AnalysisFlag>,

    /// Warnings matching the flags
    pub warnings: Vec<String>,
}

impl AnalysisConfidence {
    /// Overall confidence >= 0.7
    pub fn is_high_confidence(&self) -> bool {
        self.overall_confidence >= 0.7
    }

    /// Overall confidence < 0.5
    pub fn is_low_confidence(&self) -> bool {
        self.overall_confidence < 0.5
    }

    /// "High", "Medium" or "Low"
    pub fn confidence_level(&self) -> &'static str {
        if self.is_high_confidence() {
            "High"
        } else if self.is_low_confidence() {
            "Low"
        } else {
            "Medium"
        }
    }
}

/// Compute confidence scores for an analysis result
///
/// # Arguments
///
/// * `result` - Finished analysis
///
/// # Returns
///
/// Component and overall scores with the flags they imply
pub fn compute_confidence(result: &AnalysisResult) -> AnalysisConfidence {
    let mut flags = Vec::new();
    let mut warnings = Vec::new();

    let bpm_confidence = result.bpm_confidence.clamp(0.0, 1.0);
    let key_confidence = if result.key.is_some() {
        result.key_confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };

    if bpm_confidence < LOW_BPM_CONFIDENCE {
        flags.push(AnalysisFlag::AmbiguousTempo);
        warnings.push(format!("Low BPM confidence ({:.2})", bpm_confidence));
    }
    if result.key.is_some() && key_confidence < LOW_KEY_CONFIDENCE {
        flags.push(AnalysisFlag::WeakTonality);
        warnings.push(format!("Weak tonality: key confidence {:.2}", key_confidence));
    }
    if let Some(drift) = result.tempo_drift {
        if drift.drift.abs() >= NOTABLE_DRIFT_BPM {
            flags.push(AnalysisFlag::TempoDrift);
            warnings.push(format!(
                "Tempo drifts from {:.1} to {:.1} BPM",
                drift.start_bpm, drift.end_bpm
            ));
        }
    }

    let overall_confidence = if bpm_confidence > 0.0 && key_confidence > 0.0 {
        (bpm_confidence * 0.6 + key_confidence * 0.4).clamp(0.0, 1.0)
    } else {
        bpm_confidence.max(key_confidence) * 0.5
    };

    log::debug!(
        "Confidence scores: BPM={:.3}, Key={:.3}, Overall={:.3}",
        bpm_confidence,
        key_confidence,
        overall_confidence
    );

    AnalysisConfidence {
        bpm_confidence,
        key_confidence,
        overall_confidence,
        flags,
        warnings,
    }
}

/// Merge the assessment's flags and warnings into the result metadata
pub fn annotate(result: &mut AnalysisResult) -> AnalysisConfidence {
    let confidence = compute_confidence(result);
    for flag in &confidence.flags {
        result.metadata.flag(*flag);
    }
    for warning in &confidence.warnings {
        if !result.metadata.confidence_warnings.contains(warning) {
            result.metadata.confidence_warnings.push(warning.clone());
        }
    }
    confidence
}
