//! Harmonic compatibility on the Camelot wheel
//!
//! Relationships between an outgoing key A and an incoming key B:
//!
//! | Relation  | Example     | Score |
//! |-----------|-------------|-------|
//! | Same      | 8A → 8A     | 1.0   |
//! | Adjacent  | 8A → 9A     | 0.9   |
//! | Relative  | 8A → 8B     | 0.9   |
//! | Diagonal  | 8A → 9B     | 0.7   |
//! | Distant   | 8A → 3B     | 0.3   |
//!
//! A missing key on either side scores 0.5.

use crate::features::key::CamelotKey;
use serde::{Deserialize, Serialize};

/// Score when either key is unknown
pub const UNKNOWN_KEY_SCORE: f32 = 0.5;

/// How two Camelot positions relate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CamelotRelation {
    /// Identical code
    Same,
    /// One step around the wheel, same letter
    Adjacent,
    /// Same number, opposite letter (relative major/minor)
    Relative,
    /// One step around the wheel, opposite letter
    Diagonal,
    /// Anything further away
    Distant,
}

impl CamelotRelation {
    /// Classify the move from `a` to `b`
    pub fn classify(a: CamelotKey, b: CamelotKey) -> Self {
        let steps = a.wheel_distance(&b);
        let same_letter = a.letter() == b.letter();
        match (steps, same_letter) {
            (0, true) => CamelotRelation::Same,
            (0, false) => CamelotRelation::Relative,
            (1, true) => CamelotRelation::Adjacent,
            (1, false) => CamelotRelation::Diagonal,
            _ => CamelotRelation::Distant,
        }
    }

    /// Harmonic sub-score
    pub fn score(self) -> f32 {
        match self {
            CamelotRelation::Same => 1.0,
            CamelotRelation::Adjacent | CamelotRelation::Relative => 0.9,
            CamelotRelation::Diagonal => 0.7,
            CamelotRelation::Distant => 0.3,
        }
    }
}

/// Harmonic sub-score for two optional keys
pub fn harmonic_score(a: Option<CamelotKey>, b: Option<CamelotKey>) -> f32 {
    match (a, b) {
        (Some(a), Some(b)) => CamelotRelation::classify(a, b).score(),
        _ => UNKNOWN_KEY_SCORE,
    }
}

/// Text guidance for a DJ plus how much to trust it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicAdvice {
    /// Guidance text
    pub advice: String,
    /// Confidence (0.0-1.0)
    pub confidence: f32,
}

impl HarmonicAdvice {
    fn new(advice: &str, confidence: f32) -> Self {
        Self {
            advice: advice.to_string(),
            confidence,
        }
    }
}

/// Transition advice for the move from `a` to `b`
///
/// Derived from the relationship alone, independent of the numeric score.
/// A relative move (8A to 8B) gets its own energy lift/drop advice at 0.8,
/// while [`harmonic_score`] rates the same pair 0.9 as a perfect neighbour.
pub fn harmonic_advice(a: Option<CamelotKey>, b: Option<CamelotKey>) -> HarmonicAdvice {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return HarmonicAdvice::new("Unknown keys - use ear to judge compatibility", 0.3),
    };

    match CamelotRelation::classify(a, b) {
        CamelotRelation::Same => HarmonicAdvice::new("Same key - perfect harmonic match", 1.0),
        CamelotRelation::Adjacent => {
            HarmonicAdvice::new("Perfect harmonic transition - mix freely", 0.9)
        }
        CamelotRelation::Relative if b.is_minor() => {
            HarmonicAdvice::new("Relative minor - energy drop", 0.8)
        }
        CamelotRelation::Relative => HarmonicAdvice::new("Relative major - energy lift", 0.8),
        CamelotRelation::Diagonal => {
            HarmonicAdvice::new("Good harmonic match - smooth transition", 0.7)
        }
        CamelotRelation::Distant => HarmonicAdvice::new(
            "Challenging key change - use quick cut or prepare carefully",
            0.3,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ck(code: &str) -> CamelotKey {
        code.parse().unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(CamelotRelation::classify(ck("8A"), ck("8A")), CamelotRelation::Same);
        assert_eq!(CamelotRelation::classify(ck("8A"), ck("9A")), CamelotRelation::Adjacent);
        assert_eq!(CamelotRelation::classify(ck("12B"), ck("1B")), CamelotRelation::Adjacent);
        assert_eq!(CamelotRelation::classify(ck("8A"), ck("8B")), CamelotRelation::Relative);
        assert_eq!(CamelotRelation::classify(ck("1A"), ck("12B")), CamelotRelation::Diagonal);
        assert_eq!(CamelotRelation::classify(ck("8A"), ck("10A")), CamelotRelation::Distant);
        assert_eq!(CamelotRelation::classify(ck("8A"), ck("2B")), CamelotRelation::Distant);
    }

    #[test]
    fn test_scores() {
        assert_eq!(harmonic_score(Some(ck("5B")), Some(ck("5B"))), 1.0);
        assert_eq!(harmonic_score(Some(ck("5B")), Some(ck("4B"))), 0.9);
        assert_eq!(harmonic_score(Some(ck("5B")), Some(ck("6A"))), 0.7);
        assert_eq!(harmonic_score(Some(ck("5B")), Some(ck("11A"))), 0.3);
        assert_eq!(harmonic_score(None, Some(ck("11A"))), 0.5);
    }

    #[test]
    fn test_advice() {
        assert_eq!(harmonic_advice(Some(ck("8A")), Some(ck("8B"))).advice, "Relative major - energy lift");
        assert_eq!(harmonic_advice(Some(ck("8B")), Some(ck("8A"))).advice, "Relative minor - energy drop");
        assert_eq!(harmonic_advice(Some(ck("8B")), Some(ck("8B"))).confidence, 1.0);
        assert_eq!(harmonic_advice(None, None).confidence, 0.3);
        assert_eq!(harmonic_advice(Some(ck("1A")), Some(ck("7B"))).confidence, 0.3);
    }

    #[test]
    fn test_relative_advice_differs_from_score() {
        let (a, b) = (Some(ck("8A")), Some(ck("8B")));
        assert_eq!(harmonic_score(a, b), 0.9);
        assert_eq!(harmonic_advice(a, b).confidence, 0.8);
        assert_eq!(harmonic_advice(Some(ck("8A")), Some(ck("9A"))).confidence, 0.9);
    }
}
