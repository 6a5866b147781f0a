//! Half/double-time correction
//!
//! Applies [`OctavePolicy`] to a central tempo estimate. Estimates below the
//! slow threshold are tested against the doubled reading of the same BPM
//! values, estimates above the fast threshold against the halved reading.
//! The alternative is adopted when its standard deviation stays within
//! `std_dev_tolerance` times the original's.
//!
//! Scaling every value by a factor scales the standard deviation by the same
//! factor, so with the default tolerance of 1.5 halving is always accepted
//! while doubling is only accepted for perfectly regular intervals. The
//! calibration harness can search other tolerances.

use super::candidate_filter::std_dev;
use crate::config::OctavePolicy;
use serde::{Deserialize, Serialize};

/// What the policy did to the estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OctaveCorrection {
    /// Estimate kept
    Unchanged,
    /// Slow estimate promoted to double time
    Doubled,
    /// Fast estimate demoted to half time
    Halved,
}

/// Corrected estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctaveDecision {
    /// BPM after correction
    pub bpm: f32,
    /// Applied correction
    pub correction: OctaveCorrection,
}

/// Apply the octave policy
///
/// # Arguments
///
/// * `estimate` - Central BPM estimate
/// * `values` - The BPM values the estimate was derived from
/// * `policy` - Thresholds and tolerance
pub fn apply_octave_policy(estimate: f32, values: &[f32], policy: &OctavePolicy) -> OctaveDecision {
    let unchanged = OctaveDecision {
        bpm: estimate,
        correction: OctaveCorrection::Unchanged,
    };
    if !policy.enabled || values.is_empty() {
        return unchanged;
    }

    let (factor, correction) = if estimate < policy.slow_threshold {
        (2.0, OctaveCorrection::Doubled)
    } else if estimate > policy.fast_threshold {
        (0.5, OctaveCorrection::Halved)
    } else {
        return unchanged;
    };

    let original_spread = std_dev(values);
    let scaled: Vec<f32> = values.iter().map(|v| v * factor).collect();
    let scaled_spread = std_dev(&scaled);

    if scaled_spread <= original_spread * policy.std_dev_tolerance {
        log::debug!(
            "Octave policy: {:.1} BPM -> {:.1} BPM ({:?}, spread {:.3} vs {:.3})",
            estimate,
            estimate * factor,
            correction,
            scaled_spread,
            original_spread
        );
        OctaveDecision {
            bpm: estimate * factor,
            correction,
        }
    } else {
        unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_slow_tempo_is_doubled() {
        let values = vec![66.0; 12];
        let decision = apply_octave_policy(66.0, &values, &OctavePolicy::default());
        assert_eq!(decision.correction, OctaveCorrection::Doubled);
        assert!((decision.bpm - 132.0).abs() < 1e-4);
    }

    #[test]
    fn test_jittery_slow_tempo_is_kept() {
        let values = vec![64.0, 66.0, 68.0, 66.0];
        let decision = apply_octave_policy(66.0, &values, &OctavePolicy::default());
        assert_eq!(decision.correction, OctaveCorrection::Unchanged);
        assert_eq!(decision.bpm, 66.0);
    }

    #[test]
    fn test_fast_tempo_is_halved() {
        let values = vec![170.0, 172.0, 174.0];
        let decision = apply_octave_policy(172.0, &values, &OctavePolicy::default());
        assert_eq!(decision.correction, OctaveCorrection::Halved);
        assert!((decision.bpm - 86.0).abs() < 1e-4);
    }

    #[test]
    fn test_mid_tempo_untouched() {
        let decision = apply_octave_policy(120.0, &[120.0, 121.0], &OctavePolicy::default());
        assert_eq!(decision.correction, OctaveCorrection::Unchanged);
    }

    #[test]
    fn test_disabled_policy() {
        let policy = OctavePolicy {
            enabled: false,
            ..OctavePolicy::default()
        };
        let decision = apply_octave_policy(66.0, &[66.0; 4], &policy);
        assert_eq!(decision.bpm, 66.0);
    }

    #[test]
    fn test_wide_tolerance_doubles_jittery_tempo() {
        let policy = OctavePolicy {
            std_dev_tolerance: 2.0,
            ..OctavePolicy::default()
        };
        let decision = apply_octave_policy(66.0, &[64.0, 66.0, 68.0], &policy);
        assert_eq!(decision.correction, OctaveCorrection::Doubled);
    }
}
