//! Transition planning
//!
//! Turns two tracks into concrete instructions for an external playback
//! controller: where to mix out and in, how long and how hard to crossfade,
//! how to handle tempo and EQ, and what the keys imply.

use super::harmonic::{harmonic_advice, HarmonicAdvice};
use super::track::Track;
use serde::{Deserialize, Serialize};

/// Mix-out distance from the end when the outgoing track has no cue-out
pub const DEFAULT_MIX_OUT_LEAD_SECS: f32 = 30.0;

/// Mix-in point when the incoming track has no cue-in
pub const DEFAULT_MIX_IN_SECS: f32 = 16.0;

/// Crossfade style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossfadeStrategy {
    /// Short fade for moderate energy jumps
    QuickCut,
    /// Long blend for similar energy
    SmoothBlend,
    /// Hard cut for large energy jumps
    DramaticCut,
}

impl CrossfadeStrategy {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossfadeStrategy::QuickCut => "quick_cut",
            CrossfadeStrategy::SmoothBlend => "smooth_blend",
            CrossfadeStrategy::DramaticCut => "dramatic_cut",
        }
    }
}

/// Tempo handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BpmStrategy {
    /// Beat-match directly
    MatchTempo,
    /// Ramp the tempo over the transition
    GradualTempoChange,
}

/// Low-band handover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BassSwap {
    /// Swap basses on a phrase boundary
    Quick,
    /// Crossfade basses
    Gradual,
}

/// Mid/high band treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandTreatment {
    /// Leave as is
    Maintain,
    /// Lift the incoming track
    EnhanceIncoming,
}

/// Per-band EQ plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqStrategy {
    /// Low band
    pub bass_swap: BassSwap,
    /// Mid band
    pub mid_range: BandTreatment,
    /// High band
    pub high_freq: BandTreatment,
}

impl Default for EqStrategy {
    fn default() -> Self {
        Self {
            bass_swap: BassSwap::Gradual,
            mid_range: BandTreatment::Maintain,
            high_freq: BandTreatment::EnhanceIncoming,
        }
    }
}

/// Everything the playback controller needs for one transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixInstructions {
    /// Position in the outgoing track to start the transition (seconds)
    pub mix_out_point: f32,
    /// Position in the incoming track to start playback (seconds)
    pub mix_in_point: f32,
    /// Crossfade style
    pub crossfade_strategy: CrossfadeStrategy,
    /// Crossfade length in seconds
    pub crossfade_duration: f32,
    /// Tempo handling
    pub bpm_strategy: BpmStrategy,
    /// EQ plan
    pub eq_strategy: EqStrategy,
    /// Key guidance
    pub harmonic_advice: HarmonicAdvice,
    /// Data availability: 0.2 per field present on both tracks
    pub confidence: f32,
}

/// Builds [`MixInstructions`] for a pair of tracks
#[derive(Debug, Clone, Copy, Default)]
pub struct MixPlanner;

impl MixPlanner {
    /// Create a planner
    pub fn new() -> Self {
        Self
    }

    /// Plan the transition from `a` to `b`
    pub fn plan(&self, a: &Track, b: &Track) -> MixInstructions {
        let bpm_a = a.bpm_or_default();
        let bpm_b = b.bpm_or_default();
        let energy_a = a.energy_or_default();
        let energy_b = b.energy_or_default();
        let energy_gap = (energy_a - energy_b).abs();

        let crossfade_strategy = if energy_gap < 0.2 {
            CrossfadeStrategy::SmoothBlend
        } else if energy_gap > 0.5 {
            CrossfadeStrategy::DramaticCut
        } else {
            CrossfadeStrategy::QuickCut
        };

        let bars = if energy_gap > 0.3 { 2.0 } else { 4.0 };
        let crossfade_duration = bars * 4.0 * (60.0 / bpm_a);

        let ratio = bpm_b / bpm_a;
        let bpm_strategy = if !(0.95..=1.05).contains(&ratio) {
            BpmStrategy::GradualTempoChange
        } else {
            BpmStrategy::MatchTempo
        };

        let instructions = MixInstructions {
            mix_out_point: mix_out_point(a),
            mix_in_point: mix_in_point(b),
            crossfade_strategy,
            crossfade_duration,
            bpm_strategy,
            eq_strategy: eq_strategy(energy_a, energy_b),
            harmonic_advice: harmonic_advice(a.camelot(), b.camelot()),
            confidence: data_confidence(a, b),
        };

        log::debug!(
            "Plan {} -> {}: out {:.1}s in {:.1}s, {} over {:.1}s",
            a.id,
            b.id,
            instructions.mix_out_point,
            instructions.mix_in_point,
            instructions.crossfade_strategy.as_str(),
            instructions.crossfade_duration
        );
        instructions
    }

    /// Fixed instructions used when selection falls back
    ///
    /// Keeps the planned mix points, harmonic advice and data confidence but
    /// forces the crossfade style and length and a straight tempo match.
    pub fn fallback(
        &self,
        a: &Track,
        b: &Track,
        strategy: CrossfadeStrategy,
        duration: f32,
    ) -> MixInstructions {
        MixInstructions {
            mix_out_point: mix_out_point(a),
            mix_in_point: mix_in_point(b),
            crossfade_strategy: strategy,
            crossfade_duration: duration,
            bpm_strategy: BpmStrategy::MatchTempo,
            eq_strategy: EqStrategy::default(),
            harmonic_advice: harmonic_advice(a.camelot(), b.camelot()),
            confidence: data_confidence(a, b),
        }
    }
}

/// `cue_out`, else `duration − 30` (never negative)
pub fn mix_out_point(track: &Track) -> f32 {
    track
        .cue_out
        .unwrap_or_else(|| (track.duration.unwrap_or(0.0) - DEFAULT_MIX_OUT_LEAD_SECS).max(0.0))
}

/// `cue_in`, else 16 s
pub fn mix_in_point(track: &Track) -> f32 {
    track.cue_in.unwrap_or(DEFAULT_MIX_IN_SECS)
}

fn eq_strategy(energy_a: f32, energy_b: f32) -> EqStrategy {
    let mut eq = EqStrategy::default();
    let delta = energy_b - energy_a;
    if delta > 0.2 {
        eq.bass_swap = BassSwap::Quick;
    } else if delta < -0.2 {
        eq.high_freq = BandTreatment::Maintain;
    }
    eq
}

fn data_confidence(a: &Track, b: &Track) -> f32 {
    let pairs = [
        a.bpm.is_some() && b.bpm.is_some(),
        a.has_key() && b.has_key(),
        a.cue_in.is_some() && b.cue_in.is_some(),
        a.energy.is_some() && b.energy.is_some(),
        a.duration.is_some() && b.duration.is_some(),
    ];
    pairs.iter().filter(|&&present| present).count() as f32 * 0.2
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn track(id: &str, bpm: f32, energy: f32) -> Track {
        let mut t = Track::new(id, id, "");
        t.bpm = Some(bpm);
        t.energy = Some(energy);
        t
    }

    #[test]
    fn test_similar_energy_blends() {
        let a = track("a", 120.0, 0.5);
        let b = track("b", 122.0, 0.6);
        let plan = MixPlanner::new().plan(&a, &b);
        assert_eq!(plan.crossfade_strategy, CrossfadeStrategy::SmoothBlend);
        assert_relative_eq!(plan.crossfade_duration, 8.0);
        assert_eq!(plan.bpm_strategy, BpmStrategy::MatchTempo);
        assert_eq!(plan.eq_strategy, EqStrategy::default());
    }

    #[test]
    fn test_large_energy_jump() {
        let a = track("a", 120.0, 0.2);
        let b = track("b", 140.0, 0.9);
        let plan = MixPlanner::new().plan(&a, &b);
        assert_eq!(plan.crossfade_strategy, CrossfadeStrategy::DramaticCut);
        assert_relative_eq!(plan.crossfade_duration, 4.0);
        assert_eq!(plan.bpm_strategy, BpmStrategy::GradualTempoChange);
        assert_eq!(plan.eq_strategy.bass_swap, BassSwap::Quick);
    }

    #[test]
    fn test_energy_drop_keeps_highs() {
        let a = track("a", 128.0, 0.8);
        let b = track("b", 128.0, 0.45);
        let plan = MixPlanner::new().plan(&a, &b);
        assert_eq!(plan.crossfade_strategy, CrossfadeStrategy::QuickCut);
        assert_eq!(plan.eq_strategy.high_freq, BandTreatment::Maintain);
        assert_eq!(plan.eq_strategy.bass_swap, BassSwap::Gradual);
    }

    #[test]
    fn test_mix_points() {
        let mut a = track("a", 120.0, 0.5).with_duration(240.0);
        let b = track("b", 120.0, 0.5);
        let plan = MixPlanner::new().plan(&a, &b);
        assert_eq!(plan.mix_out_point, 210.0);
        assert_eq!(plan.mix_in_point, 16.0);
        a.cue_out = Some(225.5);
        assert_eq!(mix_out_point(&a), 225.5);
    }

    #[test]
    fn test_confidence_counts_shared_fields() {
        let a = track("a", 120.0, 0.5);
        let b = track("b", 120.0, 0.5);
        assert_relative_eq!(MixPlanner::new().plan(&a, &b).confidence, 0.4);
        let bare = Track::new("c", "", "");
        assert_eq!(MixPlanner::new().plan(&a, &bare).confidence, 0.0);
    }
}
