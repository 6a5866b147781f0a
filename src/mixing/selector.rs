//! Next-track selection
//!
//! Candidates are every library track except the current one and, with
//! `avoid_repeats`, the last `min_track_gap` played. The pool is capped at
//! `max_candidates`, each candidate is scored, totals at or below
//! `min_score` are discarded, and the best remaining total wins. Ties go to
//! the candidate encountered first.
//!
//! When nothing qualifies a random pool member is returned with a fixed low
//! score and blend instructions; when the pool itself is empty any track
//! other than the current one is returned with quick-cut instructions.

use super::planner::{CrossfadeStrategy, MixInstructions, MixPlanner};
use super::scorer::{CompatibilityScore, CompatibilityScorer};
use super::track::{MixContext, Track};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Score reported for a random pick from a non-empty pool
pub const FALLBACK_POOL_SCORE: f32 = 0.4;

/// Score reported for a pick from outside the pool
pub const FALLBACK_ANY_SCORE: f32 = 0.3;

/// Crossfade length of the quick-cut fallback
pub const FALLBACK_QUICK_CUT_SECS: f32 = 8.0;

/// Selection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSettings {
    /// Exclude recently played tracks (default: true)
    pub avoid_repeats: bool,

    /// How many recent plays to exclude (default: 5)
    pub min_track_gap: usize,

    /// Pool size cap (default: 100)
    pub max_candidates: usize,

    /// Totals at or below this are discarded (default: 0.3)
    pub min_score: f32,

    /// Crossfade length for the blend fallback (default: 16.0 s)
    pub crossfade_secs: f32,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            avoid_repeats: true,
            min_track_gap: 5,
            max_candidates: 100,
            min_score: 0.3,
            crossfade_secs: 16.0,
        }
    }
}

/// How the chosen track was scored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SelectionScore {
    /// Full compatibility score
    Scored(CompatibilityScore),
    /// Fixed score of a fallback pick
    Fallback {
        /// Reported total
        total: f32,
    },
}

impl SelectionScore {
    /// Total in [0, 1]
    pub fn total(&self) -> f32 {
        match self {
            SelectionScore::Scored(score) => score.total,
            SelectionScore::Fallback { total } => *total,
        }
    }

    /// True for fallback picks
    pub fn is_fallback(&self) -> bool {
        matches!(self, SelectionScore::Fallback { .. })
    }
}

/// A chosen next track with its transition plan
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The track
    pub track: Track,
    /// Why it was chosen
    pub score: SelectionScore,
    /// How to mix into it
    pub instructions: MixInstructions,
}

/// Scores candidates and picks the next track
#[derive(Debug, Clone, Default)]
pub struct TrackSelector {
    scorer: CompatibilityScorer,
    planner: MixPlanner,
    settings: SelectionSettings,
}

impl TrackSelector {
    /// Selector with the given scorer and settings
    pub fn new(scorer: CompatibilityScorer, settings: SelectionSettings) -> Self {
        Self {
            scorer,
            planner: MixPlanner::new(),
            settings,
        }
    }

    /// The scorer
    pub fn scorer(&self) -> &CompatibilityScorer {
        &self.scorer
    }

    /// The planner
    pub fn planner(&self) -> &MixPlanner {
        &self.planner
    }

    /// The settings
    pub fn settings(&self) -> &SelectionSettings {
        &self.settings
    }

    /// Candidate pool for `current`, in library order
    ///
    /// `history` holds played track ids, oldest first.
    pub fn candidate_pool<'a>(&self, current: &Track, library: &'a [Track], history: &[String]) -> Vec<&'a Track> {
        let recent: &[String] = if self.settings.avoid_repeats {
            &history[history.len().saturating_sub(self.settings.min_track_gap)..]
        } else {
            &[]
        };

        library
            .iter()
            .filter(|t| t.id != current.id && !recent.contains(&t.id))
            .take(self.settings.max_candidates)
            .collect()
    }

    /// Best-scoring candidate above `min_score`
    ///
    /// Candidates are taken as given (no pool filtering). Returns `None` when
    /// nothing clears the threshold.
    pub fn find_optimal_next_track<'a, I>(&self, current: &Track, candidates: I, context: &MixContext) -> Option<Selection>
    where
        I: IntoIterator<Item = &'a Track>,
    {
        let mut scored: Vec<(&Track, CompatibilityScore)> = candidates
            .into_iter()
            .map(|candidate| (candidate, self.scorer.score(current, candidate, context)))
            .filter(|(_, score)| score.total > self.settings.min_score)
            .collect();

        // Stable: equal totals keep their encounter order
        scored.sort_by(|a, b| b.1.total.partial_cmp(&a.1.total).unwrap_or(Ordering::Equal));

        log::debug!("Found {} compatible tracks", scored.len());

        scored.into_iter().next().map(|(track, score)| Selection {
            track: track.clone(),
            score: SelectionScore::Scored(score),
            instructions: self.planner.plan(current, track),
        })
    }

    /// Choose the next track, falling back rather than failing
    ///
    /// # Returns
    ///
    /// `None` only when the library holds no track other than `current`
    pub fn select_next<R: Rng + ?Sized>(
        &self,
        current: &Track,
        library: &[Track],
        history: &[String],
        context: &MixContext,
        rng: &mut R,
    ) -> Option<Selection> {
        let pool = self.candidate_pool(current, library, history);

        if let Some(selection) = self.find_optimal_next_track(current, pool.iter().copied(), context) {
            log::info!(
                "Next track: {} (score {:.3})",
                selection.track.id,
                selection.score.total()
            );
            return Some(selection);
        }

        if let Some(&track) = pool.choose(rng) {
            log::warn!(
                "No candidate above {:.2}; random pick {} from {} candidates",
                self.settings.min_score,
                track.id,
                pool.len()
            );
            return Some(Selection {
                track: track.clone(),
                score: SelectionScore::Fallback {
                    total: FALLBACK_POOL_SCORE,
                },
                instructions: self.planner.fallback(
                    current,
                    track,
                    CrossfadeStrategy::SmoothBlend,
                    self.settings.crossfade_secs,
                ),
            });
        }

        let others: Vec<&Track> = library.iter().filter(|t| t.id != current.id).collect();
        let track = *others.choose(rng)?;
        log::warn!("Candidate pool empty; falling back to {}", track.id);
        Some(Selection {
            track: track.clone(),
            score: SelectionScore::Fallback {
                total: FALLBACK_ANY_SCORE,
            },
            instructions: self.planner.fallback(
                current,
                track,
                CrossfadeStrategy::QuickCut,
                FALLBACK_QUICK_CUT_SECS,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn track(id: &str, bpm: f32, energy: f32, camelot: &str) -> Track {
        let mut t = Track::new(id, id, "").with_duration(240.0);
        t.bpm = Some(bpm);
        t.energy = Some(energy);
        t.camelot_key = Some(camelot.parse().unwrap());
        t
    }

    fn context() -> MixContext {
        MixContext {
            current_hour: Some(15),
            ..MixContext::default()
        }
    }

    #[test]
    fn test_pool_excludes_current_and_recent() {
        let library: Vec<Track> = (0..8).map(|i| track(&i.to_string(), 120.0, 0.5, "8A")).collect();
        let selector = TrackSelector::default();
        let history: Vec<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
        let pool = selector.candidate_pool(&library[0], &library, &history);
        let ids: Vec<&str> = pool.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "5", "6", "7"]);
    }

    #[test]
    fn test_pool_only_excludes_gap() {
        let library: Vec<Track> = (0..4).map(|i| track(&i.to_string(), 120.0, 0.5, "8A")).collect();
        let settings = SelectionSettings {
            min_track_gap: 1,
            ..SelectionSettings::default()
        };
        let selector = TrackSelector::new(CompatibilityScorer::default(), settings);
        let history = vec!["1".to_string(), "2".to_string()];
        let ids: Vec<String> = selector
            .candidate_pool(&library[0], &library, &history)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_best_candidate_wins() {
        let current = track("cur", 126.0, 0.6, "8A");
        let candidates = vec![
            track("far", 90.0, 0.1, "2B"),
            track("close", 126.0, 0.6, "9A"),
            track("same", 126.0, 0.6, "8A"),
        ];
        let selection = TrackSelector::default()
            .find_optimal_next_track(&current, &candidates, &context())
            .unwrap();
        assert_eq!(selection.track.id, "same");
        assert!(!selection.score.is_fallback());
    }

    #[test]
    fn test_ties_keep_first() {
        let current = track("cur", 126.0, 0.6, "8A");
        let candidates = vec![track("first", 126.0, 0.6, "8A"), track("second", 126.0, 0.6, "8A")];
        let selection = TrackSelector::default()
            .find_optimal_next_track(&current, &candidates, &context())
            .unwrap();
        assert_eq!(selection.track.id, "first");
    }

    #[test]
    fn test_fallback_when_nothing_qualifies() {
        let settings = SelectionSettings {
            min_score: 0.99,
            ..SelectionSettings::default()
        };
        let selector = TrackSelector::new(CompatibilityScorer::default(), settings);
        let library = vec![
            track("cur", 126.0, 0.6, "8A"),
            track("a", 90.0, 0.1, "2B"),
            track("b", 170.0, 0.9, "3A"),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let selection = selector
            .select_next(&library[0], &library, &[], &context(), &mut rng)
            .unwrap();
        assert_ne!(selection.track.id, "cur");
        assert_eq!(selection.score, SelectionScore::Fallback { total: FALLBACK_POOL_SCORE });
        assert_eq!(selection.instructions.crossfade_strategy, CrossfadeStrategy::SmoothBlend);
        assert_eq!(selection.instructions.crossfade_duration, 16.0);
    }

    #[test]
    fn test_empty_pool_falls_back_to_any_other() {
        let library = vec![track("cur", 126.0, 0.6, "8A"), track("a", 126.0, 0.6, "8A")];
        let history = vec!["a".to_string()];
        let mut rng = StdRng::seed_from_u64(1);
        let selection = TrackSelector::default()
            .select_next(&library[0], &library, &history, &context(), &mut rng)
            .unwrap();
        assert_eq!(selection.track.id, "a");
        assert_eq!(selection.score.total(), FALLBACK_ANY_SCORE);
        assert_eq!(selection.instructions.crossfade_strategy, CrossfadeStrategy::QuickCut);
        assert_eq!(selection.instructions.crossfade_duration, 8.0);
    }

    #[test]
    fn test_lone_track_returns_none() {
        let library = vec![track("cur", 126.0, 0.6, "8A")];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(TrackSelector::default()
            .select_next(&library[0], &library, &[], &context(), &mut rng)
            .is_none());
    }
}
