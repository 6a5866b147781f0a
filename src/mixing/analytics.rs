//! Transition history and empirical success rates
//!
//! A bounded FIFO log of [`MixOutcome`]s. Once `capacity` entries are held,
//! each new outcome evicts the oldest. Reads take a shared lock, so
//! concurrent scoring threads never block each other.

use super::track::{Track, DEFAULT_BPM, DEFAULT_ENERGY};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default history length
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Rate reported when no similar transition has been recorded
pub const NO_HISTORY_RATE: f32 = 0.5;

/// The parts of a track that matter for similarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    /// Track id
    pub id: String,
    /// Tempo, if known
    pub bpm: Option<f32>,
    /// Energy on a 0–1 scale, if known
    pub energy: Option<f32>,
}

impl TrackSnapshot {
    fn bpm_or_default(&self) -> f32 {
        self.bpm.unwrap_or(DEFAULT_BPM)
    }

    fn energy_or_default(&self) -> f32 {
        self.energy.unwrap_or(DEFAULT_ENERGY)
    }
}

impl From<&Track> for TrackSnapshot {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            bpm: track.bpm,
            energy: track.energy.map(|_| track.energy_or_default()),
        }
    }
}

/// One completed transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixOutcome {
    /// Outgoing track
    pub from: TrackSnapshot,
    /// Incoming track
    pub to: TrackSnapshot,
    /// Controller/user verdict
    pub success: bool,
    /// Free-form feedback
    pub feedback: Option<String>,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

/// Two tracks are similar when BPM differs by < 10 and energy by < 0.2
fn similar(recorded: &TrackSnapshot, track: &Track) -> bool {
    let bpm_diff = (recorded.bpm_or_default() - track.bpm_or_default()).abs();
    let energy_diff = (recorded.energy_or_default() - track.energy_or_default()).abs();
    bpm_diff < 10.0 && energy_diff < 0.2
}

/// Bounded, thread-safe transition log
#[derive(Debug)]
pub struct PerformanceAnalytics {
    history: RwLock<VecDeque<MixOutcome>>,
    capacity: usize,
}

impl PerformanceAnalytics {
    /// Log holding at most `capacity` outcomes (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an outcome, evicting the oldest when full
    pub fn record(&self, from: &Track, to: &Track, success: bool, feedback: Option<String>) {
        self.push(MixOutcome {
            from: TrackSnapshot::from(from),
            to: TrackSnapshot::from(to),
            success,
            feedback,
            timestamp: Utc::now(),
        });
    }

    /// Append a prebuilt outcome
    pub fn push(&self, outcome: MixOutcome) {
        let mut history = self.history.write();
        while history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(outcome);
    }

    /// Share of successful transitions between tracks similar to `a` and `b`
    ///
    /// # Returns
    ///
    /// `successful / total` over matching history, or 0.5 when nothing matches
    pub fn success_rate(&self, a: &Track, b: &Track) -> f32 {
        let history = self.history.read();
        let (total, successful) = history
            .iter()
            .filter(|m| similar(&m.from, a) && similar(&m.to, b))
            .fold((0usize, 0usize), |(total, ok), m| {
                (total + 1, ok + usize::from(m.success))
            });

        if total == 0 {
            NO_HISTORY_RATE
        } else {
            successful as f32 / total as f32
        }
    }

    /// Number of recorded outcomes
    pub fn len(&self) -> usize {
        self.history.read().len()
    }

    /// True if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.history.read().is_empty()
    }

    /// Maximum number of outcomes kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the log, oldest first
    pub fn snapshot(&self) -> Vec<MixOutcome> {
        self.history.read().iter().cloned().collect()
    }

    /// Drop all outcomes
    pub fn clear(&self) {
        self.history.write().clear();
    }
}

impl Default for PerformanceAnalytics {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, bpm: f32, energy: f32) -> Track {
        let mut t = Track::new(id, id, "");
        t.bpm = Some(bpm);
        t.energy = Some(energy);
        t
    }

    #[test]
    fn test_no_history_is_neutral() {
        let analytics = PerformanceAnalytics::default();
        assert_eq!(analytics.success_rate(&track("a", 120.0, 0.5), &track("b", 124.0, 0.6)), 0.5);
    }

    #[test]
    fn test_success_rate_over_similar_pairs() {
        let analytics = PerformanceAnalytics::default();
        analytics.record(&track("a", 120.0, 0.5), &track("b", 125.0, 0.6), true, None);
        analytics.record(&track("c", 122.0, 0.55), &track("d", 126.0, 0.65), false, None);
        analytics.record(&track("e", 121.0, 0.5), &track("f", 124.0, 0.6), true, None);
        // Not similar: tempo too far
        analytics.record(&track("g", 170.0, 0.5), &track("h", 124.0, 0.6), false, None);

        let rate = analytics.success_rate(&track("x", 121.0, 0.52), &track("y", 125.0, 0.62));
        assert!((rate - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_fifo_eviction() {
        let analytics = PerformanceAnalytics::new(3);
        for i in 0..5 {
            analytics.record(&track(&i.to_string(), 120.0, 0.5), &track("z", 120.0, 0.5), true, None);
        }
        let ids: Vec<String> = analytics.snapshot().into_iter().map(|m| m.from.id).collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
        assert_eq!(analytics.len(), 3);
    }

    #[test]
    fn test_missing_data_uses_defaults() {
        let analytics = PerformanceAnalytics::default();
        analytics.record(&Track::new("a", "", ""), &Track::new("b", "", ""), false, Some("clash".into()));
        assert_eq!(analytics.success_rate(&track("x", 125.0, 0.4), &track("y", 118.0, 0.6)), 0.0);
    }
}
