//! Auto-DJ session state
//!
//! Owns the playable library, play history, the pending transition and the
//! transition log. At most one transition is pending: every call that picks
//! a next track replaces it wholesale under a new generation number, so a
//! playback controller holding an older generation knows its timer is stale.

use super::analytics::PerformanceAnalytics;
use super::planner::MixInstructions;
use super::scorer::current_hour;
use super::selector::{Selection, SelectionScore, SelectionSettings, TrackSelector};
use super::track::{EnergyTarget, MixContext, SetPosition, Track};
use crate::error::AnalysisError;
use crate::events::{EngineEvent, EventBus};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Manual choices scoring below this are logged as risky
pub const RISKY_OVERRIDE_SCORE: f32 = 0.2;

/// Session parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Candidate selection
    pub selection: SelectionSettings,

    /// Energy flow target for every transition (default: maintain)
    pub energy_target: EnergyTarget,

    /// Minimum playable tracks (default: 10)
    pub min_library_size: usize,

    /// Tracks this short or shorter are not playable (default: 120.0 s)
    pub min_duration_secs: f32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            selection: SelectionSettings::default(),
            energy_target: EnergyTarget::Maintain,
            min_library_size: 10,
            min_duration_secs: 120.0,
        }
    }
}

/// The single pending transition
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTransition {
    /// Increases with every (re)schedule
    pub generation: u64,
    /// Incoming track
    pub next: Track,
    /// How it was chosen
    pub score: SelectionScore,
    /// How to mix into it
    pub instructions: MixInstructions,
    /// Position in the current track at which to start the crossfade
    pub start_at_secs: f32,
}

/// Energy window used to pick the opening track
pub fn initial_energy_range(position: SetPosition) -> (f32, f32) {
    match position {
        SetPosition::Opening => (0.3, 0.6),
        SetPosition::Peak => (0.7, 1.0),
        SetPosition::Closing => (0.2, 0.5),
        SetPosition::Middle => (0.3, 0.8),
    }
}

/// An Auto-DJ run over a fixed library
#[derive(Debug)]
pub struct AutoDjSession {
    library: Vec<Track>,
    selector: TrackSelector,
    analytics: Arc<PerformanceAnalytics>,
    settings: SessionSettings,
    current: Option<Track>,
    history: Vec<String>,
    scheduled: Option<ScheduledTransition>,
    generation: u64,
    events: Option<EventBus>,
}

impl AutoDjSession {
    /// Start a session over the playable part of `library`
    ///
    /// Playable means analyzed, with a BPM and longer than
    /// `min_duration_secs`.
    ///
    /// # Errors
    ///
    /// `AnalysisError::InsufficientLibrary` when fewer than
    /// `min_library_size` tracks are playable
    pub fn new(library: Vec<Track>, selector: TrackSelector, settings: SessionSettings) -> Result<Self, AnalysisError> {
        let total = library.len();
        let playable: Vec<Track> = library
            .into_iter()
            .filter(|t| {
                t.analyzed && t.bpm.is_some() && t.duration.is_some_and(|d| d > settings.min_duration_secs)
            })
            .collect();

        if playable.len() < settings.min_library_size {
            return Err(AnalysisError::InsufficientLibrary(format!(
                "{} of {} tracks playable, need {}",
                playable.len(),
                total,
                settings.min_library_size
            )));
        }

        log::info!("Auto-DJ session with {} of {} tracks", playable.len(), total);

        Ok(Self {
            library: playable,
            selector,
            analytics: Arc::new(PerformanceAnalytics::default()),
            settings,
            current: None,
            history: Vec::new(),
            scheduled: None,
            generation: 0,
            events: None,
        })
    }

    /// Record outcomes into a shared log
    pub fn with_analytics(mut self, analytics: Arc<PerformanceAnalytics>) -> Self {
        self.analytics = analytics;
        self
    }

    /// Publish session events on `bus`
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    fn publish(&self, event: EngineEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    /// Playable tracks
    pub fn library(&self) -> &[Track] {
        &self.library
    }

    /// Track now playing
    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Played track ids, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Pending transition
    pub fn scheduled(&self) -> Option<&ScheduledTransition> {
        self.scheduled.as_ref()
    }

    /// Transition log
    pub fn analytics(&self) -> &Arc<PerformanceAnalytics> {
        &self.analytics
    }

    /// Pick a random opening track whose energy suits `position`
    ///
    /// Falls back to any playable track when none is in range. Clears any
    /// pending transition.
    pub fn select_initial_track<R: Rng + ?Sized>(&mut self, position: SetPosition, rng: &mut R) -> Option<&Track> {
        let (low, high) = initial_energy_range(position);
        let in_range: Vec<&Track> = self
            .library
            .iter()
            .filter(|t| {
                let e = t.energy_or_default();
                e >= low && e <= high
            })
            .collect();

        let chosen = match in_range.choose(rng) {
            Some(&track) => track.clone(),
            None => {
                log::warn!("No track in energy range [{}, {}]; picking any", low, high);
                self.library.choose(rng)?.clone()
            }
        };

        log::info!("Opening track: {}", chosen.id);
        self.history.push(chosen.id.clone());
        self.current = Some(chosen);
        self.scheduled = None;
        self.current.as_ref()
    }

    /// Mixing context for the next decision
    ///
    /// ≤ 3 played → opening, ≥ 20 played → closing, 22:00–02:00 → peak,
    /// otherwise middle. `hour` defaults to the local clock.
    pub fn derive_context(&self, hour: Option<u32>) -> MixContext {
        let hour = hour.unwrap_or_else(current_hour);
        let played = self.history.len();
        let set_position = if played <= 3 {
            SetPosition::Opening
        } else if played >= 20 {
            SetPosition::Closing
        } else if hour >= 22 || hour <= 2 {
            SetPosition::Peak
        } else {
            SetPosition::Middle
        };

        MixContext {
            energy_target: self.settings.energy_target,
            set_position,
            current_hour: Some(hour),
            play_history_length: played,
        }
    }

    fn schedule(&mut self, selection: Selection) -> &ScheduledTransition {
        self.generation += 1;
        let start_at_secs =
            (selection.instructions.mix_out_point - selection.instructions.crossfade_duration).max(0.0);

        if let Some(previous) = &self.scheduled {
            log::debug!(
                "Replacing scheduled transition #{} ({})",
                previous.generation,
                previous.next.id
            );
        }

        self.publish(EngineEvent::TransitionScheduled {
            generation: self.generation,
            next: selection.track.id.clone(),
            start_at_secs,
            crossfade_secs: selection.instructions.crossfade_duration,
        });

        self.scheduled.insert(ScheduledTransition {
            generation: self.generation,
            next: selection.track,
            score: selection.score,
            instructions: selection.instructions,
            start_at_secs,
        })
    }

    /// Select the next track and replace the pending transition
    ///
    /// # Returns
    ///
    /// `None` before an opening track is chosen or when the library has no
    /// other track
    pub fn prepare_next<R: Rng + ?Sized>(&mut self, hour: Option<u32>, rng: &mut R) -> Option<&ScheduledTransition> {
        let current = self.current.clone()?;
        let context = self.derive_context(hour);
        let selection = self
            .selector
            .select_next(&current, &self.library, &self.history, &context, rng)?;

        self.publish(EngineEvent::NextTrackSelected {
            from: current.id.clone(),
            to: selection.track.id.clone(),
            score: selection.score.total(),
            fallback: selection.score.is_fallback(),
        });

        Some(self.schedule(selection))
    }

    /// Replace the automatic choice with a manual one
    ///
    /// # Errors
    ///
    /// `AnalysisError::InvalidInput` without a current track or when
    /// `track_id` is not in the playable library
    pub fn override_next(&mut self, track_id: &str, hour: Option<u32>) -> Result<&ScheduledTransition, AnalysisError> {
        let current = self
            .current
            .clone()
            .ok_or_else(|| AnalysisError::InvalidInput("No track is playing".to_string()))?;
        let track = self
            .library
            .iter()
            .find(|t| t.id == track_id)
            .cloned()
            .ok_or_else(|| AnalysisError::InvalidInput(format!("Unknown track {:?}", track_id)))?;

        let context = self.derive_context(hour);
        let score = self.selector.scorer().score(&current, &track, &context);
        if score.total < RISKY_OVERRIDE_SCORE {
            log::warn!(
                "Manual choice {} scores {:.3} against {}; transition may clash",
                track.id,
                score.total,
                current.id
            );
        }

        self.publish(EngineEvent::NextTrackOverridden {
            track: track.id.clone(),
            score: score.total,
        });

        let instructions = self.selector.planner().plan(&current, &track);
        Ok(self.schedule(Selection {
            track,
            score: SelectionScore::Scored(score),
            instructions,
        }))
    }

    /// Report the pending transition as finished
    ///
    /// Advances the current track, appends to history and records the
    /// outcome.
    ///
    /// # Errors
    ///
    /// `AnalysisError::InvalidInput` when nothing is scheduled
    pub fn complete_transition(&mut self, success: bool, feedback: Option<String>) -> Result<&Track, AnalysisError> {
        let scheduled = self
            .scheduled
            .take()
            .ok_or_else(|| AnalysisError::InvalidInput("No transition scheduled".to_string()))?;

        if let Some(previous) = &self.current {
            self.analytics.record(previous, &scheduled.next, success, feedback);
            self.publish(EngineEvent::TransitionCompleted {
                from: previous.id.clone(),
                to: scheduled.next.id.clone(),
                success,
            });
        }

        self.history.push(scheduled.next.id.clone());
        Ok(&*self.current.insert(scheduled.next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn library(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| {
                let mut t = Track::new(format!("t{}", i), format!("Track {}", i), "Artist").with_duration(240.0);
                t.bpm = Some(120.0 + i as f32);
                t.energy = Some(0.3 + 0.05 * i as f32);
                t.camelot_key = Some(format!("{}A", i % 12 + 1).parse().unwrap());
                t.analyzed = true;
                t
            })
            .collect()
    }

    fn session(n: usize) -> AutoDjSession {
        AutoDjSession::new(library(n), TrackSelector::default(), SessionSettings::default()).unwrap()
    }

    #[test]
    fn test_insufficient_library() {
        let mut tracks = library(12);
        tracks[0].analyzed = false;
        tracks[1].bpm = None;
        tracks[2].duration = Some(90.0);
        let err = AutoDjSession::new(tracks, TrackSelector::default(), SessionSettings::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientLibrary(_)));
    }

    #[test]
    fn test_initial_track_in_energy_range() {
        let mut s = session(12);
        let mut rng = StdRng::seed_from_u64(3);
        let energy = s.select_initial_track(SetPosition::Opening, &mut rng).unwrap().energy_or_default();
        assert!((0.3..=0.6).contains(&energy));
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn test_derive_context() {
        let mut s = session(12);
        assert_eq!(s.derive_context(Some(23)).set_position, SetPosition::Opening);
        s.history = (0..5).map(|i| format!("t{}", i)).collect();
        assert_eq!(s.derive_context(Some(23)).set_position, SetPosition::Peak);
        assert_eq!(s.derive_context(Some(15)).set_position, SetPosition::Middle);
        s.history = (0..20).map(|i| format!("t{}", i % 12)).collect();
        assert_eq!(s.derive_context(Some(23)).set_position, SetPosition::Closing);
    }

    #[test]
    fn test_prepare_next_replaces_schedule() {
        let mut s = session(12);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(s.prepare_next(Some(15), &mut rng).is_none());
        s.select_initial_track(SetPosition::Middle, &mut rng);

        let first = s.prepare_next(Some(15), &mut rng).cloned().unwrap();
        let second = s.prepare_next(Some(15), &mut rng).cloned().unwrap();
        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 2);
        assert_eq!(s.scheduled().map(|t| t.generation), Some(2));
        let expected_start = (second.instructions.mix_out_point - second.instructions.crossfade_duration).max(0.0);
        assert_eq!(second.start_at_secs, expected_start);
    }

    #[test]
    fn test_complete_transition_advances() {
        let mut s = session(12);
        let mut rng = StdRng::seed_from_u64(9);
        assert!(s.complete_transition(true, None).is_err());
        s.select_initial_track(SetPosition::Middle, &mut rng);
        let next_id = s.prepare_next(Some(15), &mut rng).unwrap().next.id.clone();
        let now = s.complete_transition(true, Some("clean".to_string())).unwrap().id.clone();
        assert_eq!(now, next_id);
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.analytics().len(), 1);
        assert!(s.scheduled().is_none());
    }

    #[test]
    fn test_override_next() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let mut s = session(12).with_events(bus);
        let mut rng = StdRng::seed_from_u64(2);
        assert!(s.override_next("t3", Some(15)).is_err());
        s.select_initial_track(SetPosition::Middle, &mut rng);
        assert!(s.override_next("missing", Some(15)).is_err());

        let scheduled = s.override_next("t3", Some(15)).unwrap();
        assert_eq!(scheduled.next.id, "t3");
        let events: Vec<EngineEvent> = rx.try_iter().collect();
        assert!(events.iter().any(|e| matches!(e, EngineEvent::NextTrackOverridden { .. })));
        assert!(events.iter().any(|e| matches!(e, EngineEvent::TransitionScheduled { .. })));
    }
}
