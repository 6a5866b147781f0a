//! Tracks and mixing context as seen by the scorer

use crate::analysis::result::{AnalysisResult, Key};
use crate::features::energy::normalize_energy_rating;
use crate::features::key::CamelotKey;
use serde::{Deserialize, Serialize};

/// BPM assumed for tracks without tempo data
pub const DEFAULT_BPM: f32 = 120.0;

/// Energy assumed for tracks without energy data
pub const DEFAULT_ENERGY: f32 = 0.5;

/// A library track: metadata plus whatever analysis is available
///
/// Read-only to the engine. Every analysis field is optional; scoring
/// substitutes [`DEFAULT_BPM`] and [`DEFAULT_ENERGY`] when data is missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier (path, database id)
    pub id: String,
    /// Title
    pub title: String,
    /// Artist
    pub artist: String,
    /// Free-text genre tag
    pub genre: Option<String>,
    /// Duration in seconds
    pub duration: Option<f32>,
    /// Tempo
    pub bpm: Option<f32>,
    /// Musical key
    pub key: Option<Key>,
    /// Camelot code; derived from `key` when absent
    pub camelot_key: Option<CamelotKey>,
    /// Energy, either 0–1 or a 1–10 rating
    pub energy: Option<f32>,
    /// Mix-in point in seconds
    pub cue_in: Option<f32>,
    /// Mix-out point in seconds
    pub cue_out: Option<f32>,
    /// Length of a clean intro in seconds
    pub fade_in_secs: Option<f32>,
    /// Length of a clean outro in seconds
    pub fade_out_secs: Option<f32>,
    /// True once a successful analysis has been attached
    pub analyzed: bool,
}

impl Track {
    /// A track with identity only
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            ..Self::default()
        }
    }

    /// Copy tempo, key, energy and cue points from an analysis
    ///
    /// A fallback analysis still contributes its energy and cue points but
    /// leaves `analyzed` false. The key is only taken when one was found.
    pub fn with_analysis(mut self, analysis: &AnalysisResult) -> Self {
        self.bpm = Some(analysis.bpm);
        self.key = analysis.key;
        self.camelot_key = analysis.camelot_key;
        self.energy = Some(analysis.energy);
        if let Some(cue) = analysis.cue_points {
            self.cue_in = Some(cue.cue_in);
            self.cue_out = Some(cue.cue_out);
        }
        if self.duration.is_none() && analysis.metadata.duration_seconds > 0.0 {
            self.duration = Some(analysis.metadata.duration_seconds);
        }
        self.analyzed = analysis.analyzed;
        self
    }

    /// Set the genre tag
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Set the duration
    pub fn with_duration(mut self, secs: f32) -> Self {
        self.duration = Some(secs);
        self
    }

    /// Tempo or [`DEFAULT_BPM`]
    pub fn bpm_or_default(&self) -> f32 {
        match self.bpm {
            Some(bpm) if bpm.is_finite() && bpm > 0.0 => bpm,
            _ => DEFAULT_BPM,
        }
    }

    /// Energy on a 0–1 scale or [`DEFAULT_ENERGY`]
    ///
    /// See [`normalize_energy_rating`] for how 1–10 ratings are read; a stored
    /// 1.0 counts as full energy.
    pub fn energy_or_default(&self) -> f32 {
        match self.energy {
            Some(e) if e.is_finite() => normalize_energy_rating(e),
            _ => DEFAULT_ENERGY,
        }
    }

    /// Camelot code, from the tag or the key
    pub fn camelot(&self) -> Option<CamelotKey> {
        self.camelot_key.or_else(|| self.key.map(CamelotKey::from_key))
    }

    /// True when any key information is present
    pub fn has_key(&self) -> bool {
        self.key.is_some() || self.camelot_key.is_some()
    }
}

/// Desired energy flow between consecutive tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyTarget {
    /// Prefer a higher-energy next track
    Build,
    /// Prefer similar energy
    #[default]
    Maintain,
    /// Prefer a lower-energy next track
    WindDown,
}

/// Where in the set the transition happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetPosition {
    /// First few tracks
    Opening,
    /// Anything else
    #[default]
    Middle,
    /// Late-night peak
    Peak,
    /// End of the set
    Closing,
}

/// Per-call mixing context
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MixContext {
    /// Energy flow target
    pub energy_target: EnergyTarget,
    /// Set position
    pub set_position: SetPosition,
    /// Local hour 0–23; the scorer reads the clock when `None`
    pub current_hour: Option<u32>,
    /// Tracks played so far
    pub play_history_length: usize,
}
