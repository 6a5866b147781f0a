//! Analysis result types

use super::metadata::AnalysisMetadata;
use crate::features::cue_points::CuePoints;
use crate::features::key::{CamelotKey, KeyCandidate};
use crate::features::period::drift::TempoDrift;
use crate::features::period::{BpmCandidate, TempoEstimate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Get key name in musical notation (e.g., "C", "Am", "F#", "D#m")
    ///
    /// Returns standard musical notation:
    /// - Major keys: note name only (e.g., "C", "C#", "D", "F#")
    /// - Minor keys: note name + "m" (e.g., "Am", "C#m", "Dm", "F#m")
    ///
    /// # Example
    ///
    /// ```
    /// use segue_dsp::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C");
    /// assert_eq!(Key::Major(6).name(), "F#");
    /// assert_eq!(Key::Minor(9).name(), "Am");
    /// assert_eq!(Key::Minor(1).name(), "C#m");
    /// ```
    pub fn name(&self) -> String {
        match self {
            Key::Major(i) => NOTE_NAMES[*i as usize % 12].to_string(),
            Key::Minor(i) => format!("{}m", NOTE_NAMES[*i as usize % 12]),
        }
    }

    /// Pitch class of the tonic (0 = C)
    pub fn tonic(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// True for minor keys
    pub fn is_minor(&self) -> bool {
        matches!(self, Key::Minor(_))
    }

    /// Position on the Camelot wheel
    pub fn camelot(&self) -> CamelotKey {
        CamelotKey::from_key(*self)
    }

    /// Relative major/minor (Am ↔ C)
    pub fn relative(&self) -> Key {
        match self {
            Key::Major(i) => Key::Minor((i + 9) % 12),
            Key::Minor(i) => Key::Major((i + 3) % 12),
        }
    }

    /// Same tonic, opposite mode (C ↔ Cm)
    pub fn parallel(&self) -> Key {
        match self {
            Key::Major(i) => Key::Minor(*i % 12),
            Key::Minor(i) => Key::Major(*i % 12),
        }
    }

    /// Build a key from a note name and mode
    ///
    /// Accepts sharps and flats ("C#", "Db", "Bb"); case-insensitive.
    pub fn from_parts(note: &str, minor: bool) -> Option<Key> {
        let pc = note_index(note)?;
        Some(if minor { Key::Minor(pc) } else { Key::Major(pc) })
    }

    /// Parse a key name
    ///
    /// Accepts the [`Key::name`] form ("C#m", "F") plus spelled-out modes
    /// ("A minor", "Eb major").
    ///
    /// # Example
    ///
    /// ```
    /// use segue_dsp::analysis::result::Key;
    ///
    /// assert_eq!(Key::parse("C#m"), Some(Key::Minor(1)));
    /// assert_eq!(Key::parse("Eb major"), Some(Key::Major(3)));
    /// assert_eq!(Key::parse("H"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Key> {
        let text = text.trim();
        let lower = text.to_ascii_lowercase();
        for (suffix, minor) in [
            (" minor", true),
            (" min", true),
            (" major", false),
            (" maj", false),
        ] {
            if let Some(note) = lower.strip_suffix(suffix) {
                return Key::from_parts(note.trim(), minor);
            }
        }
        if let Some(note) = text.strip_suffix('m') {
            if !note.is_empty() {
                return Key::from_parts(note, true);
            }
        }
        Key::from_parts(text, false)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Pitch class of a note name, with flats folded onto sharps
pub fn note_index(note: &str) -> Option<u32> {
    let mut chars = note.trim().chars();
    let base = match chars.next()?.to_ascii_uppercase() {
        'C' => 0i32,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let shift = match chars.as_str() {
        "" => 0,
        "#" => 1,
        "b" | "B" => -1,
        _ => return None,
    };
    Some((base + shift).rem_euclid(12) as u32)
}

/// Complete analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// BPM estimate
    pub bpm: f32,

    /// BPM confidence (0.0-1.0)
    pub bpm_confidence: f32,

    /// Alternate tempo interpretations, highest confidence first
    pub bpm_candidates: Vec<BpmCandidate>,

    /// Detected key (`None` for atonal or silent audio)
    pub key: Option<Key>,

    /// Key confidence (0.0-1.0)
    pub key_confidence: f32,

    /// Top-ranked key hypotheses
    pub key_candidates: Vec<KeyCandidate>,

    /// Camelot code of [`AnalysisResult::key`]
    pub camelot_key: Option<CamelotKey>,

    /// Energy level (0.0-1.0)
    pub energy: f32,

    /// Detected mixing boundaries
    pub cue_points: Option<CuePoints>,

    /// Tempo change between the opening and closing sections
    pub tempo_drift: Option<TempoDrift>,

    /// Beat times in seconds (empty unless the tempo strategy tracks beats)
    pub beats: Vec<f32>,

    /// Deviation from A440 in semitones (informational)
    pub tuning_offset: Option<f32>,

    /// False when any stage fell back
    pub analyzed: bool,

    /// Fallback reason
    pub error: Option<String>,

    /// Completion time
    pub timestamp: DateTime<Utc>,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Well-formed result for audio that could not be analyzed
    ///
    /// `bpm = 120`, no key, zero confidences, `analyzed = false`.
    pub fn fallback(reason: impl Into<String>, metadata: AnalysisMetadata) -> Self {
        let tempo = TempoEstimate::fallback();
        Self {
            bpm: tempo.primary,
            bpm_confidence: 0.0,
            bpm_candidates: tempo.candidates,
            key: None,
            key_confidence: 0.0,
            key_candidates: Vec::new(),
            camelot_key: None,
            energy: 0.0,
            cue_points: None,
            tempo_drift: None,
            beats: Vec::new(),
            tuning_offset: None,
            analyzed: false,
            error: Some(reason.into()),
            timestamp: Utc::now(),
            metadata,
        }
    }

    /// Key name in musical notation, if any
    pub fn key_name(&self) -> Option<String> {
        self.key.map(|k| k.name())
    }

    /// Cheap consistency check applied to cached entries
    ///
    /// Rejects non-finite numbers, out-of-range confidences and energy, an
    /// analyzed result with a BPM outside 1–400 or without candidates, a
    /// Camelot code that disagrees with the key, and a fallback without a
    /// reason.
    pub fn is_structurally_valid(&self) -> bool {
        let unit = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);

        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return false;
        }
        if !unit(self.bpm_confidence) || !unit(self.key_confidence) || !unit(self.energy) {
            return false;
        }
        if self.camelot_key != self.key.map(CamelotKey::from_key) {
            return false;
        }
        if self.analyzed {
            if self.bpm > 400.0 || self.bpm_candidates.is_empty() {
                return false;
            }
        } else if self.error.is_none() {
            return false;
        }
        if let Some(cue) = self.cue_points {
            if !cue.cue_in.is_finite() || !cue.cue_out.is_finite() || cue.cue_out < cue.cue_in {
                return false;
            }
        }
        true
    }
}

/// Flat record for an external relational store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedAnalysis {
    /// BPM estimate
    pub bpm: f32,
    /// BPM confidence
    pub bpm_confidence: f32,
    /// Key name such as "C#m"
    pub musical_key: Option<String>,
    /// Key confidence
    pub key_confidence: f32,
    /// Camelot code such as "12A"
    pub camelot_key: Option<String>,
    /// Energy level (0.0-1.0)
    pub energy_level: f32,
    /// Cue-in in seconds
    pub cue_in_sec: Option<f32>,
    /// Cue-out in seconds
    pub cue_out_sec: Option<f32>,
}

impl From<&AnalysisResult> for PersistedAnalysis {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            bpm: result.bpm,
            bpm_confidence: result.bpm_confidence,
            musical_key: result.key_name(),
            key_confidence: result.key_confidence,
            camelot_key: result.camelot_key.map(|c| c.to_string()),
            energy_level: result.energy,
            cue_in_sec: result.cue_points.map(|c| c.cue_in),
            cue_out_sec: result.cue_points.map(|c| c.cue_out),
        }
    }
}
