//! Labeled reference tracks
//!
//! The built-in set ships as `fixtures/reference_tracks.json`: well-known
//! recordings with their published tempo and key, grouped by category
//! (slow, swing, waltz, metal, ...). Audio is never bundled; callers match
//! their own files to references by name.

use crate::analysis::result::Key;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

const BUILTIN_REFERENCES: &str = include_str!("../../fixtures/reference_tracks.json");

const AUDIO_EXTENSIONS: [&str; 5] = [".mp3", ".wav", ".flac", ".m4a", ".ogg"];

/// Major or minor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Major mode
    Major,
    /// Minor mode
    Minor,
}

/// One labeled recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTrack {
    /// Title
    pub name: String,
    /// Performer
    pub artist: String,
    /// Published tempo
    pub bpm: f32,
    /// Tonic as spelled in the source ("F#", "Ab")
    pub key: String,
    /// Mode
    pub mode: Mode,
    /// Grouping used in reports
    pub category: String,
    /// Known difficulty, e.g. a half-time feel
    #[serde(default)]
    pub note: Option<String>,
    /// Non-4/4 meter
    #[serde(default)]
    pub time_signature: Option<String>,
}

impl ReferenceTrack {
    /// Expected key, `None` if the tonic cannot be parsed
    pub fn expected_key(&self) -> Option<Key> {
        Key::from_parts(&self.key, self.mode == Mode::Minor)
    }
}

/// A collection of reference tracks
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceSet {
    tracks: Vec<ReferenceTrack>,
}

impl ReferenceSet {
    /// Wrap a list of references
    pub fn new(tracks: Vec<ReferenceTrack>) -> Self {
        Self { tracks }
    }

    /// The set bundled with the crate
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::CalibrationError` if the bundled fixture is malformed
    pub fn builtin() -> Result<Self, AnalysisError> {
        Self::from_json(BUILTIN_REFERENCES)
    }

    /// Parse a JSON array of references
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::CalibrationError` on malformed JSON
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let tracks: Vec<ReferenceTrack> = serde_json::from_str(json)
            .map_err(|e| AnalysisError::CalibrationError(format!("Invalid reference set: {}", e)))?;
        Ok(Self { tracks })
    }

    /// All references
    pub fn tracks(&self) -> &[ReferenceTrack] {
        &self.tracks
    }

    /// Number of references
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True if the set is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Reference whose name appears in `filename`
    ///
    /// The file name is lowercased, stripped of its audio extension and has
    /// `_`/`-` turned into spaces. A reference matches when the result
    /// contains "artist title", the title alone, or the artist together with
    /// the first word of the title. The first match in set order wins.
    pub fn find_by_filename(&self, filename: &str) -> Option<&ReferenceTrack> {
        let clean = clean_filename(filename);
        self.tracks.iter().find(|track| {
            let name = track.name.to_lowercase();
            let artist = track.artist.to_lowercase();
            let first_word = name.split(' ').next().unwrap_or("");
            clean.contains(&format!("{} {}", artist, name))
                || clean.contains(&name)
                || (clean.contains(&artist) && clean.contains(first_word))
        })
    }
}

fn clean_filename(filename: &str) -> String {
    let mut clean = filename.to_lowercase();
    for ext in AUDIO_EXTENSIONS {
        if let Some(stripped) = clean.strip_suffix(ext) {
            clean = stripped.to_string();
            break;
        }
    }
    clean.replace(['_', '-'], " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_set_loads() {
        let set = ReferenceSet::builtin().unwrap();
        assert!(set.len() >= 30);
        assert!(set.tracks().iter().all(|t| t.expected_key().is_some()));
        assert!(set.tracks().iter().all(|t| t.bpm > 0.0));
    }

    #[test]
    fn test_find_by_filename() {
        let set = ReferenceSet::builtin().unwrap();
        let track = set.find_by_filename("Daft_Punk-Get_Lucky.mp3").unwrap();
        assert_eq!(track.artist, "Daft Punk");
        assert_eq!(track.expected_key(), Some(Key::Minor(6)));

        let track = set.find_by_filename("01 - hotel california (live).flac").unwrap();
        assert_eq!(track.bpm, 120.0);

        assert!(set.find_by_filename("unknown_artist-untitled.wav").is_none());
    }

    #[test]
    fn test_flat_tonic() {
        let set = ReferenceSet::builtin().unwrap();
        let track = set.find_by_filename("coldplay viva la vida.m4a").unwrap();
        assert_eq!(track.expected_key(), Some(Key::Major(8)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ReferenceSet::from_json("{not json"),
            Err(AnalysisError::CalibrationError(_))
        ));
    }
}
