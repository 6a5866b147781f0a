//! Genre buckets and cross-genre compatibility
//!
//! Free-text genre tags are folded into a fixed set of buckets by
//! case-insensitive substring match against each bucket's synonyms. Buckets
//! are tried in declaration order and the first match wins, so "electronic
//! house" lands in House and the bare "electronic" bucket only catches what
//! no specific bucket claims.

use serde::{Deserialize, Serialize};

/// Same bucket
pub const SAME_GENRE_SCORE: f32 = 1.0;
/// Unknown genre on either side
pub const UNKNOWN_GENRE_SCORE: f32 = 0.5;
/// Listed cross-compatible pair
pub const CROSS_GENRE_SCORE: f32 = 0.7;
/// Anything else
pub const CLASHING_GENRE_SCORE: f32 = 0.2;

/// Canonical genre families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenreBucket {
    /// House and its sub-genres
    House,
    /// Techno, minimal, industrial
    Techno,
    /// Trance
    Trance,
    /// Drum and bass, jungle, dubstep
    DrumAndBass,
    /// Hip hop, rap, R&B
    HipHop,
    /// Rock, alternative, indie
    Rock,
    /// Pop
    Pop,
    /// Country, folk
    Country,
    /// Jazz, blues, soul, funk
    Jazz,
    /// Reggae, dub, ska
    Reggae,
    /// Generic electronic/dance
    Electronic,
}

const SYNONYMS: &[(GenreBucket, &[&str])] = &[
    (GenreBucket::House, &["house"]),
    (GenreBucket::Techno, &["techno", "minimal", "industrial"]),
    (GenreBucket::Trance, &["trance"]),
    (GenreBucket::DrumAndBass, &["drum and bass", "drum & bass", "dnb", "jungle", "dubstep"]),
    (GenreBucket::HipHop, &["hip hop", "hip-hop", "rap", "r&b", "urban"]),
    (GenreBucket::Rock, &["rock", "alternative", "indie"]),
    (GenreBucket::Pop, &["pop"]),
    (GenreBucket::Country, &["country", "folk", "americana", "bluegrass"]),
    (GenreBucket::Jazz, &["jazz", "blues", "soul", "funk"]),
    (GenreBucket::Reggae, &["reggae", "dub", "ska", "dancehall"]),
    (GenreBucket::Electronic, &["electronic", "edm", "dance"]),
];

const CROSS_COMPATIBLE: &[(GenreBucket, GenreBucket)] = &[
    (GenreBucket::House, GenreBucket::Techno),
    (GenreBucket::House, GenreBucket::Electronic),
    (GenreBucket::House, GenreBucket::Pop),
    (GenreBucket::Techno, GenreBucket::Electronic),
    (GenreBucket::Trance, GenreBucket::Electronic),
    (GenreBucket::Pop, GenreBucket::Electronic),
    (GenreBucket::Pop, GenreBucket::Rock),
    (GenreBucket::HipHop, GenreBucket::Pop),
];

impl GenreBucket {
    /// Fold a free-text genre into a bucket
    pub fn from_tag(tag: &str) -> Option<GenreBucket> {
        let tag = tag.to_lowercase();
        SYNONYMS
            .iter()
            .find(|(_, synonyms)| synonyms.iter().any(|s| tag.contains(s)))
            .map(|(bucket, _)| *bucket)
    }

    /// True if the pair appears in the cross-compatibility table (symmetric)
    pub fn is_cross_compatible(self, other: GenreBucket) -> bool {
        CROSS_COMPATIBLE
            .iter()
            .any(|&(a, b)| (a == self && b == other) || (a == other && b == self))
    }
}

/// Genre sub-score for two optional tags
pub fn genre_score(a: Option<&str>, b: Option<&str>) -> f32 {
    let a = a.and_then(GenreBucket::from_tag);
    let b = b.and_then(GenreBucket::from_tag);
    match (a, b) {
        (Some(a), Some(b)) if a == b => SAME_GENRE_SCORE,
        (Some(a), Some(b)) if a.is_cross_compatible(b) => CROSS_GENRE_SCORE,
        (Some(_), Some(_)) => CLASHING_GENRE_SCORE,
        (None, None) => SAME_GENRE_SCORE,
        _ => UNKNOWN_GENRE_SCORE,
    }
}
