//! Camelot wheel notation
//!
//! 24 slots, 1A–12B: the number walks the circle of fifths, the letter is
//! the mode (A = minor, B = major). Adjacent numbers and the opposite letter
//! on the same number are the harmonically compatible neighbours.
//!
//! | Code | Key | Code | Key |
//! |------|-----|------|-----|
//! | 1A  | G#m | 1B  | B  |
//! | 2A  | D#m | 2B  | F# |
//! | 3A  | A#m | 3B  | C# |
//! | 4A  | Fm  | 4B  | G# |
//! | 5A  | Cm  | 5B  | D# |
//! | 6A  | Gm  | 6B  | A# |
//! | 7A  | Dm  | 7B  | F  |
//! | 8A  | Am  | 8B  | C  |
//! | 9A  | Em  | 9B  | G  |
//! | 10A | Bm  | 10B | D  |
//! | 11A | F#m | 11B | A  |
//! | 12A | C#m | 12B | E  |

use crate::analysis::result::Key;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Camelot number of each major key, indexed by tonic pitch class (C = 0)
const MAJOR_NUMBERS: [u8; 12] = [8, 3, 10, 5, 12, 7, 2, 9, 4, 11, 6, 1];

/// Camelot number of each minor key, indexed by tonic pitch class
const MINOR_NUMBERS: [u8; 12] = [5, 12, 7, 2, 9, 4, 11, 6, 1, 8, 3, 10];

/// Camelot letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CamelotLetter {
    /// Minor keys
    A,
    /// Major keys
    B,
}

impl CamelotLetter {
    /// The other letter (relative major/minor)
    pub fn flipped(self) -> Self {
        match self {
            CamelotLetter::A => CamelotLetter::B,
            CamelotLetter::B => CamelotLetter::A,
        }
    }
}

/// A Camelot wheel position such as `8A`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CamelotKey {
    number: u8,
    letter: CamelotLetter,
}

impl CamelotKey {
    /// Build from a wheel number (1–12) and letter
    pub fn new(number: u8, letter: CamelotLetter) -> Option<Self> {
        if (1..=12).contains(&number) {
            Some(Self { number, letter })
        } else {
            None
        }
    }

    /// Wheel number, 1–12
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Wheel letter
    pub fn letter(&self) -> CamelotLetter {
        self.letter
    }

    /// True for the minor (A) ring
    pub fn is_minor(&self) -> bool {
        self.letter == CamelotLetter::A
    }

    /// Camelot position of a key
    ///
    /// # Example
    ///
    /// ```
    /// use segue_dsp::analysis::result::Key;
    /// use segue_dsp::features::key::camelot::CamelotKey;
    ///
    /// assert_eq!(CamelotKey::from_key(Key::Minor(9)).to_string(), "8A"); // Am
    /// assert_eq!(CamelotKey::from_key(Key::Major(0)).to_string(), "8B"); // C
    /// ```
    pub fn from_key(key: Key) -> Self {
        match key {
            Key::Major(pc) => Self {
                number: MAJOR_NUMBERS[pc as usize % 12],
                letter: CamelotLetter::B,
            },
            Key::Minor(pc) => Self {
                number: MINOR_NUMBERS[pc as usize % 12],
                letter: CamelotLetter::A,
            },
        }
    }

    /// The key at this position
    pub fn to_key(&self) -> Key {
        let table = match self.letter {
            CamelotLetter::A => &MINOR_NUMBERS,
            CamelotLetter::B => &MAJOR_NUMBERS,
        };
        let pc = table.iter().position(|&n| n == self.number).unwrap_or(0) as u32;
        match self.letter {
            CamelotLetter::A => Key::Minor(pc),
            CamelotLetter::B => Key::Major(pc),
        }
    }

    /// Move `steps` around the wheel (negative = counter-clockwise), keeping the letter
    pub fn rotate(&self, steps: i32) -> Self {
        let zero_based = (self.number as i32 - 1 + steps).rem_euclid(12);
        Self {
            number: zero_based as u8 + 1,
            letter: self.letter,
        }
    }

    /// Same number, opposite letter
    pub fn relative(&self) -> Self {
        Self {
            number: self.number,
            letter: self.letter.flipped(),
        }
    }

    /// Shortest distance between two wheel numbers (0–6)
    pub fn wheel_distance(&self, other: &CamelotKey) -> u8 {
        let d = (self.number as i32 - other.number as i32).rem_euclid(12) as u8;
        d.min(12 - d)
    }
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.letter {
            CamelotLetter::A => 'A',
            CamelotLetter::B => 'B',
        };
        write!(f, "{}{}", self.number, letter)
    }
}

impl FromStr for CamelotKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let letter = match trimmed.chars().last() {
            Some('A') | Some('a') => CamelotLetter::A,
            Some('B') | Some('b') => CamelotLetter::B,
            _ => return Err(format!("Not a Camelot key: {:?}", s)),
        };
        let number: u8 = trimmed[..trimmed.len() - 1]
            .parse()
            .map_err(|_| format!("Not a Camelot key: {:?}", s))?;
        CamelotKey::new(number, letter).ok_or_else(|| format!("Camelot number out of range: {:?}", s))
    }
}

impl TryFrom<String> for CamelotKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CamelotKey> for String {
    fn from(key: CamelotKey) -> Self {
        key.to_string()
    }
}
