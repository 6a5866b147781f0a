//! Chroma extraction
//!
//! Pitch-class distribution (12 semitones) for key detection:
//! - Per-frame chroma from a Hann-windowed spectrum ([`extractor`])
//! - Median aggregation and L2 normalization ([`normalization`])
//! - Tuning offset estimate ([`tuning`])

pub mod extractor;
pub mod normalization;
pub mod tuning;

/// Frequency of C0 in Hz, the reference for pitch-class mapping
pub const C0_HZ: f32 = 16.35;

/// Pitch class (0 = C … 11 = B) of a frequency
///
/// `round(12 · log2(f / C0)) mod 12`
pub fn pitch_class(frequency: f32) -> usize {
    let semitones = (12.0 * (frequency / C0_HZ).log2()).round() as i64;
    semitones.rem_euclid(12) as usize
}
