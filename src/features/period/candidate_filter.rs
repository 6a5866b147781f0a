//! Interval-to-BPM utilities shared by the tempo strategies
//!
//! Peak positions → inter-peak intervals → BPM values → range restriction
//! (with one octave adjustment) → bucketed histogram mode → candidate list.

use super::{BpmCandidate, CandidateLabel};

/// Multipliers and fixed confidences of the emitted candidates
const CANDIDATE_SHAPE: [(f32, f32, CandidateLabel); 4] = [
    (0.5, 0.3, CandidateLabel::HalfTime),
    (1.0, 0.6, CandidateLabel::Detected),
    (1.5, 0.2, CandidateLabel::OneAndHalf),
    (2.0, 0.4, CandidateLabel::DoubleTime),
];

/// Convert consecutive peak positions into BPM values
///
/// # Arguments
///
/// * `positions` - Peak positions in frames, ascending
/// * `frame_seconds` - Duration of one frame in seconds
///
/// # Returns
///
/// One BPM value per non-zero interval (`60 / seconds`)
pub fn intervals_to_bpm(positions: &[usize], frame_seconds: f32) -> Vec<f32> {
    positions
        .windows(2)
        .filter_map(|w| {
            let seconds = (w[1] - w[0]) as f32 * frame_seconds;
            if seconds > 0.0 {
                Some(60.0 / seconds)
            } else {
                None
            }
        })
        .collect()
}

/// BPM values restricted to the reporting range
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSelection {
    /// Values inside `[min_bpm, max_bpm]`
    pub values: Vec<f32>,
    /// True when the values only qualified after octave adjustment
    pub octave_adjusted: bool,
}

/// Keep values inside `[min_bpm, max_bpm]`
///
/// When nothing qualifies, every value is doubled (below range) or halved
/// (above range) once and the filter is applied again.
pub fn restrict_to_range(values: &[f32], min_bpm: f32, max_bpm: f32) -> RangeSelection {
    let in_range = |v: &f32| *v >= min_bpm && *v <= max_bpm;

    let direct: Vec<f32> = values.iter().copied().filter(in_range).collect();
    if !direct.is_empty() {
        return RangeSelection {
            values: direct,
            octave_adjusted: false,
        };
    }

    let adjusted: Vec<f32> = values
        .iter()
        .map(|&v| {
            if v < min_bpm {
                v * 2.0
            } else if v > max_bpm {
                v / 2.0
            } else {
                v
            }
        })
        .filter(in_range)
        .collect();

    if !adjusted.is_empty() {
        log::debug!(
            "No BPM values in [{}, {}]; {} qualify after octave adjustment",
            min_bpm,
            max_bpm,
            adjusted.len()
        );
    }

    RangeSelection {
        values: adjusted,
        octave_adjusted: true,
    }
}

/// Double or halve a tempo until it lies inside `[min_bpm, max_bpm]`
///
/// Gives up after a few octaves and returns the nearest bound.
pub fn fold_into_range(bpm: f32, min_bpm: f32, max_bpm: f32) -> f32 {
    let mut value = bpm;
    for _ in 0..8 {
        if value < min_bpm {
            value *= 2.0;
        } else if value > max_bpm {
            value /= 2.0;
        } else {
            return value;
        }
    }
    value.clamp(min_bpm, max_bpm)
}

/// Central estimate from a bucketed histogram
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeEstimate {
    /// Mean of the values in the winning bucket
    pub center: f32,
    /// Fraction of all values that fell in the winning bucket
    pub support: f32,
}

/// Histogram mode with buckets of `bucket_width` BPM
///
/// Values are bucketed by `round(v / width)`. The most populated bucket wins;
/// among equally populated buckets the one encountered first wins. The centre
/// is the mean of that bucket's members.
///
/// # Returns
///
/// `None` for empty input
pub fn histogram_mode(values: &[f32], bucket_width: f32) -> Option<ModeEstimate> {
    if values.is_empty() || bucket_width <= 0.0 {
        return None;
    }

    // (bucket, count, sum) in first-encounter order
    let mut buckets: Vec<(i64, usize, f32)> = Vec::new();
    for &v in values {
        let bucket = (v / bucket_width).round() as i64;
        match buckets.iter_mut().find(|(b, _, _)| *b == bucket) {
            Some(entry) => {
                entry.1 += 1;
                entry.2 += v;
            }
            None => buckets.push((bucket, 1, v)),
        }
    }

    let mut best = buckets[0];
    for &entry in &buckets[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
    }

    Some(ModeEstimate {
        center: best.2 / best.1 as f32,
        support: best.1 as f32 / values.len() as f32,
    })
}

/// Population standard deviation (0.0 for fewer than two values)
pub fn std_dev(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
    variance.sqrt()
}

/// Emit half, detected, 1.5× and double candidates of a central estimate
///
/// Values are rounded to whole BPM; the list is sorted by confidence.
pub fn build_candidates(central: f32) -> Vec<BpmCandidate> {
    let mut candidates: Vec<BpmCandidate> = CANDIDATE_SHAPE
        .iter()
        .map(|&(factor, confidence, label)| BpmCandidate {
            value: (central * factor).round(),
            confidence,
            label,
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}
