//! Dynamic-programming beat tracker
//!
//! For every integer tempo hypothesis in `[min_bpm, max_bpm]`:
//!
//! ```text
//! score[i] = s_i + max(0, max_j score[j] + s_i · (1 − err_ij / tol) / k_ij)
//! ```
//!
//! where `k_ij = round(gap_ij / beat)` (at least 1), `err_ij` is the distance
//! of the gap from `k_ij` beats and `tol = beat × tolerance`. Only gaps with
//! `err_ij < tol` and `k_ij ≤ 4` count. Dividing by `k` keeps chains that skip
//! onsets from tying with the true tempo. The best hypothesis is the one with
//! the largest final score; ties go to the slower tempo.

use crate::error::AnalysisError;

/// Longest gap, in beats, the tracker bridges
const MAX_BEAT_SPAN: f32 = 4.0;

/// Best tempo hypothesis with its beat chain
#[derive(Debug, Clone, PartialEq)]
pub struct BeatTrack {
    /// Tempo hypothesis in BPM
    pub bpm: f32,
    /// Final DP score of the hypothesis
    pub score: f32,
    /// Onset times (seconds) along the best chain
    pub beats: Vec<f32>,
}

/// Run the tracker over all tempo hypotheses
///
/// # Arguments
///
/// * `onset_times` - Onset times in seconds, ascending
/// * `strengths` - Onset strengths (same length)
/// * `min_bpm` / `max_bpm` - Hypothesis range (step 1 BPM)
/// * `tolerance` - Relative tolerance window (typically 0.2)
///
/// # Returns
///
/// `None` when fewer than two onsets are given
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for mismatched slices or bad ranges
pub fn track_beats(
    onset_times: &[f32],
    strengths: &[f32],
    min_bpm: f32,
    max_bpm: f32,
    tolerance: f32,
) -> Result<Option<BeatTrack>, AnalysisError> {
    if onset_times.len() != strengths.len() {
        return Err(AnalysisError::InvalidInput(format!(
            "{} onsets but {} strengths",
            onset_times.len(),
            strengths.len()
        )));
    }
    if min_bpm <= 0.0 || min_bpm > max_bpm || tolerance <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid tracker range [{}, {}] / tolerance {}",
            min_bpm, max_bpm, tolerance
        )));
    }
    if onset_times.len() < 2 {
        return Ok(None);
    }

    let mut best: Option<BeatTrack> = None;
    let mut tempo = min_bpm.ceil();
    while tempo <= max_bpm {
        let (score, beats) = score_hypothesis(onset_times, strengths, tempo, tolerance);
        let better = match &best {
            Some(b) => score > b.score,
            None => true,
        };
        if better {
            best = Some(BeatTrack {
                bpm: tempo,
                score,
                beats,
            });
        }
        tempo += 1.0;
    }

    if let Some(track) = &best {
        log::debug!(
            "Beat tracker: best hypothesis {} BPM (score {:.3}, {} beats)",
            track.bpm,
            track.score,
            track.beats.len()
        );
    }

    Ok(best)
}

fn score_hypothesis(times: &[f32], strengths: &[f32], bpm: f32, tolerance: f32) -> (f32, Vec<f32>) {
    let beat = 60.0 / bpm;
    let tol = beat * tolerance;
    let n = times.len();
    let mut score = vec![0.0f32; n];
    let mut back: Vec<Option<usize>> = vec![None; n];

    for i in 0..n {
        let mut best_prev = 0.0f32;
        for j in (0..i).rev() {
            let gap = times[i] - times[j];
            if gap > beat * (MAX_BEAT_SPAN + 0.5) {
                break;
            }
            let k = (gap / beat).round().max(1.0);
            if k > MAX_BEAT_SPAN {
                continue;
            }
            let err = (gap - k * beat).abs();
            if err >= tol {
                continue;
            }
            let candidate = score[j] + strengths[i] * (1.0 - err / tol) / k;
            if candidate > best_prev {
                best_prev = candidate;
                back[i] = Some(j);
            }
        }
        score[i] = strengths[i] + best_prev;
    }

    let mut end = 0;
    for i in 1..n {
        if score[i] > score[end] {
            end = i;
        }
    }

    let mut chain = vec![times[end]];
    let mut cursor = back[end];
    while let Some(j) = cursor {
        chain.push(times[j]);
        cursor = back[j];
    }
    chain.reverse();

    (score[end], chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_onsets_find_tempo() {
        let times: Vec<f32> = (0..32).map(|k| 0.25 + k as f32 * 0.5).collect();
        let strengths = vec![1.0; times.len()];
        let track = track_beats(&times, &strengths, 60.0, 200.0, 0.2).unwrap().unwrap();
        assert_eq!(track.bpm, 120.0);
        assert_eq!(track.beats.len(), 32);
    }

    #[test]
    fn test_slow_tempo_not_reported_as_double() {
        // 90 BPM: 180 BPM would chain every onset with k = 2
        let times: Vec<f32> = (0..24).map(|k| k as f32 * 60.0 / 90.0).collect();
        let strengths = vec![1.0; times.len()];
        let track = track_beats(&times, &strengths, 60.0, 200.0, 0.2).unwrap().unwrap();
        assert!((track.bpm - 90.0).abs() <= 1.0, "got {}", track.bpm);
    }

    #[test]
    fn test_single_onset() {
        assert!(track_beats(&[1.0], &[1.0], 60.0, 200.0, 0.2).unwrap().is_none());
    }

    #[test]
    fn test_bad_range() {
        assert!(track_beats(&[0.0, 1.0], &[1.0, 1.0], 200.0, 60.0, 0.2).is_err());
    }
}
