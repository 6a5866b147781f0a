//! Silence-based cue point detection
//!
//! Scans the head and tail of a track for the first and last frames above a
//! silence threshold:
//! - cue-in: first loud frame in the first `scan_secs`, provided at least
//!   `min_silence_secs` of silence precede it, minus a short pre-roll
//! - cue-out: last loud frame in the final `scan_secs`, plus a tail margin
//!
//! Both are rounded to 10 ms and clamped so the cue-out stays at least one
//! second after the cue-in and no later than 100 ms before the end.

use crate::config::CueConfig;
use serde::{Deserialize, Serialize};

/// Usable mixing boundaries in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CuePoints {
    /// Mix-in point
    pub cue_in: f32,
    /// Mix-out point
    pub cue_out: f32,
}

fn round_centis(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

fn frame_db(frame: &[f32]) -> f32 {
    let mean_sq = frame.iter().map(|x| x * x).sum::<f32>() / frame.len().max(1) as f32;
    if mean_sq <= 0.0 {
        f32::NEG_INFINITY
    } else {
        10.0 * mean_sq.log10()
    }
}

/// Detect cue-in and cue-out
///
/// # Returns
///
/// `None` for empty input, a zero sample rate or a zero frame size
pub fn detect_cue_points(samples: &[f32], sample_rate: u32, config: &CueConfig) -> Option<CuePoints> {
    if samples.is_empty() || sample_rate == 0 || config.frame_size == 0 {
        return None;
    }

    let sr = sample_rate as f32;
    let duration = samples.len() as f32 / sr;
    let frame_secs = config.frame_size as f32 / sr;
    let scan = ((config.scan_secs * sr) as usize).min(samples.len());

    // Head: leading silence
    let mut cue_in = 0.0f32;
    let head_frames: Vec<f32> = samples[..scan].chunks(config.frame_size).map(frame_db).collect();
    if let Some(first_loud) = head_frames.iter().position(|&db| db > config.threshold_db) {
        let silence = first_loud as f32 * frame_secs;
        if silence >= config.min_silence_secs {
            cue_in = (silence - config.cue_in_margin_secs).max(0.0);
        }
    }

    // Tail: trailing silence
    let tail_start = samples.len() - scan;
    let tail_frames: Vec<f32> = samples[tail_start..].chunks(config.frame_size).map(frame_db).collect();
    let mut cue_out = duration;
    if let Some(last_loud) = tail_frames.iter().rposition(|&db| db > config.threshold_db) {
        let end_of_sound = tail_start as f32 / sr + (last_loud + 1) as f32 * frame_secs;
        cue_out = end_of_sound + config.cue_out_margin_secs;
    }

    let cue_in = round_centis(cue_in);
    let cue_out = round_centis((cue_in + 1.0).max(cue_out.min(duration - 0.1)));

    log::debug!("Cue points: in {:.2} s, out {:.2} s (duration {:.2} s)", cue_in, cue_out, duration);
    Some(CuePoints { cue_in, cue_out })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(lead_secs: f32, body_secs: f32, tail_secs: f32) -> Vec<f32> {
        let sr = 44100.0;
        let mut samples = vec![0.0f32; (lead_secs * sr) as usize];
        samples.extend((0..(body_secs * sr) as usize).map(|i| 0.5 * (i as f32 * 0.05).sin()));
        samples.extend(vec![0.0f32; (tail_secs * sr) as usize]);
        samples
    }

    #[test]
    fn test_leading_and_trailing_silence() {
        let samples = padded(2.0, 20.0, 3.0);
        let cues = detect_cue_points(&samples, 44100, &CueConfig::default()).unwrap();
        assert!((cues.cue_in - 1.9).abs() < 0.05, "cue_in {}", cues.cue_in);
        assert!((cues.cue_out - 23.0).abs() < 0.05, "cue_out {}", cues.cue_out);
    }

    #[test]
    fn test_loud_start_cues_at_zero() {
        let samples = padded(0.0, 20.0, 0.0);
        let cues = detect_cue_points(&samples, 44100, &CueConfig::default()).unwrap();
        assert_eq!(cues.cue_in, 0.0);
        assert!((cues.cue_out - 19.9).abs() < 0.011);
    }

    #[test]
    fn test_short_gap_ignored() {
        let samples = padded(0.1, 20.0, 0.0);
        let cues = detect_cue_points(&samples, 44100, &CueConfig::default()).unwrap();
        assert_eq!(cues.cue_in, 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(detect_cue_points(&[], 44100, &CueConfig::default()).is_none());
    }
}
