//! Onset autocorrelation tempo
//!
//! Finds the dominant inter-onset period with an FFT-accelerated
//! autocorrelation of the onset train.
//!
//! # Algorithm
//!
//! 1. Place each onset's strength on a frame grid, spread over ±1 frame
//! 2. `ACF = IFFT(|FFT(signal)|²)` with zero padding to avoid wrap-around
//! 3. Strongest ACF peak inside the lag range of `[min_bpm, max_bpm]`
//! 4. Parabolic interpolation of the peak lag, then `BPM = 60 / (lag × frame_seconds)`
//!
//! # Reference
//!
//! Ellis, D. P. W., & Pikrakis, A. (2006). Real-time Beat Induction.
//! *Proceedings of the International Conference on Music Information Retrieval*.

use super::peak_picking::find_peaks;
use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

const EPSILON: f32 = 1e-10;

/// Fewer inter-onset intervals than this give no autocorrelation estimate
pub const MIN_INTERVALS: usize = 10;

/// Periodicity found by the autocorrelation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcfTempo {
    /// BPM of the dominant period
    pub bpm: f32,
    /// Peak height relative to the zero-lag energy (0.0-1.0)
    pub strength: f32,
}

/// Estimate the dominant tempo of an onset train
///
/// # Arguments
///
/// * `onset_frames` - Onset positions in frames, ascending
/// * `strengths` - Onset strengths (same length as `onset_frames`)
/// * `frame_seconds` - Duration of one frame
/// * `min_bpm` / `max_bpm` - Tempo range searched
///
/// # Returns
///
/// `None` when there are fewer than [`MIN_INTERVALS`] intervals or no peak
/// in the lag range
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for mismatched slices, a
/// non-positive frame duration or an empty BPM range
pub fn onset_autocorrelation_tempo(
    onset_frames: &[usize],
    strengths: &[f32],
    frame_seconds: f32,
    min_bpm: f32,
    max_bpm: f32,
) -> Result<Option<AcfTempo>, AnalysisError> {
    if onset_frames.len() != strengths.len() {
        return Err(AnalysisError::InvalidInput(format!(
            "{} onsets but {} strengths",
            onset_frames.len(),
            strengths.len()
        )));
    }
    if frame_seconds <= 0.0 {
        return Err(AnalysisError::InvalidInput("Frame duration must be positive".to_string()));
    }
    if min_bpm <= 0.0 || min_bpm >= max_bpm {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid BPM range: [{:.1}, {:.1}]",
            min_bpm, max_bpm
        )));
    }

    if onset_frames.len() < MIN_INTERVALS + 1 {
        log::debug!("Too few onsets for autocorrelation: {}", onset_frames.len());
        return Ok(None);
    }

    let last = onset_frames.last().copied().unwrap_or(0);
    let mut train = vec![0.0f32; last + 2];
    for (&frame, &strength) in onset_frames.iter().zip(strengths) {
        train[frame] += strength;
        if frame > 0 {
            train[frame - 1] += strength * 0.5;
        }
        train[frame + 1] += strength * 0.5;
    }

    let acf = compute_autocorrelation_fft(&train);
    let zero_lag = acf.first().copied().unwrap_or(0.0);
    if zero_lag < EPSILON {
        return Ok(None);
    }

    let lag_min = (60.0 / (max_bpm * frame_seconds)).floor().max(1.0) as usize;
    let lag_max = ((60.0 / (min_bpm * frame_seconds)).ceil() as usize).min(acf.len().saturating_sub(2));
    if lag_min + 2 > lag_max {
        log::debug!("Lag range [{}, {}] empty for ACF length {}", lag_min, lag_max, acf.len());
        return Ok(None);
    }

    // Keep one extra lag on each side so edge peaks are still local maxima
    let window_start = lag_min - 1;
    let window = &acf[window_start..=lag_max + 1];
    let peaks = find_peaks(window, EPSILON, 2);
    let Some(&(idx, value)) = peaks.first() else {
        return Ok(None);
    };

    let lag = window_start + idx;
    let (y0, y1, y2) = (acf[lag - 1], acf[lag], acf[lag + 1]);
    let denom = y0 - 2.0 * y1 + y2;
    let offset = if denom.abs() > EPSILON {
        (0.5 * (y0 - y2) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };
    let refined_lag = lag as f32 + offset;
    let bpm = 60.0 / (refined_lag * frame_seconds);

    log::debug!(
        "Autocorrelation: lag {} (refined {:.2}) -> {:.2} BPM, strength {:.3}",
        lag,
        refined_lag,
        bpm,
        value / zero_lag
    );

    if bpm < min_bpm || bpm > max_bpm {
        return Ok(None);
    }

    Ok(Some(AcfTempo {
        bpm,
        strength: (value / zero_lag).clamp(0.0, 1.0),
    }))
}

/// Autocorrelation via `IFFT(|FFT(x)|²)`, zero-padded to avoid circular wrap
///
/// Returns the non-negative lags `0..signal.len()`.
pub fn compute_autocorrelation_fft(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let fft_size = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(fft_size).process(&mut buffer);
    for x in buffer.iter_mut() {
        *x = Complex::new(x.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(fft_size).process(&mut buffer);

    let scale = 1.0 / fft_size as f32;
    buffer[..n].iter().map(|x| (x.re * scale).max(0.0)).collect()
}
