//! Chroma vector extraction
//!
//! Converts Hann-windowed magnitude spectra into 12-element chroma vectors.
//!
//! Algorithm:
//! 1. Analyze at most `max_duration_secs` of audio in frames of `fft_size`
//!    with hop `hop_size`, striding frames so no more than `max_frames` are used
//! 2. For each bin between `min_frequency` and `max_frequency` whose magnitude
//!    exceeds the quiet threshold, add `magnitude × boost` to its pitch class
//! 3. `boost = 1 + harmonic_boost × Σ_h w_h` over the fundamental and 2nd/3rd
//!    harmonic bins that also exceed the quiet threshold
//! 4. Median across non-empty frames, then L2 normalization

use super::normalization::{l2_normalize, median_profile};
use super::pitch_class;
use crate::config::KeyConfig;
use crate::error::AnalysisError;
use crate::features::onset::spectral_flux::hann_window;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Magnitude spectra of the analyzed frames
#[derive(Debug, Clone)]
pub struct SpectralFrames {
    /// One magnitude spectrum (`fft_size / 2 + 1` bins) per analyzed frame
    pub magnitudes: Vec<Vec<f32>>,
    /// Width of one bin in Hz
    pub bin_hz: f32,
}

/// Aggregated, L2-normalized chroma profile
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaProfile {
    /// Pitch-class energies, C first
    pub values: [f32; 12],
    /// Frames that contributed
    pub frames_used: usize,
}

/// Compute magnitude spectra of the frames used for key analysis
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate or zero FFT/hop size
pub fn compute_spectral_frames(
    samples: &[f32],
    sample_rate: u32,
    config: &KeyConfig,
) -> Result<SpectralFrames, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }
    if config.fft_size == 0 || config.hop_size == 0 {
        return Err(AnalysisError::InvalidInput("FFT and hop size must be > 0".to_string()));
    }

    let limit = ((config.max_duration_secs * sample_rate as f32) as usize).min(samples.len());
    let audio = &samples[..limit];
    let bin_hz = sample_rate as f32 / config.fft_size as f32;

    if audio.len() < config.fft_size {
        log::debug!(
            "Audio ({} samples) shorter than one chroma frame ({})",
            audio.len(),
            config.fft_size
        );
        return Ok(SpectralFrames {
            magnitudes: Vec::new(),
            bin_hz,
        });
    }

    let total_frames = (audio.len() - config.fft_size) / config.hop_size + 1;
    let stride = total_frames.div_ceil(config.max_frames.max(1)).max(1);
    let window = hann_window(config.fft_size);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(config.fft_size);
    let bins = config.fft_size / 2 + 1;
    let mut buffer = vec![Complex::new(0.0f32, 0.0); config.fft_size];

    let mut magnitudes = Vec::with_capacity(total_frames / stride + 1);
    for frame in (0..total_frames).step_by(stride) {
        let start = frame * config.hop_size;
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex::new(audio[start + i] * window[i], 0.0);
        }
        fft.process(&mut buffer);
        magnitudes.push(buffer[..bins].iter().map(|c| c.norm()).collect());
    }

    log::debug!(
        "Chroma spectra: {} of {} frames (stride {}), bin width {:.2} Hz",
        magnitudes.len(),
        total_frames,
        stride,
        bin_hz
    );

    Ok(SpectralFrames { magnitudes, bin_hz })
}

/// Chroma vector of one magnitude spectrum
pub fn frame_chroma(magnitudes: &[f32], bin_hz: f32, config: &KeyConfig) -> [f32; 12] {
    let mut chroma = [0.0f32; 12];
    if magnitudes.is_empty() || bin_hz <= 0.0 {
        return chroma;
    }
    let first = (config.min_frequency / bin_hz).ceil().max(1.0) as usize;
    let last = ((config.max_frequency / bin_hz).floor() as usize).min(magnitudes.len() - 1);

    for k in first..=last {
        let magnitude = magnitudes[k];
        if magnitude <= config.quiet_threshold {
            continue;
        }
        let mut harmonic_sum = 0.0f32;
        for (h, &weight) in config.harmonic_weights.iter().enumerate() {
            let harmonic_bin = k * (h + 1);
            if harmonic_bin < magnitudes.len() && magnitudes[harmonic_bin] > config.quiet_threshold {
                harmonic_sum += weight;
            }
        }
        let boost = 1.0 + config.harmonic_boost * harmonic_sum;
        chroma[pitch_class(k as f32 * bin_hz)] += magnitude * boost;
    }
    chroma
}

/// Median-aggregated, L2-normalized chroma profile over all non-empty frames
///
/// # Errors
///
/// Returns `AnalysisError::NumericalError` when no frame carries energy in
/// the analyzed band (silence, or audio too short for one frame)
pub fn build_chroma_profile(frames: &SpectralFrames, config: &KeyConfig) -> Result<ChromaProfile, AnalysisError> {
    let chromas: Vec<[f32; 12]> = frames
        .magnitudes
        .iter()
        .map(|m| frame_chroma(m, frames.bin_hz, config))
        .filter(|c| c.iter().any(|&v| v > 0.0))
        .collect();

    let mut values = median_profile(&chromas);
    if !l2_normalize(&mut values) {
        return Err(AnalysisError::NumericalError(format!(
            "Degenerate chroma profile ({} of {} frames carried energy)",
            chromas.len(),
            frames.magnitudes.len()
        )));
    }

    Ok(ChromaProfile {
        values,
        frames_used: chromas.len(),
    })
}

/// Extract the chroma profile straight from samples
pub fn extract_chroma_profile(
    samples: &[f32],
    sample_rate: u32,
    config: &KeyConfig,
) -> Result<ChromaProfile, AnalysisError> {
    let frames = compute_spectral_frames(samples, sample_rate, config)?;
    build_chroma_profile(&frames, config)
}
