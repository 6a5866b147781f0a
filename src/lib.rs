//! # Segue DSP
//!
//! Audio feature extraction and mix-compatibility engine for DJ software:
//! tempo, key, energy and cue-point analysis of decoded PCM, plus scoring,
//! transition planning and next-track selection for an Auto-DJ.
//!
//! ## Features
//!
//! - **Tempo**: energy-envelope peak histogram, or spectral onsets with
//!   autocorrelation and dynamic-programming beat tracking
//! - **Key**: harmonic chroma matched against Krumhansl-Kessler profiles,
//!   reported in musical and Camelot notation
//! - **Energy & cues**: RMS loudness level and silence-trimmed mix points
//! - **Caching**: bounded LRU keyed by path or content hash
//! - **Mixing**: six-factor compatibility score, transition instructions and
//!   a session that keeps one transition scheduled ahead
//! - **Calibration**: accuracy scoring against labeled reference tracks
//!
//! ## Quick Start
//!
//! ```no_run
//! use segue_dsp::{analyze_audio, AnalysisConfig};
//!
//! // Decoded mono samples in [-1.0, 1.0]
//! let samples: Vec<f32> = vec![];
//! let sample_rate = 44100;
//!
//! let result = analyze_audio(&samples, sample_rate, &AnalysisConfig::default());
//!
//! println!("BPM: {:.1} (confidence: {:.2})", result.bpm, result.bpm_confidence);
//! println!("Key: {:?} / {:?}", result.key_name(), result.camelot_key);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! PCM → Downmix → Tempo ─┐
//!                → Key ──┼→ AnalysisResult → Cache → Track → Scorer → Planner → Session
//!                → Energy/Cues ┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod error;
pub mod events;
pub mod features;
pub mod io;
pub mod mixing;
pub mod preprocessing;

// Re-export main types
pub use analysis::cache::{AnalysisCache, CacheKey};
pub use analysis::engine::AnalysisEngine;
pub use analysis::metadata::{AnalysisFlag, AnalysisMetadata};
pub use analysis::result::{AnalysisResult, Key, PersistedAnalysis};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use events::{EngineEvent, EventBus};
pub use features::key::camelot::CamelotKey;
pub use io::AudioSample;
pub use mixing::{AutoDjSession, CompatibilityScorer, MixContext, MixInstructions, Track, TrackSelector};

use std::sync::atomic::AtomicBool;

/// Analyze mono samples in one call
///
/// Runs the full pipeline without a cache. Never fails: invalid input
/// (zero sample rate, bad configuration) and silent audio produce the
/// fallback result with `analyzed = false` and the reason in `error`.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
/// * `config` - Analysis configuration parameters
///
/// # Example
///
/// ```
/// use segue_dsp::{analyze_audio, AnalysisConfig};
///
/// let samples = vec![0.0f32; 44100 * 5]; // 5 seconds of silence
/// let result = analyze_audio(&samples, 44100, &AnalysisConfig::default());
/// assert!(!result.analyzed);
/// assert_eq!(result.bpm, 120.0);
/// assert!(result.key.is_none());
/// ```
pub fn analyze_audio(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> AnalysisResult {
    log::debug!("Starting audio analysis: {} samples at {} Hz", samples.len(), sample_rate);

    let duration = if sample_rate > 0 {
        samples.len() as f32 / sample_rate as f32
    } else {
        0.0
    };
    let fallback = |err: AnalysisError| {
        log::warn!("Analysis fell back: {}", err);
        AnalysisResult::fallback(err.to_string(), AnalysisMetadata::for_input(duration, sample_rate, 1))
    };

    let sample = match AudioSample::mono(samples.to_vec(), sample_rate) {
        Ok(sample) => sample,
        Err(err) => return fallback(err),
    };
    let engine = match AnalysisEngine::new(config.clone()) {
        Ok(engine) => engine,
        Err(err) => return fallback(err),
    };

    engine
        .analyze_uncached(&sample, &AtomicBool::new(false))
        .unwrap_or_else(fallback)
}
