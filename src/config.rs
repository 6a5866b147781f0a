//! Configuration parameters for audio analysis

use serde::{Deserialize, Serialize};

/// Half/double-time correction policy
///
/// Estimates below `slow_threshold` are compared against their doubled
/// interpretation and estimates above `fast_threshold` against their halved
/// one. The alternative is adopted when its spread of BPM values stays within
/// `std_dev_tolerance` times the spread of the original values.
///
/// The policy is deliberately aggressive: it can promote legitimately slow
/// material. Disable it, or widen the thresholds, for ballad-heavy libraries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OctavePolicy {
    /// Apply the correction at all (default: true)
    pub enabled: bool,

    /// Estimates below this are candidates for doubling (default: 70.0)
    pub slow_threshold: f32,

    /// Estimates above this are candidates for halving (default: 160.0)
    pub fast_threshold: f32,

    /// Maximum allowed ratio between the alternative's and the original's
    /// standard deviation (default: 1.5)
    pub std_dev_tolerance: f32,
}

impl Default for OctavePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            slow_threshold: 70.0,
            fast_threshold: 160.0,
            std_dev_tolerance: 1.5,
        }
    }
}

/// Which tempo strategy the engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TempoStrategy {
    /// RMS envelope peaks and interval histogram
    #[default]
    EnergyPeaks,
    /// Spectral onsets, autocorrelation and beat tracking
    SpectralOnsets,
}

/// Tempo estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoConfig {
    /// Strategy used by the analysis engine (default: energy peaks)
    #[serde(default)]
    pub strategy: TempoStrategy,

    /// Energy envelope window in seconds (default: 0.1)
    pub window_secs: f32,

    /// Envelope hop as a fraction of the window (default: 0.25)
    pub hop_fraction: f32,

    /// Peak threshold as a multiple of the envelope mean (default: 1.5)
    pub peak_threshold_factor: f32,

    /// Minimum distance between envelope peaks in seconds (default: 0.3)
    pub min_peak_distance_secs: f32,

    /// Minimum BPM to report (default: 60.0)
    pub min_bpm: f32,

    /// Maximum BPM to report (default: 180.0)
    pub max_bpm: f32,

    /// Histogram bucket width in BPM (default: 3.0)
    pub bucket_width: f32,

    /// Half/double-time correction
    pub octave: OctavePolicy,

    /// Spectral onset frame size (default: 2048)
    pub frame_size: usize,

    /// Spectral onset hop size (default: 512)
    pub hop_size: usize,

    /// Lowest tempo hypothesis for the beat tracker (default: 60.0)
    pub tracker_min_bpm: f32,

    /// Highest tempo hypothesis for the beat tracker (default: 200.0)
    pub tracker_max_bpm: f32,

    /// Relative tolerance window of the beat tracker (default: 0.2)
    pub tracker_tolerance: f32,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            strategy: TempoStrategy::default(),
            window_secs: 0.1,
            hop_fraction: 0.25,
            peak_threshold_factor: 1.5,
            min_peak_distance_secs: 0.3,
            min_bpm: 60.0,
            max_bpm: 180.0,
            bucket_width: 3.0,
            octave: OctavePolicy::default(),
            frame_size: 2048,
            hop_size: 512,
            tracker_min_bpm: 60.0,
            tracker_max_bpm: 200.0,
            tracker_tolerance: 0.2,
        }
    }
}

/// Key estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Only the first `max_duration_secs` of audio are analyzed (default: 30.0)
    pub max_duration_secs: f32,

    /// FFT size for chroma frames (default: 8192)
    pub fft_size: usize,

    /// Hop between chroma frames (default: 4096)
    pub hop_size: usize,

    /// Upper bound on analyzed frames; frames are strided to fit (default: 120)
    pub max_frames: usize,

    /// Lowest frequency mapped into chroma (default: 100.0 Hz)
    pub min_frequency: f32,

    /// Highest frequency mapped into chroma (default: 2000.0 Hz)
    pub max_frequency: f32,

    /// Bins with a magnitude at or below this are ignored (default: 0.1)
    pub quiet_threshold: f32,

    /// Weights of the fundamental and its 2nd/3rd harmonics (default: [1.0, 0.6, 0.4])
    pub harmonic_weights: [f32; 3],

    /// Boost per matching harmonic weight (default: 0.2)
    pub harmonic_boost: f32,

    /// Penalty factor for out-of-scale energy (default: 0.5)
    pub out_of_scale_penalty: f32,

    /// Estimate the tuning offset (informational, default: true)
    pub estimate_tuning: bool,

    /// Reference band for the tuning estimate (default: 200–900 Hz)
    pub tuning_band: (f32, f32),

    /// Frames inspected by the tuning estimate (default: 10)
    pub tuning_frames: usize,

    /// Number of ranked key candidates to keep (default: 5)
    pub max_candidates: usize,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 30.0,
            fft_size: 8192,
            hop_size: 4096,
            max_frames: 120,
            min_frequency: 100.0,
            max_frequency: 2000.0,
            quiet_threshold: 0.1,
            harmonic_weights: [1.0, 0.6, 0.4],
            harmonic_boost: 0.2,
            out_of_scale_penalty: 0.5,
            estimate_tuning: true,
            tuning_band: (200.0, 900.0),
            tuning_frames: 10,
            max_candidates: 5,
        }
    }
}

/// Cue point detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueConfig {
    /// Silence threshold in dBFS (default: -40.0)
    pub threshold_db: f32,

    /// Minimum silence before a cue-in is placed (default: 0.3 s)
    pub min_silence_secs: f32,

    /// Length of the head/tail region scanned (default: 10.0 s)
    pub scan_secs: f32,

    /// RMS frame size in samples (default: 1024)
    pub frame_size: usize,

    /// Pre-roll subtracted from the cue-in (default: 0.1 s)
    pub cue_in_margin_secs: f32,

    /// Tail added after the cue-out (default: 1.0 s)
    pub cue_out_margin_secs: f32,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            min_silence_secs: 0.3,
            scan_secs: 10.0,
            frame_size: 1024,
            cue_in_margin_secs: 0.1,
            cue_out_margin_secs: 1.0,
        }
    }
}

/// Analysis configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Tempo estimation
    pub tempo: TempoConfig,

    /// Key estimation
    pub key: KeyConfig,

    /// Cue point detection
    pub cue: CueConfig,

    /// RMS window for the energy level (default: 1024)
    pub energy_window: usize,

    /// Window used for tempo drift (default: 30.0 s); drift is only
    /// measured on tracks longer than twice this
    pub drift_window_secs: f32,

    /// Analysis cache capacity in entries (default: 512)
    pub cache_capacity: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tempo: TempoConfig::default(),
            key: KeyConfig::default(),
            cue: CueConfig::default(),
            energy_window: 1024,
            drift_window_secs: 30.0,
            cache_capacity: 512,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, crate::error::AnalysisError> {
        serde_json::from_str(json)
            .map_err(|e| crate::error::AnalysisError::InvalidInput(format!("Bad config: {}", e)))
    }

    /// Serialize the configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, crate::error::AnalysisError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::AnalysisError::ProcessingError(format!("Config encode: {}", e)))
    }

    /// Check parameter sanity
    pub fn validate(&self) -> Result<(), crate::error::AnalysisError> {
        use crate::error::AnalysisError;
        let t = &self.tempo;
        if t.window_secs <= 0.0 || t.hop_fraction <= 0.0 || t.hop_fraction > 1.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Bad envelope window {} s / hop fraction {}",
                t.window_secs, t.hop_fraction
            )));
        }
        if t.min_bpm <= 0.0 || t.min_bpm >= t.max_bpm {
            return Err(AnalysisError::InvalidInput(format!(
                "Bad BPM range [{}, {}]",
                t.min_bpm, t.max_bpm
            )));
        }
        if t.hop_size == 0 || t.frame_size < t.hop_size {
            return Err(AnalysisError::InvalidInput(format!(
                "Bad spectral frame {} / hop {}",
                t.frame_size, t.hop_size
            )));
        }
        let k = &self.key;
        if k.fft_size == 0 || k.hop_size == 0 || k.min_frequency >= k.max_frequency {
            return Err(AnalysisError::InvalidInput("Bad chroma parameters".to_string()));
        }
        if self.energy_window == 0 || self.cue.frame_size == 0 {
            return Err(AnalysisError::InvalidInput("Window sizes must be non-zero".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(AnalysisError::InvalidInput("Cache capacity must be non-zero".to_string()));
        }
        Ok(())
    }
}
