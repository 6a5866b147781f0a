//! Analysis metadata structures

use serde::{Deserialize, Serialize};

/// Analysis flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisFlag {
    /// No periodicity found; BPM is the 120 fallback
    TempoFallback,
    /// Low BPM confidence
    AmbiguousTempo,
    /// Degenerate chroma profile; no key
    KeyFallback,
    /// Low key confidence (atonal/ambiguous)
    WeakTonality,
    /// Opening and closing tempo differ noticeably
    TempoDrift,
}

/// Analysis metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Audio duration in seconds
    pub duration_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of input channels
    pub channels: u16,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// Tempo strategy name
    pub tempo_method: String,

    /// Analysis flags
    pub flags: Vec<AnalysisFlag>,

    /// Confidence warnings (low confidence, ambiguous results, etc.)
    pub confidence_warnings: Vec<String>,
}

impl AnalysisMetadata {
    /// Metadata for a buffer before any stage has run
    pub fn for_input(duration_seconds: f32, sample_rate: u32, channels: u16) -> Self {
        Self {
            duration_seconds,
            sample_rate,
            channels,
            ..Self::default()
        }
    }

    /// Add a flag once
    pub fn flag(&mut self, flag: AnalysisFlag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    /// True if the flag is set
    pub fn has_flag(&self, flag: AnalysisFlag) -> bool {
        self.flags.contains(&flag)
    }
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            duration_seconds: 0.0,
            sample_rate: 0,
            channels: 1,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            tempo_method: String::new(),
            flags: vec![],
            confidence_warnings: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_deduplicates() {
        let mut meta = AnalysisMetadata::default();
        meta.flag(AnalysisFlag::WeakTonality);
        meta.flag(AnalysisFlag::WeakTonality);
        assert_eq!(meta.flags, vec![AnalysisFlag::WeakTonality]);
        assert!(meta.has_flag(AnalysisFlag::WeakTonality));
        assert!(!meta.has_flag(AnalysisFlag::TempoDrift));
    }
}
