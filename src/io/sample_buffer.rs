//! Decoded PCM buffers handed to the engine

use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::{downmix, ChannelMixMode};
use sha2::{Digest, Sha256};
use std::borrow::Cow;

/// Decoded audio: interleaved `f32` PCM, channel count and sample rate
///
/// Immutable once built. Multi-channel audio is downmixed on demand by
/// [`AudioSample::mono`].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioSample {
    /// Wrap mono samples
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::interleaved(samples, 1, sample_rate)
    }

    /// Wrap interleaved multi-channel samples
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero sample rate, zero
    /// channels, or a buffer whose length is not a multiple of `channels`.
    pub fn interleaved(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
        }
        if channels == 0 {
            return Err(AnalysisError::InvalidInput("Channel count must be non-zero".to_string()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Wrap 64-bit mono samples, narrowing to `f32`
    pub fn mono_f64(samples: &[f64], sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::mono(samples.iter().map(|&s| s as f32).collect(), sample_rate)
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// True when the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw interleaved samples
    pub fn raw(&self) -> &[f32] {
        &self.samples
    }

    /// Mono view of the audio, averaging channels when needed
    pub fn mono_samples(&self) -> Cow<'_, [f32]> {
        if self.channels == 1 {
            Cow::Borrowed(&self.samples)
        } else {
            Cow::Owned(downmix(&self.samples, self.channels as usize, ChannelMixMode::Average))
        }
    }

    /// SHA-256 over the sample rate, channel count and PCM bytes, hex encoded
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sample_rate.to_le_bytes());
        hasher.update(self.channels.to_le_bytes());
        for sample in &self.samples {
            hasher.update(sample.to_le_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}
