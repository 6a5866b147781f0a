//! Audio preprocessing
//!
//! Channel mixing (multi-channel to mono) ahead of feature extraction.

pub mod channel_mixer;
