//! Audio input types
//!
//! Decoding is left to the host; the engine only consumes decoded PCM.

pub mod sample_buffer;

pub use sample_buffer::AudioSample;
