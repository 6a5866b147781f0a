//! Beat tracking
//!
//! Dynamic-programming search over tempo hypotheses, rewarding onset chains
//! whose gaps land near integer multiples of the hypothesised beat period.

pub mod dynamic;

pub use dynamic::{track_beats, BeatTrack};
