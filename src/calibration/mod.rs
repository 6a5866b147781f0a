//! Calibration against labeled reference tracks
//!
//! Scores analyzer output against known tempo/key labels, summarizes the
//! results per category and searches a few tuning parameters (a global
//! tempo multiplier and the octave policy tolerance).

pub mod harness;
pub mod reference;

pub use harness::{
    best_bpm_multiplier, bpm_accuracy, key_accuracy, tune_octave_tolerance, CalibrationHarness, CalibrationReport,
    CalibrationResult, TempoObservation,
};
pub use reference::{Mode, ReferenceSet, ReferenceTrack};
