//! Feature extraction modules
//!
//! - Onset signals (RMS envelope, weighted spectral onset function)
//! - Period estimation (BPM detection, two strategies)
//! - Beat tracking (dynamic programming)
//! - Chroma extraction
//! - Key detection and Camelot mapping
//! - Energy level and cue points

pub mod beat_tracking;
pub mod chroma;
pub mod cue_points;
pub mod energy;
pub mod key;
pub mod onset;
pub mod period;
