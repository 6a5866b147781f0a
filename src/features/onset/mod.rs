//! Onset signals
//!
//! - Energy flux: RMS envelope over a sliding window
//! - Spectral flux: weighted spectral difference, energy delta and phase
//!   deviation over an STFT

pub mod energy_flux;
pub mod spectral_flux;
