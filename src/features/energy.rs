//! Track energy level
//!
//! Mean RMS over non-overlapping windows, expressed in dBFS and mapped
//! linearly from [−40 dB, 0 dB] onto [0, 1].

/// Level mapped to 0.0
pub const FLOOR_DB: f32 = -40.0;

/// Compute the 0–1 energy level of mono samples
///
/// # Arguments
///
/// * `samples` - Mono samples in [-1.0, 1.0]
/// * `window` - RMS window in samples (typically 1024); a trailing partial
///   window is included
///
/// # Returns
///
/// Energy in [0, 1]; 0.0 for empty or silent input
pub fn compute_energy_level(samples: &[f32], window: usize) -> f32 {
    if samples.is_empty() || window == 0 {
        return 0.0;
    }

    let (sum, count) = samples.chunks(window).fold((0.0f32, 0usize), |(sum, count), chunk| {
        let mean_sq = chunk.iter().map(|x| x * x).sum::<f32>() / chunk.len() as f32;
        (sum + mean_sq.sqrt(), count + 1)
    });
    let mean_rms = sum / count as f32;
    if mean_rms <= 0.0 {
        return 0.0;
    }

    let db = 20.0 * mean_rms.log10();
    let level = ((db - FLOOR_DB) / -FLOOR_DB).clamp(0.0, 1.0);
    log::debug!("Energy: mean RMS {:.4} ({:.1} dBFS) -> {:.3}", mean_rms, db, level);
    level
}

/// Map an energy rating to 0–1
///
/// Values above 1.0 are read as a 1–10 rating; values in [0, 1] pass through.
/// A rating of exactly 1.0 is therefore ambiguous and reads as full energy,
/// not as the bottom of the 1–10 scale. Store 1–10 ratings of 1 as 0.0.
pub fn normalize_energy_rating(value: f32) -> f32 {
    if value > 1.0 {
        ((value - 1.0) / 9.0).clamp(0.0, 1.0)
    } else {
        value.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_zero() {
        assert_eq!(compute_energy_level(&[0.0; 4096], 1024), 0.0);
        assert_eq!(compute_energy_level(&[], 1024), 0.0);
    }

    #[test]
    fn test_full_scale_square_is_one() {
        let samples: Vec<f32> = (0..4096).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!((compute_energy_level(&samples, 1024) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_minus_twenty_db_is_half() {
        let samples = vec![0.1f32; 4096];
        assert!((compute_energy_level(&samples, 1024) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_louder_is_higher() {
        let quiet = vec![0.05f32; 8192];
        let loud = vec![0.4f32; 8192];
        assert!(compute_energy_level(&loud, 1024) > compute_energy_level(&quiet, 1024));
    }

    #[test]
    fn test_rating_normalization() {
        assert_eq!(normalize_energy_rating(0.7), 0.7);
        assert_eq!(normalize_energy_rating(10.0), 1.0);
        assert!((normalize_energy_rating(5.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rating_scale_boundary() {
        // 1.0 is read on the 0–1 scale
        assert_eq!(normalize_energy_rating(1.0), 1.0);
        assert!((normalize_energy_rating(1.9) - 0.1).abs() < 1e-6);
        assert_eq!(normalize_energy_rating(-2.0), 0.0);
    }
}
