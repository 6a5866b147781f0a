//! Peak detection shared by the tempo strategies
//!
//! Two flavours:
//! - [`pick_peaks_in_order`]: time-ordered greedy picking used on energy
//!   envelopes and onset functions (first peak wins inside the exclusion zone)
//! - [`find_peaks`]: strongest-first picking used on autocorrelation curves

/// Time-ordered peak picking
///
/// A frame is a peak when it exceeds `threshold`, is strictly greater than
/// its left neighbour and at least as large as its right neighbour (so a
/// plateau reports its first frame). Peaks closer than `min_distance` frames
/// to the previously accepted peak are skipped.
///
/// # Arguments
///
/// * `signal` - Envelope or onset function
/// * `threshold` - Absolute threshold
/// * `min_distance` - Minimum distance between accepted peaks (frames)
///
/// # Returns
///
/// Peak indices in ascending order
///
/// # Example
///
/// ```
/// use segue_dsp::features::period::peak_picking::pick_peaks_in_order;
///
/// let signal = vec![0.0, 1.0, 0.0, 0.9, 0.0, 0.0, 1.0, 1.0, 0.0];
/// assert_eq!(pick_peaks_in_order(&signal, 0.5, 3), vec![1, 6]);
/// ```
pub fn pick_peaks_in_order(signal: &[f32], threshold: f32, min_distance: usize) -> Vec<usize> {
    let mut peaks: Vec<usize> = Vec::new();
    if signal.len() < 3 {
        return peaks;
    }

    for i in 1..signal.len() - 1 {
        let value = signal[i];
        if value <= threshold || value <= signal[i - 1] || value < signal[i + 1] {
            continue;
        }
        if let Some(&last) = peaks.last() {
            if i - last < min_distance {
                continue;
            }
        }
        peaks.push(i);
    }

    log::debug!(
        "Picked {} peaks from {} frames (threshold={:.5}, min_distance={})",
        peaks.len(),
        signal.len(),
        threshold,
        min_distance
    );

    peaks
}

/// Strongest-first peak picking
///
/// Local maxima (strictly above both neighbours) at or above `threshold`;
/// when two peaks are closer than `min_distance`, the higher one is kept.
///
/// # Returns
///
/// `(index, value)` pairs sorted by value, highest first
pub fn find_peaks(signal: &[f32], threshold: f32, min_distance: usize) -> Vec<(usize, f32)> {
    if signal.len() < 3 {
        return Vec::new();
    }

    let mut peaks: Vec<(usize, f32)> = (1..signal.len() - 1)
        .filter(|&i| signal[i] > signal[i - 1] && signal[i] > signal[i + 1] && signal[i] >= threshold)
        .map(|i| (i, signal[i]))
        .collect();

    peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    if min_distance > 1 {
        let mut kept: Vec<(usize, f32)> = Vec::with_capacity(peaks.len());
        for (idx, value) in peaks {
            if kept.iter().all(|(k, _)| idx.abs_diff(*k) >= min_distance) {
                kept.push((idx, value));
            }
        }
        peaks = kept;
    }

    peaks
}
