//! Chroma aggregation and normalization

const EPSILON: f32 = 1e-10;

/// Median of each pitch class across frames
///
/// Even counts use the mean of the two middle values. Returns zeros for no frames.
pub fn median_profile(frames: &[[f32; 12]]) -> [f32; 12] {
    let mut profile = [0.0f32; 12];
    if frames.is_empty() {
        return profile;
    }
    let mut column = Vec::with_capacity(frames.len());
    for (pc, slot) in profile.iter_mut().enumerate() {
        column.clear();
        column.extend(frames.iter().map(|f| f[pc]));
        column.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = column.len() / 2;
        *slot = if column.len() % 2 == 0 {
            (column[mid - 1] + column[mid]) / 2.0
        } else {
            column[mid]
        };
    }
    profile
}

/// L2-normalize a chroma vector in place
///
/// # Returns
///
/// `false` (and the vector unchanged) when its norm is zero
pub fn l2_normalize(chroma: &mut [f32; 12]) -> bool {
    let norm = chroma.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm < EPSILON {
        return false;
    }
    for x in chroma.iter_mut() {
        *x /= norm;
    }
    true
}
