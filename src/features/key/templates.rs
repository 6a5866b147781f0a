//! Scale-degree key templates
//!
//! Tonic weighted 3, third and fifth 2, remaining diatonic degrees 1,
//! chromatic (out-of-scale) degrees 0. The 24 templates are rotations of
//! the C major and C minor base profiles: `t_k[i] = base[(i − k) mod 12]`.

/// C major: C D E F G A B
pub const MAJOR_BASE: [f32; 12] = [3.0, 0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 2.0, 0.0, 1.0, 0.0, 1.0];

/// C natural minor: C D Eb F G Ab Bb
pub const MINOR_BASE: [f32; 12] = [3.0, 0.0, 1.0, 2.0, 0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 1.0, 0.0];

/// Templates for all 24 keys
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTemplates {
    /// Major templates indexed by tonic (C, C#, ..., B)
    pub major: [[f32; 12]; 12],

    /// Minor templates indexed by tonic
    pub minor: [[f32; 12]; 12],
}

impl KeyTemplates {
    /// Build the 24 rotated templates
    pub fn new() -> Self {
        let mut major = [[0.0f32; 12]; 12];
        let mut minor = [[0.0f32; 12]; 12];
        for tonic in 0..12 {
            major[tonic] = rotate(&MAJOR_BASE, tonic);
            minor[tonic] = rotate(&MINOR_BASE, tonic);
        }
        Self { major, minor }
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new()
    }
}

fn rotate(base: &[f32; 12], tonic: usize) -> [f32; 12] {
    let mut out = [0.0f32; 12];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = base[(i + 12 - tonic) % 12];
    }
    out
}

/// Match score of a chroma profile against one template
///
/// `Σ_in-scale c_i · w_i − penalty · Σ_out-of-scale c_i`
pub fn template_score(chroma: &[f32; 12], template: &[f32; 12], penalty: f32) -> f32 {
    chroma
        .iter()
        .zip(template.iter())
        .map(|(&c, &w)| if w > 0.0 { c * w } else { -penalty * c })
        .sum()
}
