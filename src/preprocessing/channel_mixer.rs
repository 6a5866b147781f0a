//! Channel mixing utilities (multi-channel to mono conversion)

/// Channel mixing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMixMode {
    /// Average of all channels
    Average,
    /// Keep the sample with the largest magnitude per frame
    Dominant,
}

/// Downmix interleaved samples to mono
///
/// # Arguments
///
/// * `interleaved` - Interleaved samples; trailing partial frames are dropped
/// * `channels` - Number of channels (1 returns a copy)
/// * `mode` - Mixing mode
///
/// # Returns
///
/// One sample per frame
pub fn downmix(interleaved: &[f32], channels: usize, mode: ChannelMixMode) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    log::debug!("Downmixing {} channels using {:?}", channels, mode);

    interleaved
        .chunks_exact(channels)
        .map(|frame| match mode {
            ChannelMixMode::Average => frame.iter().sum::<f32>() / channels as f32,
            ChannelMixMode::Dominant => frame
                .iter()
                .copied()
                .fold(0.0f32, |acc, s| if s.abs() > acc.abs() { s } else { acc }),
        })
        .collect()
}
