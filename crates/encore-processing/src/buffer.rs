/// Planar multichannel float samples.
///
/// Every channel holds exactly `frame_count()` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate_hz: u32,
}

impl AudioBuffer {
    /// Channels of unequal length are truncated to the shortest.
    pub fn new(mut channels: Vec<Vec<f32>>, sample_rate_hz: u32) -> Self {
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        for channel in &mut channels {
            channel.truncate(frames);
        }
        Self {
            channels,
            sample_rate_hz,
        }
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate_hz as f64
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// New buffer with `f(channel_index, frame_index, sample)` applied to every sample.
    pub fn map_samples<F>(&self, mut f: F) -> AudioBuffer
    where
        F: FnMut(usize, usize, f32) -> f32,
    {
        let channels = self
            .channels
            .iter()
            .enumerate()
            .map(|(ch, samples)| {
                samples
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| f(ch, i, s))
                    .collect()
            })
            .collect();
        AudioBuffer {
            channels,
            sample_rate_hz: self.sample_rate_hz,
        }
    }
}
