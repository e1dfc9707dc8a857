use std::time::Duration;

use rodio::Source;

/// An endless square-wave source, the classic buzzer timbre.
///
/// Mono at 48 kHz. The host appends one of these to a paused sink and
/// toggles playback with the machine's sound timer.
#[derive(Debug, Clone)]
pub struct Tone {
    frequency: f32,
    current_sample: usize,
}

impl Tone {
    /// Peak amplitude, kept well below 1.0 since a naked square wave is
    /// harsh.
    const AMPLITUDE: f32 = 0.25;

    pub fn new(frequency: f32) -> Self {
        Self {
            frequency,
            current_sample: 0,
        }
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let time = self.current_sample as f32 / self.sample_rate() as f32;
        self.current_sample = self.current_sample.wrapping_add(1);

        let phase = (time * self.frequency).fract();
        Some(if phase < 0.5 {
            Self::AMPLITUDE
        } else {
            -Self::AMPLITUDE
        })
    }
}

impl Source for Tone {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
