/*!
    Stream description types.
*/

use crate::{ChannelLayout, CodecId, Rational, SampleFormat};

/**
    Description of an audio source, used as the template for the exported
    audio stream.

    The recording mirrors the first segment's codec, rate and layout so
    that decoded segment frames can be re-encoded without conversion.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioTemplate {
    /// Codec of the source stream.
    pub codec: CodecId,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channels: ChannelLayout,
    /// Sample format of decoded frames.
    pub format: SampleFormat,
}

/**
    Operating parameters of an opened output audio encoder.

    `frame_size` is the codec's native frame length in samples per channel;
    silence synthesis chunks zeroed buffers at this granularity.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioStreamSpec {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channels: ChannelLayout,
    /// Sample format the encoder consumes.
    pub format: SampleFormat,
    /// Native codec frame length in samples per channel (e.g. 1024 for AAC).
    pub frame_size: usize,
}

impl AudioStreamSpec {
    /**
        The output audio stream's time base, one tick per sample.
    */
    pub fn time_base(&self) -> Rational {
        Rational::new(1, self.sample_rate as i32)
    }
}
