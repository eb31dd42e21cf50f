/*!
    Raw frame types fed into the recording pipeline.
*/

use crate::{AudioStreamSpec, ChannelLayout, PixelFormat, SampleFormat};

/**
    Pixel payload of a captured video frame.

    Capture backends deliver one of a small closed set of layouts; which
    one decides how the frame is encoded downstream. `Jpeg` carries an
    already-compressed payload that is muxed as-is.
*/
#[derive(Clone, Debug)]
pub enum PixelData {
    /// Planar YUV 4:2:2: full-resolution luma plane, half-width chroma planes.
    Yuv422 { y: Vec<u8>, u: Vec<u8>, v: Vec<u8> },
    /// Packed BGR, 3 bytes per pixel.
    Bgr24(Vec<u8>),
    /// A complete JPEG image as produced by the capture hardware.
    Jpeg(Vec<u8>),
}

impl PixelData {
    /**
        The pixel format this payload is laid out in.
    */
    pub const fn format(&self) -> PixelFormat {
        match self {
            Self::Yuv422 { .. } => PixelFormat::Yuv422p,
            Self::Bgr24(_) => PixelFormat::Bgr24,
            Self::Jpeg(_) => PixelFormat::Yuvj422p,
        }
    }
}

/**
    A captured video frame.

    Frames arrive stamped with the wall-clock time of capture and a running
    sequence index. They are read-only to the pipeline; encoding copies the
    pixel data into encoder-owned buffers.
*/
#[derive(Clone, Debug)]
pub struct VideoFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel payload.
    pub pixels: PixelData,
    /// Wall-clock capture time in seconds.
    pub timestamp: f64,
    /// Running capture index, used only for diagnostics.
    pub index: u64,
}

impl VideoFrame {
    /**
        Create a new video frame.
    */
    pub fn new(width: u32, height: u32, pixels: PixelData, timestamp: f64, index: u64) -> Self {
        Self {
            width,
            height,
            pixels,
            timestamp,
            index,
        }
    }
}

/**
    A decoded audio frame.

    Contains raw sample data in the format specified by `format`.
    Samples are interleaved for multi-channel audio:
    for stereo F32 the layout is `[L0, R0, L1, R1, ...]`.
*/
#[derive(Clone, Debug)]
pub struct AudioFrame {
    /// Raw sample data as bytes, interpreted per `format` and `channels`.
    pub data: Vec<u8>,
    /// Number of samples per channel.
    pub samples: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channels: ChannelLayout,
    /// Sample format.
    pub format: SampleFormat,
}

impl AudioFrame {
    /**
        Create a new audio frame.
    */
    pub fn new(
        data: Vec<u8>,
        samples: usize,
        sample_rate: u32,
        channels: ChannelLayout,
        format: SampleFormat,
    ) -> Self {
        Self {
            data,
            samples,
            sample_rate,
            channels,
            format,
        }
    }

    /**
        Create a zero-amplitude frame of `samples` samples matching an
        output stream's sample format and layout.
    */
    pub fn silence(samples: usize, spec: &AudioStreamSpec) -> Self {
        let len = samples * spec.channels.channels() as usize * spec.format.bytes_per_sample();
        Self {
            data: vec![0u8; len],
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            format: spec.format,
        }
    }

    /**
        Returns the duration of this frame in seconds.
    */
    pub fn duration(&self) -> f64 {
        self.samples as f64 / self.sample_rate as f64
    }

    /**
        Returns the total number of samples (samples per channel × channels).
    */
    pub fn total_samples(&self) -> usize {
        self.samples * self.channels.channels() as usize
    }

    /**
        Returns the expected data length in bytes.
    */
    pub fn expected_data_len(&self) -> usize {
        self.total_samples() * self.format.bytes_per_sample()
    }
}

// Frames cross thread boundaries when the encoder runs its own pool.
static_assertions::assert_impl_all!(VideoFrame: Send, Sync);
static_assertions::assert_impl_all!(AudioFrame: Send, Sync);
